use crate::core::{Event, EventId, ProcessId, Tick};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Summary of a process's recent state, sent to `F` random peers per round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gossip {
  pub sender: ProcessId,
  pub events: Vec<Event>,
  pub subs: HashSet<ProcessId>,
  pub unsubs: HashSet<ProcessId>,
  pub event_ids: HashSet<EventId>,
}

/// Ask a peer to retransmit an event it advertised.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrieveRequest {
  pub sender: ProcessId,
  pub event_id: EventId,
}

/// Retransmission of an event from the live buffer or the archive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrieveReply {
  pub sender: ProcessId,
  pub event: Event,
}

/// Everything one process can send another.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Message {
  Gossip(Gossip),
  RetrieveRequest(RetrieveRequest),
  RetrieveReply(RetrieveReply),
}

/// An in-flight message. `due` is the tick at which the receiver may
/// process it; until then it sits in the receiver's mailbox.
#[derive(Clone, Debug)]
pub struct Envelope {
  pub msg: Message,
  pub due: Tick,
}
