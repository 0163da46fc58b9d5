use crate::core::{EventId, ProcessId, Tick};

/// Where the next retransmission request for a missing event goes. The
/// stages escalate from the peer that advertised the event, to a random
/// peer, to the originator, after which the process gives up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetrieveStage {
  Sender,
  Random,
  Originator,
}

/// An event id advertised by a peer but not delivered here yet. Held until
/// `k_recovery` ticks pass, in case the event arrives by gossip anyway.
#[derive(Clone, Copy, Debug)]
pub struct MissingEvent {
  pub event_id: EventId,
  pub discovered: Tick,
  pub observed_from: ProcessId,
}

/// An outstanding retransmission request, advanced through
/// [`RetrieveStage`]s on timeout.
#[derive(Clone, Copy, Debug)]
pub struct ActiveRetrieveRequest {
  pub event_id: EventId,
  pub sent: Tick,
  pub stage: RetrieveStage,
}
