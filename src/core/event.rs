use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discrete time unit delivered by the host. Monotonic, starts at 0.
pub type Tick = u64;

/// Unique identifier of a process in the deployment.
pub type ProcessId = u64;

/// Globally unique identifier of a broadcast event.
///
/// Equality and hashing cover both the unique id and the originating
/// process, so two origins can never collide even if their ids do.
#[derive(
  Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq,
)]
pub struct EventId {
  pub uid: Uuid,
  pub origin: ProcessId,
}
impl EventId {
  /// Pairs a unique id with the process that broadcast it.
  pub fn new(uid: Uuid, origin: ProcessId) -> EventId {
    EventId {
      uid: uid,
      origin: origin,
    }
  }
}

/// A broadcast event notification.
///
/// The age counts gossip hops since the origin broadcast it; every process
/// increments the age of buffered events once per round, and a copy seen
/// with a larger age overwrites the smaller one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
  pub id: EventId,
  pub age: u64,
}
impl Event {
  /// A fresh event, zero hops traveled.
  pub fn new(id: EventId) -> Event {
    Event { id: id, age: 0 }
  }
}
