use crate::core::{Event, MailboxRef, ProcessId, Tick};
use crate::gossip::Envelope;
use rand::RngCore;

/// The environment a process runs in: a clock, a source of randomness, a
/// way to reach peers, and the application delivery upcall. The simulation
/// host in [`crate::testkit`] is one implementation; a wall-clock scheduler
/// over a real transport is another.
pub trait Host {
  /// Current tick. Monotonic, non-negative.
  fn now(&self) -> Tick;

  /// The RNG behind every randomized policy. Owning it here keeps a
  /// simulation reproducible from a seed.
  fn rng(&mut self) -> &mut dyn RngCore;

  /// Looks up a peer's handle. `None` means the peer is unreachable or
  /// gone; the caller drops the message silently.
  fn resolve(&mut self, pid: ProcessId) -> Option<ProcessHandle>;

  /// Application upcall, invoked at most once per event id per process.
  fn deliver(&mut self, pid: ProcessId, event: &Event);
}

/// A resolvable handle to a process's inbound queue. Cloned freely and
/// safe to use from any thread; this is the only cross-process entry point.
#[derive(Clone)]
pub struct ProcessHandle {
  inbox: MailboxRef<Envelope>,
}
impl ProcessHandle {
  /// Wraps the sending side of a process inbox.
  pub fn new(inbox: MailboxRef<Envelope>) -> ProcessHandle {
    ProcessHandle { inbox: inbox }
  }

  /// Appends an in-flight message. Returns false if the process is gone.
  pub fn receive(&self, env: Envelope) -> bool {
    self.inbox.send(env)
  }
}
