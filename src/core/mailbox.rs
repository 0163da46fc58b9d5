use crossbeam::channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;

/// A multi-producer, single-consumer inbound queue.
///
/// Senders hold a [`MailboxRef`] and append concurrently; the owner drains
/// from `step`. Messages that are not yet eligible for processing stay in
/// the pending ring in arrival order.
pub struct Mailbox<M> {
  tx: Sender<M>,
  rx: Receiver<M>,
  pending: VecDeque<M>,
}
impl<M> Mailbox<M> {
  /// An empty queue with no senders yet.
  pub fn new() -> Mailbox<M> {
    let (tx, rx) = unbounded::<M>();
    Mailbox {
      tx: tx,
      rx: rx,
      pending: VecDeque::new(),
    }
  }

  /// A clonable handle for cross-thread appends.
  pub fn sender(&self) -> MailboxRef<M> {
    MailboxRef {
      tx: self.tx.clone(),
    }
  }

  /// Pulls every message matching `eligible` out of the queue, in FIFO
  /// order. Non-matching messages keep their relative order.
  pub fn drain_where<F>(&mut self, mut eligible: F) -> Vec<M>
  where
    F: FnMut(&M) -> bool,
  {
    while let Ok(m) = self.rx.try_recv() {
      self.pending.push_back(m);
    }
    let mut due = Vec::new();
    let mut kept = VecDeque::new();
    for m in self.pending.drain(..) {
      if eligible(&m) {
        due.push(m);
      } else {
        kept.push_back(m);
      }
    }
    self.pending = kept;
    due
  }

  /// Discards everything queued so far, including not-yet-drained sends.
  pub fn clear(&mut self) {
    while self.rx.try_recv().is_ok() {}
    self.pending.clear();
  }

  /// Everything queued, drained into pending or not.
  pub fn len(&self) -> usize {
    self.pending.len() + self.rx.len()
  }
}

/// Cheap clonable sending side of a [`Mailbox`].
pub struct MailboxRef<M> {
  tx: Sender<M>,
}
impl<M> MailboxRef<M> {
  /// Appends a message. Returns false if the owning mailbox is gone.
  pub fn send(&self, msg: M) -> bool {
    self.tx.send(msg).is_ok()
  }
}
impl<M> Clone for MailboxRef<M> {
  fn clone(&self) -> Self {
    MailboxRef {
      tx: self.tx.clone(),
    }
  }
}
