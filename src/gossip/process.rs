use crate::core::{
  Event, EventId, LogLevel, Mailbox, ProcessId, Tick,
};
use crate::gossip::{
  ActiveRetrieveRequest, DeliveredLog, Envelope, EventStore, FrequencyBuffer,
  Gossip, Host, Message, MissingEvent, ProcessHandle, ProtocolConfig,
  RetrieveReply, RetrieveRequest, RetrieveStage,
};
use crate::{debug, info, trace};
use itertools::Itertools;
use rand::seq::IteratorRandom;
use rand::{Rng, RngCore};
use std::cmp::min;
use std::collections::HashMap;
use RetrieveStage::*;

const LOG_LEVEL: LogLevel = LogLevel::Warn;

/// One participant of the broadcast protocol.
///
/// A process owns its state exclusively; the host drives it by calling
/// [`Process::step`] once per tick, and peers reach it only through the
/// thread-safe [`ProcessHandle`] returned by [`Process::handle`]. Within a
/// tick it drains due messages, sweeps the recovery state machine, and
/// emits one gossip round.
pub struct Process {
  pid: ProcessId,
  config: ProtocolConfig,
  inbox: Mailbox<Envelope>,
  view: FrequencyBuffer,
  subs: FrequencyBuffer,
  unsubs: HashMap<ProcessId, Tick>,
  events: EventStore,
  delivered: DeliveredLog,
  retrieve: Vec<MissingEvent>,
  active: Vec<ActiveRetrieveRequest>,
  is_unsubscribed: bool,
  unsubscription_requested: bool,
}

impl Process {
  /// Creates a process seeded with an initial view. Panics on invalid
  /// configuration or a view containing the process itself.
  pub fn new(
    pid: ProcessId,
    view: HashMap<ProcessId, u64>,
    config: ProtocolConfig,
  ) -> Process {
    config.validate();
    assert!(
      !view.contains_key(&pid),
      "p{} must not appear in its own view",
      pid
    );
    Process {
      pid: pid,
      config: config,
      inbox: Mailbox::new(),
      view: FrequencyBuffer::from_entries(view),
      subs: FrequencyBuffer::new(),
      unsubs: HashMap::new(),
      events: EventStore::new(),
      delivered: DeliveredLog::new(),
      retrieve: Vec::new(),
      active: Vec::new(),
      is_unsubscribed: false,
      unsubscription_requested: false,
    }
  }

  /// This process's identifier.
  pub fn pid(&self) -> ProcessId {
    self.pid
  }

  /// The handle peers and hosts use to queue messages here.
  pub fn handle(&self) -> ProcessHandle {
    ProcessHandle::new(self.inbox.sender())
  }

  /// Runs one tick: drain due messages, sweep recovery, gossip. A no-op
  /// while unsubscribed.
  pub fn step(&mut self, host: &mut dyn Host) {
    if self.is_unsubscribed {
      return;
    }
    let now = host.now();
    for env in self.inbox.drain_where(|e| e.due <= now) {
      match env.msg {
        Message::Gossip(gossip) => self.gossip_handler(host, gossip),
        Message::RetrieveRequest(req) => {
          self.retrieve_request_handler(host, req)
        }
        Message::RetrieveReply(rep) => self.retrieve_reply_handler(host, rep),
      }
    }
    self.retrieve_missing(host);
    self.gossip_round(host);
  }

  /// Broadcasts a fresh event. The event enters this round's gossip and
  /// the delivered-id log; the local [`Host::deliver`] upcall is not
  /// invoked for it.
  pub fn broadcast(&mut self, host: &mut dyn Host) -> EventId {
    assert!(
      !self.is_unsubscribed,
      "p{} cannot broadcast while unsubscribed",
      self.pid
    );
    let id =
      EventId::new(uuid::Uuid::from_u128(host.rng().gen()), self.pid);
    self.events.insert_live(Event::new(id));
    self.delivered.record(id);
    self.delivered.trim(self.config.event_ids_max);
    id
  }

  /// Rejoins through an entry point after an unsubscription.
  pub fn subscribe(&mut self, target: ProcessId) {
    assert!(
      self.is_unsubscribed,
      "p{} is already subscribed",
      self.pid
    );
    self.inbox.clear();
    self.view.insert(target, 0);
    self.is_unsubscribed = false;
  }

  /// Latches departure; the next gossip round advertises it and clears
  /// every buffer.
  pub fn unsubscribe(&mut self) {
    if !self.is_unsubscribed {
      self.unsubscription_requested = true;
    }
  }

  fn gossip_handler(&mut self, host: &mut dyn Host, gossip: Gossip) {
    let now = host.now();
    // departures first: a peer that both unsubscribes and appears as a
    // subscription in the same message must stay out
    for unsub in gossip.unsubs.iter() {
      self.view.remove(unsub);
      self.subs.remove(unsub);
      self.unsubs.entry(*unsub).or_insert(now);
    }
    self.trim_unsubs(now, host.rng());

    for sub in gossip.subs.iter() {
      if *sub != self.pid && !self.unsubs.contains_key(sub) {
        self.view.bump(*sub);
        self.subs.bump(*sub);
      }
    }
    self.trim_view(host.rng());
    self.trim_subs(host.rng());

    for event in gossip.events {
      self.process_event(host, event);
    }
    self.events.trim_live(now, host.rng(), &self.config);

    for id in gossip.event_ids.iter() {
      if !self.known(id)
        && !self.retrieve.iter().any(|me| me.event_id == *id)
      {
        trace!(
          LOG_LEVEL,
          self.pid,
          format!("missing {:?} advertised by p{}", id, gossip.sender)
        );
        self.retrieve.push(MissingEvent {
          event_id: *id,
          discovered: now,
          observed_from: gossip.sender,
        });
      }
    }
    self.delivered.trim(self.config.event_ids_max);
  }

  fn retrieve_request_handler(
    &mut self,
    host: &mut dyn Host,
    req: RetrieveRequest,
  ) {
    if let Some(event) = self.events.lookup(&req.event_id) {
      let reply = Message::RetrieveReply(RetrieveReply {
        sender: self.pid,
        event: event,
      });
      self.post(host, req.sender, reply);
    }
  }

  fn retrieve_reply_handler(
    &mut self,
    host: &mut dyn Host,
    rep: RetrieveReply,
  ) {
    if !self.active.iter().any(|ar| ar.event_id == rep.event.id) {
      return;
    }
    self.active.retain(|ar| ar.event_id != rep.event.id);
    let now = host.now();
    self.process_event(host, rep.event);
    self.events.trim_live(now, host.rng(), &self.config);
  }

  /// First reception of an event delivers it; later copies only raise the
  /// buffered age to the furthest-traveled value.
  fn process_event(&mut self, host: &mut dyn Host, event: Event) {
    if !self.known(&event.id) {
      host.deliver(self.pid, &event);
      debug!(LOG_LEVEL, self.pid, format!("delivered {:?}", event.id));
      self.events.insert_live(event.clone());
      self.delivered.record(event.id);
    }
    self.events.bump_age(&event);
  }

  /// An id is known when it was delivered recently, or its event is still
  /// held live or archived. The delivered log alone is not enough: it is
  /// capped tighter than the archive, so an id can fall off it while the
  /// event itself is still retrievable here.
  fn known(&self, id: &EventId) -> bool {
    self.delivered.contains(id)
      || self.events.is_live(id)
      || self.events.is_archived(id)
  }

  fn trim_unsubs(&mut self, now: Tick, rng: &mut dyn RngCore) {
    if self.unsubs.len() > self.config.unsubs_max {
      let expired = self
        .unsubs
        .iter()
        .filter(|(_, since)| **since + self.config.unsubs_validity <= now)
        .map(|(pid, _)| *pid)
        .collect_vec();
      for pid in expired {
        self.unsubs.remove(&pid);
      }
    }
    while self.unsubs.len() > self.config.unsubs_max {
      let victim = self.unsubs.keys().copied().choose(rng).unwrap();
      self.unsubs.remove(&victim);
    }
  }

  /// Overflowing view entries are demoted into `subs` so the membership
  /// keeps circulating even after a local eviction.
  fn trim_view(&mut self, rng: &mut dyn RngCore) {
    while self.view.len() > self.config.view_max {
      let target = self
        .view
        .select(
          rng,
          self.config.frequency_based_membership_purging,
          self.config.k,
        )
        .unwrap();
      let freq = self.view.remove(&target).unwrap();
      self.subs.insert(target, freq);
    }
  }

  fn trim_subs(&mut self, rng: &mut dyn RngCore) {
    while self.subs.len() > self.config.subs_max {
      let target = self
        .subs
        .select(
          rng,
          self.config.frequency_based_membership_purging,
          self.config.k,
        )
        .unwrap();
      self.subs.remove(&target);
    }
  }

  /// Promotes missing events that stayed unseen for `k_recovery` ticks
  /// into retransmission requests aimed at the advertising peer.
  fn retrieve_missing(&mut self, host: &mut dyn Host) {
    self.update_active_requests(host);
    let now = host.now();
    for me in std::mem::take(&mut self.retrieve) {
      if now - me.discovered <= self.config.k_recovery {
        self.retrieve.push(me);
        continue;
      }
      if self.known(&me.event_id) {
        continue;
      }
      if self.active.iter().any(|ar| ar.event_id == me.event_id) {
        continue;
      }
      debug!(
        LOG_LEVEL,
        self.pid,
        format!("requesting {:?} from p{}", me.event_id, me.observed_from)
      );
      self.post(host, me.observed_from, self.request(me.event_id));
      self.active.push(ActiveRetrieveRequest {
        event_id: me.event_id,
        sent: now,
        stage: Sender,
      });
    }
  }

  /// Advances timed-out requests: sender, then a random peer, then the
  /// originator, then give up.
  fn update_active_requests(&mut self, host: &mut dyn Host) {
    let now = host.now();
    for mut ar in std::mem::take(&mut self.active) {
      if now - ar.sent < self.config.recovery_timeout {
        self.active.push(ar);
        continue;
      }
      match ar.stage {
        Sender => {
          match self.view.choose(host.rng()) {
            Some(peer) => {
              self.post(host, peer, self.request(ar.event_id));
              ar.stage = Random;
            }
            None => {
              // nobody in the view to try; escalate straight to the origin
              self.post(host, ar.event_id.origin, self.request(ar.event_id));
              ar.stage = Originator;
            }
          }
          ar.sent = now;
          self.active.push(ar);
        }
        Random => {
          self.post(host, ar.event_id.origin, self.request(ar.event_id));
          ar.sent = now;
          ar.stage = Originator;
          self.active.push(ar);
        }
        Originator => {
          debug!(
            LOG_LEVEL,
            self.pid,
            format!("giving up retrieval of {:?}", ar.event_id)
          );
        }
      }
    }
  }

  fn request(&self, event_id: EventId) -> Message {
    Message::RetrieveRequest(RetrieveRequest {
      sender: self.pid,
      event_id: event_id,
    })
  }

  /// One outbound round: age the buffer, snapshot it into a gossip,
  /// scatter to at most `fanout` distinct peers, rotate events into the
  /// archive, and complete a requested departure.
  fn gossip_round(&mut self, host: &mut dyn Host) {
    let now = host.now();
    self.events.age_all();

    let mut gossip_subs =
      self.subs.keys().copied().collect::<std::collections::HashSet<_>>();
    if !self.unsubscription_requested {
      gossip_subs.insert(self.pid);
    } else {
      self.unsubs.insert(self.pid, now);
    }
    let gossip_unsubs = self
      .unsubs
      .keys()
      .copied()
      .collect::<std::collections::HashSet<_>>();
    let event_ids = self
      .delivered
      .iter()
      .copied()
      .collect::<std::collections::HashSet<_>>();

    let gossip = Gossip {
      sender: self.pid,
      events: self.events.live_snapshot(),
      subs: gossip_subs,
      unsubs: gossip_unsubs,
      event_ids: event_ids,
    };

    let n = min(self.config.fanout, self.view.len());
    let targets = self.view.choose_multiple(host.rng(), n);
    if !targets.is_empty() {
      trace!(
        LOG_LEVEL,
        self.pid,
        format!("gossiping to {:?}", targets)
      );
    }
    for target in targets {
      self.post(host, target, Message::Gossip(gossip.clone()));
    }

    self.events.rotate(now);
    self.events.trim_archive(self.config.archived_max);

    if self.unsubscription_requested {
      info!(LOG_LEVEL, self.pid, "left the membership");
      self.view.clear();
      self.subs.clear();
      self.unsubs.clear();
      self.events.clear();
      self.delivered.clear();
      self.retrieve.clear();
      self.active.clear();
      self.inbox.clear();
      self.is_unsubscribed = true;
      self.unsubscription_requested = false;
    }
  }

  /// Stamps the delivery tick and hands the message to the resolved peer.
  /// Unresolvable peers swallow the message.
  fn post(&mut self, host: &mut dyn Host, to: ProcessId, msg: Message) {
    let now = host.now();
    let due = if self.config.sync {
      now + 1
    } else {
      now + host.rng().gen_range(1..=self.config.message_max_delay)
    };
    if let Some(target) = host.resolve(to) {
      target.receive(Envelope { msg: msg, due: due });
    }
  }

  /// The current membership view.
  pub fn view(&self) -> &FrequencyBuffer {
    &self.view
  }

  /// Subscriptions awaiting re-propagation.
  pub fn subs(&self) -> &FrequencyBuffer {
    &self.subs
  }

  /// Unsubscriptions held for propagation, by admission tick.
  pub fn unsubs(&self) -> &HashMap<ProcessId, Tick> {
    &self.unsubs
  }

  /// Live and archived event notifications.
  pub fn events(&self) -> &EventStore {
    &self.events
  }

  /// Recently delivered event ids.
  pub fn delivered_ids(&self) -> &DeliveredLog {
    &self.delivered
  }

  /// Gaps noticed but not yet requested.
  pub fn pending_retrieves(&self) -> &[MissingEvent] {
    &self.retrieve
  }

  /// Retransmission requests in flight.
  pub fn active_requests(&self) -> &[ActiveRetrieveRequest] {
    &self.active
  }

  /// Inbound messages waiting, due or not.
  pub fn queued_messages(&self) -> usize {
    self.inbox.len()
  }

  /// True while quiescent after a departure.
  pub fn is_unsubscribed(&self) -> bool {
    self.is_unsubscribed
  }

  /// The tuning this process runs with.
  pub fn config(&self) -> &ProtocolConfig {
    &self.config
  }
}
