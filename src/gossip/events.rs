use crate::core::{Event, EventId, Tick};
use crate::gossip::ProtocolConfig;
use linked_hash_map::LinkedHashMap;
use rand::seq::IteratorRandom;
use rand::RngCore;
use std::collections::HashMap;

/// A retired event kept around to answer retransmission requests, tagged
/// with the tick it entered the archive.
#[derive(Clone, Debug)]
pub struct Archived {
  pub event: Event,
  pub since: Tick,
}

/// Event notifications held by a process: the live buffer (received since
/// the last outgoing gossip) and the retransmission archive. An event id is
/// in at most one of the two.
#[derive(Default)]
pub struct EventStore {
  live: HashMap<EventId, Event>,
  archive: HashMap<EventId, Archived>,
}
impl EventStore {
  /// An empty store.
  pub fn new() -> EventStore {
    EventStore {
      live: HashMap::new(),
      archive: HashMap::new(),
    }
  }

  /// Size of the live buffer.
  pub fn live_len(&self) -> usize {
    self.live.len()
  }

  /// Size of the archive.
  pub fn archived_len(&self) -> usize {
    self.archive.len()
  }

  /// Whether the live buffer holds this id.
  pub fn is_live(&self, id: &EventId) -> bool {
    self.live.contains_key(id)
  }

  /// Whether the archive holds this id.
  pub fn is_archived(&self, id: &EventId) -> bool {
    self.archive.contains_key(id)
  }

  /// Ids currently live.
  pub fn live_ids(&self) -> impl Iterator<Item = &EventId> {
    self.live.keys()
  }

  /// Ids currently archived.
  pub fn archived_ids(&self) -> impl Iterator<Item = &EventId> {
    self.archive.keys()
  }

  /// Admits an event into the live buffer.
  pub fn insert_live(&mut self, event: Event) {
    self.live.insert(event.id, event);
  }

  /// Raises the age of the matching live event to `seen.age` if the copy
  /// just observed traveled further. Archived copies are left alone.
  pub fn bump_age(&mut self, seen: &Event) {
    if let Some(held) = self.live.get_mut(&seen.id) {
      if held.age < seen.age {
        held.age = seen.age;
      }
    }
  }

  /// One hop for every live event, at the start of a gossip round.
  pub fn age_all(&mut self) {
    for event in self.live.values_mut() {
      event.age += 1;
    }
  }

  /// Deep copies of the live buffer for an outgoing gossip.
  pub fn live_snapshot(&self) -> Vec<Event> {
    self.live.values().cloned().collect()
  }

  /// A retransmittable copy, live buffer preferred over the archive.
  pub fn lookup(&self, id: &EventId) -> Option<Event> {
    self
      .live
      .get(id)
      .cloned()
      .or_else(|| self.archive.get(id).map(|a| a.event.clone()))
  }

  /// Moves every live event into the archive at the end of a round.
  pub fn rotate(&mut self, now: Tick) {
    for (id, event) in self.live.drain() {
      self.archive.insert(
        id,
        Archived {
          event: event,
          since: now,
        },
      );
    }
  }

  /// Brings the live buffer back under its cap.
  ///
  /// With age-based purging, stage A drops events that are `long_ago` hops
  /// staler than some other event from the same origin (they have been
  /// disseminated for long enough that the system-wide copy count is high);
  /// stage B archives the oldest until the cap holds. Without it, uniform
  /// random eviction into the archive. The archive is trimmed afterwards in
  /// either case.
  pub fn trim_live(
    &mut self,
    now: Tick,
    rng: &mut dyn RngCore,
    cfg: &ProtocolConfig,
  ) {
    if cfg.age_based_message_purging {
      if self.live.len() > cfg.events_max {
        let stale = self
          .live
          .values()
          .filter(|e| {
            self.live.values().any(|c| {
              c.id.origin == e.id.origin
                && c.age.saturating_sub(e.age) > cfg.long_ago
            })
          })
          .map(|e| e.id)
          .collect::<Vec<_>>();
        for id in stale {
          self.live.remove(&id);
        }
      }
      while self.live.len() > cfg.events_max {
        let oldest = self
          .live
          .values()
          .max_by_key(|e| e.age)
          .map(|e| e.id)
          .unwrap();
        let event = self.live.remove(&oldest).unwrap();
        self.archive.insert(
          oldest,
          Archived {
            event: event,
            since: now,
          },
        );
      }
    } else {
      while self.live.len() > cfg.events_max {
        let id = self.live.keys().copied().choose(rng).unwrap();
        let event = self.live.remove(&id).unwrap();
        self.archive.insert(
          id,
          Archived {
            event: event,
            since: now,
          },
        );
      }
    }
    self.trim_archive(cfg.archived_max);
  }

  /// Evicts the longest-archived entries until the cap holds.
  pub fn trim_archive(&mut self, cap: usize) {
    while self.archive.len() > cap {
      let oldest = self
        .archive
        .iter()
        .min_by_key(|(_, a)| a.since)
        .map(|(id, _)| *id)
        .unwrap();
      self.archive.remove(&oldest);
    }
  }

  /// Drops both buffers.
  pub fn clear(&mut self) {
    self.live.clear();
    self.archive.clear();
  }
}

/// FIFO log of the event ids this process has already delivered. Bounded;
/// once an id falls off the head and its event has also left the archive,
/// the process may treat a re-advertised copy as new, which is the accepted
/// cost of bounded memory.
#[derive(Default)]
pub struct DeliveredLog {
  ids: LinkedHashMap<EventId, ()>,
}
impl DeliveredLog {
  /// An empty log.
  pub fn new() -> DeliveredLog {
    DeliveredLog {
      ids: LinkedHashMap::new(),
    }
  }

  /// Ids remembered.
  pub fn len(&self) -> usize {
    self.ids.len()
  }

  /// Whether this id is still remembered as delivered.
  pub fn contains(&self, id: &EventId) -> bool {
    self.ids.contains_key(id)
  }

  /// Appends a freshly delivered id.
  pub fn record(&mut self, id: EventId) {
    self.ids.insert(id, ());
  }

  /// Drops from the head until the cap holds.
  pub fn trim(&mut self, cap: usize) {
    while self.ids.len() > cap {
      self.ids.pop_front();
    }
  }

  /// Remembered ids, oldest first.
  pub fn iter(&self) -> impl Iterator<Item = &EventId> {
    self.ids.keys()
  }

  /// Forgets everything.
  pub fn clear(&mut self) {
    self.ids.clear();
  }
}

#[cfg(test)]
use crate::core::ProcessId;
#[cfg(test)]
use rand::rngs::StdRng;
#[cfg(test)]
use rand::SeedableRng;
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
fn event(origin: ProcessId, uid: u128, age: u64) -> Event {
  Event {
    id: EventId::new(Uuid::from_u128(uid), origin),
    age: age,
  }
}

#[test]
fn stage_a_drops_beaten_events() {
  let mut store = EventStore::new();
  for (uid, age) in [1u128, 2, 3, 4].iter().zip([1u64, 2, 3, 4]) {
    store.insert_live(event(9, *uid, age));
  }
  store.insert_live(event(9, 5, 200));
  store.insert_live(event(9, 6, 201));
  let cfg = ProtocolConfig::default();
  let mut rng = StdRng::seed_from_u64(0);
  store.trim_live(10, &mut rng, &cfg);
  assert_eq!(store.live_len(), 2);
  assert!(store.is_live(&event(9, 5, 200).id));
  assert!(store.is_live(&event(9, 6, 201).id));
  // stage A discards outright, nothing reached the archive
  assert_eq!(store.archived_len(), 0);
}

#[test]
fn stage_b_archives_the_oldest() {
  let mut store = EventStore::new();
  for origin in 0..7u64 {
    store.insert_live(event(origin, origin as u128, origin));
  }
  let cfg = ProtocolConfig::default();
  let mut rng = StdRng::seed_from_u64(0);
  store.trim_live(42, &mut rng, &cfg);
  assert_eq!(store.live_len(), 5);
  assert!(store.is_archived(&event(6, 6, 6).id));
  assert!(store.is_archived(&event(5, 5, 5).id));
  assert!(store.is_live(&event(0, 0, 0).id));
}

#[test]
fn archive_evicts_longest_held() {
  let mut store = EventStore::new();
  for uid in 0..12u128 {
    store.insert_live(event(1, uid, 0));
    store.rotate(uid as Tick);
  }
  store.trim_archive(10);
  assert_eq!(store.archived_len(), 10);
  assert!(!store.is_archived(&event(1, 0, 0).id));
  assert!(!store.is_archived(&event(1, 1, 0).id));
  assert!(store.is_archived(&event(1, 11, 0).id));
}

#[test]
fn delivered_log_is_fifo() {
  let mut log = DeliveredLog::new();
  let ids = (0..7u128)
    .map(|uid| EventId::new(Uuid::from_u128(uid), 1))
    .collect::<Vec<_>>();
  for id in ids.iter() {
    log.record(*id);
    log.trim(5);
  }
  assert_eq!(log.len(), 5);
  assert!(!log.contains(&ids[0]));
  assert!(!log.contains(&ids[1]));
  assert!(log.contains(&ids[2]));
  assert!(log.contains(&ids[6]));
}
