use crate::core::ProcessId;
use rand::seq::IteratorRandom;
use rand::RngCore;
use std::collections::HashMap;

/// A bounded pool of peers, each with the number of times its subscription
/// has been seen. Both `view` and `subs` are instances of this.
///
/// Eviction is biased toward high-frequency entries: a peer everyone has
/// heard about is safe to forget locally, while a rare one is kept so its
/// subscription keeps circulating.
#[derive(Clone, Debug, Default)]
pub struct FrequencyBuffer {
  entries: HashMap<ProcessId, u64>,
}
impl FrequencyBuffer {
  /// An empty pool.
  pub fn new() -> FrequencyBuffer {
    FrequencyBuffer {
      entries: HashMap::new(),
    }
  }

  /// Adopts pre-seeded entries, frequencies included.
  pub fn from_entries(entries: HashMap<ProcessId, u64>) -> FrequencyBuffer {
    FrequencyBuffer { entries: entries }
  }

  /// Number of peers held.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// True when no peer is held.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Membership test.
  pub fn contains(&self, pid: &ProcessId) -> bool {
    self.entries.contains_key(pid)
  }

  /// How often this peer's subscription has been seen, if held.
  pub fn frequency(&self, pid: &ProcessId) -> Option<u64> {
    self.entries.get(pid).copied()
  }

  /// Inserts or overwrites an entry with an explicit frequency.
  pub fn insert(&mut self, pid: ProcessId, freq: u64) {
    self.entries.insert(pid, freq);
  }

  /// Inserts with frequency 0 if absent, then increments.
  pub fn bump(&mut self, pid: ProcessId) {
    *self.entries.entry(pid).or_insert(0) += 1;
  }

  /// Drops an entry, returning its frequency.
  pub fn remove(&mut self, pid: &ProcessId) -> Option<u64> {
    self.entries.remove(pid)
  }

  /// Forgets every peer.
  pub fn clear(&mut self) {
    self.entries.clear();
  }

  /// The peers held, in no particular order.
  pub fn keys(&self) -> impl Iterator<Item = &ProcessId> {
    self.entries.keys()
  }

  /// A uniformly random peer.
  pub fn choose(&self, rng: &mut dyn RngCore) -> Option<ProcessId> {
    self.entries.keys().copied().choose(rng)
  }

  /// `n` distinct peers, uniformly at random.
  pub fn choose_multiple(
    &self,
    rng: &mut dyn RngCore,
    n: usize,
  ) -> Vec<ProcessId> {
    self.entries.keys().copied().choose_multiple(rng, n)
  }

  /// Picks the eviction victim.
  ///
  /// With frequency biasing on, a uniformly drawn peer is returned only if
  /// its frequency beats `k` times the buffer average; otherwise its
  /// frequency is incremented and the draw repeats. `k < 1` makes the loop
  /// terminate with probability 1: every rejection raises a frequency, so
  /// some entry eventually clears the bar.
  pub fn select(
    &mut self,
    rng: &mut dyn RngCore,
    frequency_based: bool,
    k: f64,
  ) -> Option<ProcessId> {
    if self.entries.is_empty() {
      return None;
    }
    if !frequency_based {
      return self.choose(rng);
    }
    let avg = self.entries.values().sum::<u64>() as f64
      / self.entries.len() as f64;
    loop {
      let pid = self.choose(rng).unwrap();
      let freq = self.entries[&pid];
      if freq as f64 > k * avg {
        return Some(pid);
      }
      self.entries.insert(pid, freq + 1);
    }
  }
}

#[cfg(test)]
use rand::rngs::StdRng;
#[cfg(test)]
use rand::SeedableRng;

#[test]
fn select_terminates_on_flat_buffer() {
  let mut rng = StdRng::seed_from_u64(7);
  let mut buf =
    FrequencyBuffer::from_entries((0..10).map(|p| (p, 0)).collect());
  for _ in 0..10 {
    assert!(buf.select(&mut rng, true, 0.9).is_some());
  }
}

#[test]
fn select_prefers_well_known_peers() {
  // 5 peers everyone knows about (frequency 10) and 5 rare ones
  // (frequency 1). Trimming down to 5 should mostly evict the former.
  let mut survivors_rare = 0u32;
  let mut survivors_known = 0u32;
  for trial in 0..50 {
    let mut rng = StdRng::seed_from_u64(trial);
    let mut buf = FrequencyBuffer::new();
    for p in 0..5 {
      buf.insert(p, 10);
    }
    for p in 5..10 {
      buf.insert(p, 1);
    }
    while buf.len() > 5 {
      let victim = buf.select(&mut rng, true, 0.5).unwrap();
      buf.remove(&victim);
    }
    survivors_known += buf.keys().filter(|p| **p < 5).count() as u32;
    survivors_rare += buf.keys().filter(|p| **p >= 5).count() as u32;
  }
  assert!(
    survivors_rare > survivors_known,
    "rare {} vs known {}",
    survivors_rare,
    survivors_known
  );
}

#[test]
fn select_uniform_when_biasing_disabled() {
  let mut rng = StdRng::seed_from_u64(3);
  let mut buf = FrequencyBuffer::new();
  buf.insert(1, 1000);
  buf.insert(2, 0);
  let picked = buf.select(&mut rng, false, 0.5).unwrap();
  assert!(picked == 1 || picked == 2);
  assert_eq!(buf.frequency(&2), Some(0), "no increments without biasing");
}
