use crate::core::{Event, EventId, ProcessId, Tick};
use crate::gossip::{
  Envelope, Host, Message, Process, ProcessHandle, ProtocolConfig,
};
use crate::testkit::{FailureConfigMap, PACKET_DROP};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::{BTreeMap, HashMap};

/// The shared side of a simulated deployment: clock, RNG, routing table,
/// failure injection, and the application-delivery record.
struct SimNet {
  now: Tick,
  rng: StdRng,
  routes: HashMap<ProcessId, ProcessHandle>,
  delivered: HashMap<ProcessId, Vec<Event>>,
  failures: FailureConfigMap,
  messages_sent: u64,
}
impl Host for SimNet {
  fn now(&self) -> Tick {
    self.now
  }

  fn rng(&mut self) -> &mut dyn RngCore {
    &mut self.rng
  }

  fn resolve(&mut self, pid: ProcessId) -> Option<ProcessHandle> {
    let handle = self.routes.get(&pid)?.clone();
    let drop_prob = self.failures.get(&pid).drop_prob;
    if drop_prob > 0.0 && self.rng.gen::<f64>() < drop_prob {
      return None;
    }
    self.messages_sent += 1;
    Some(handle)
  }

  fn deliver(&mut self, pid: ProcessId, event: &Event) {
    self.delivered.entry(pid).or_default().push(event.clone());
  }
}

/// A deterministic single-threaded deployment: every process steps once per
/// tick against a seeded RNG, so a run is reproducible from its seed.
pub struct Simulation {
  net: SimNet,
  config: ProtocolConfig,
  procs: BTreeMap<ProcessId, Process>,
}
impl Simulation {
  /// A simulation with the env-default failure map.
  pub fn new(seed: u64, config: ProtocolConfig) -> Simulation {
    let mut failures = FailureConfigMap::default();
    failures.cluster_wide.drop_prob = *PACKET_DROP;
    Simulation::with_failures(seed, config, failures)
  }

  /// A simulation with an explicit failure map.
  pub fn with_failures(
    seed: u64,
    config: ProtocolConfig,
    failures: FailureConfigMap,
  ) -> Simulation {
    Simulation {
      net: SimNet {
        now: 0,
        rng: StdRng::seed_from_u64(seed),
        routes: HashMap::new(),
        delivered: HashMap::new(),
        failures: failures,
        messages_sent: 0,
      },
      config: config,
      procs: BTreeMap::new(),
    }
  }

  /// Registers a process seeded with an initial view.
  pub fn add_process(
    &mut self,
    pid: ProcessId,
    view: HashMap<ProcessId, u64>,
  ) {
    let process = Process::new(pid, view, self.config.clone());
    self.net.routes.insert(pid, process.handle());
    self.procs.insert(pid, process);
  }

  /// The current tick.
  pub fn now(&self) -> Tick {
    self.net.now
  }

  /// Advances the clock one tick and steps every process.
  pub fn tick(&mut self) {
    self.net.now += 1;
    for process in self.procs.values_mut() {
      process.step(&mut self.net);
    }
  }

  /// Runs `ticks` full rounds.
  pub fn run(&mut self, ticks: u64) {
    for _ in 0..ticks {
      self.tick();
    }
  }

  /// Has `pid` broadcast a fresh event, returning its id.
  pub fn broadcast(&mut self, pid: ProcessId) -> EventId {
    self.procs.get_mut(&pid).unwrap().broadcast(&mut self.net)
  }

  /// Rejoins `pid` through `target`.
  pub fn subscribe(&mut self, pid: ProcessId, target: ProcessId) {
    self.procs.get_mut(&pid).unwrap().subscribe(target);
  }

  /// Latches `pid`'s departure.
  pub fn unsubscribe(&mut self, pid: ProcessId) {
    self.procs.get_mut(&pid).unwrap().unsubscribe();
  }

  /// Queues a raw message for delivery on the next tick, bypassing
  /// failure injection. Tests use this to forge gossip.
  pub fn inject(&mut self, to: ProcessId, msg: Message) {
    let env = Envelope {
      msg: msg,
      due: self.net.now + 1,
    };
    self.net.routes.get(&to).unwrap().receive(env);
  }

  /// Read access to a process's buffers.
  pub fn process(&self, pid: ProcessId) -> &Process {
    &self.procs[&pid]
  }

  /// Every registered process id.
  pub fn pids(&self) -> Vec<ProcessId> {
    self.procs.keys().copied().collect()
  }

  /// Every event delivered to `pid`'s application so far, in order.
  pub fn delivered(&self, pid: ProcessId) -> &[Event] {
    self
      .net
      .delivered
      .get(&pid)
      .map(|events| events.as_slice())
      .unwrap_or(&[])
  }

  /// Messages that made it past failure injection.
  pub fn messages_sent(&self) -> u64 {
    self.net.messages_sent
  }
}
