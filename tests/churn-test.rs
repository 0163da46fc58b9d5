use lpbcast::core::ProcessId;
use lpbcast::gossip::ProtocolConfig;
use lpbcast::testkit::Simulation;
use std::collections::HashMap;

fn clique(sim: &mut Simulation, pids: &[ProcessId]) {
  for pid in pids {
    let view = pids
      .iter()
      .filter(|p| *p != pid)
      .map(|p| (*p, 0))
      .collect::<HashMap<_, _>>();
    sim.add_process(*pid, view);
  }
}

#[test]
fn unsubscription_propagates_to_everyone() {
  let mut sim = Simulation::new(23, ProtocolConfig::default());
  clique(&mut sim, &[1, 2, 3, 4, 5]);
  sim.run(5);
  sim.unsubscribe(3);
  sim.run(25);

  for pid in [1u64, 2, 4, 5] {
    let p = sim.process(pid);
    assert!(p.unsubs().contains_key(&3), "p{} missed the departure", pid);
    assert!(!p.view().contains(&3));
    assert!(!p.subs().contains(&3));
  }

  let p3 = sim.process(3);
  assert!(p3.is_unsubscribed());
  assert_eq!(p3.view().len(), 0);
  assert_eq!(p3.subs().len(), 0);
  assert!(p3.unsubs().is_empty());
  assert_eq!(p3.events().live_len(), 0);
  assert_eq!(p3.events().archived_len(), 0);
  assert_eq!(p3.delivered_ids().len(), 0);
  assert!(p3.pending_retrieves().is_empty());
  assert!(p3.active_requests().is_empty());
}

#[test]
fn departed_process_can_rejoin_and_broadcast() {
  let mut sim = Simulation::new(29, ProtocolConfig::default());
  clique(&mut sim, &[1, 2, 3, 4, 5]);
  sim.run(5);
  sim.unsubscribe(3);
  sim.run(10);
  assert!(sim.process(3).is_unsubscribed());

  sim.subscribe(3, 1);
  assert!(!sim.process(3).is_unsubscribed());
  let id = sim.broadcast(3);
  sim.run(10);

  // events spread regardless of the membership quarantine on the
  // returning peer's subscription
  for pid in [1u64, 2, 4, 5] {
    assert!(
      sim.delivered(pid).iter().any(|e| e.id == id),
      "p{} never saw the post-rejoin broadcast",
      pid
    );
  }
}
