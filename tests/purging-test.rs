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

// Every bounded buffer stays within its cap at every tick boundary, and
// the structural invariants hold, under sustained broadcasts plus one
// mid-run departure.
#[test]
fn caps_hold_under_churn() {
  let mut sim = Simulation::new(11, ProtocolConfig::default());
  let pids = [1u64, 2, 3, 4, 5, 6, 7, 8];
  clique(&mut sim, &pids);

  for t in 0u64..60 {
    if t % 3 == 0 {
      // broadcasters rotate but stay clear of the departing process
      sim.broadcast((t / 3) % 3 + 1);
    }
    sim.tick();
    if sim.now() == 20 {
      sim.unsubscribe(4);
    }

    for pid in sim.pids() {
      let p = sim.process(pid);
      let cfg = p.config();
      assert!(p.view().len() <= cfg.view_max, "view cap on p{}", pid);
      assert!(p.subs().len() <= cfg.subs_max, "subs cap on p{}", pid);
      assert!(p.unsubs().len() <= cfg.unsubs_max, "unsubs cap on p{}", pid);
      assert!(
        p.events().live_len() <= cfg.events_max,
        "events cap on p{}",
        pid
      );
      assert!(
        p.delivered_ids().len() <= cfg.event_ids_max,
        "event id cap on p{}",
        pid
      );
      assert!(
        p.events().archived_len() <= cfg.archived_max,
        "archive cap on p{}",
        pid
      );

      assert!(!p.view().contains(&pid), "p{} gossips about itself", pid);
      assert!(!p.subs().contains(&pid), "p{} subscribes itself", pid);
      for id in p.events().live_ids() {
        assert!(
          !p.events().is_archived(id),
          "event both live and archived on p{}",
          pid
        );
      }
      for unsub in p.unsubs().keys() {
        assert!(
          !p.view().contains(unsub),
          "p{} keeps unsubscribed p{} in view",
          pid,
          unsub
        );
      }
    }
  }

  assert!(sim.process(4).is_unsubscribed());
}
