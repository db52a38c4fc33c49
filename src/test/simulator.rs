use crate::net::{FlowId, LinkId, NodeId};
use crate::sim::{Event, EventHandle, SimTime, Simulator, World};

/// 记录每个事件（用 FlowStart 的 flow 编号做标签）
#[derive(Default)]
struct LogWorld {
    log: Vec<(SimTime, usize, EventHandle)>,
    ticks: usize,
    chain_once: bool,
}

impl World for LogWorld {
    fn handle(&mut self, handle: EventHandle, ev: Event, sim: &mut Simulator) {
        if let Event::FlowStart { flow } = ev {
            self.log.push((sim.now(), flow.0, handle));
            if self.chain_once && flow.0 == 1 {
                self.chain_once = false;
                // 同一时刻新调度的事件排在已有同刻事件之后
                sim.schedule(sim.now(), Event::FlowStart { flow: FlowId(99) });
            }
        }
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        self.ticks += 1;
    }
}

fn start(id: usize) -> Event {
    Event::FlowStart { flow: FlowId(id) }
}

#[test]
fn scheduled_events_order_by_time_then_seq() {
    let mut sim = Simulator::default();
    let mut w = LogWorld::default();

    sim.schedule(SimTime(10), start(3));
    sim.schedule(SimTime(5), start(1));
    sim.schedule(SimTime(10), start(4));
    sim.schedule(SimTime(5), start(2));
    sim.run(&mut w);

    let order: Vec<usize> = w.log.iter().map(|e| e.1).collect();
    assert_eq!(order, vec![1, 2, 3, 4]);
    assert_eq!(w.ticks, 4);
    assert_eq!(sim.now(), SimTime(10));
    assert_eq!(sim.executed(), 4);
}

#[test]
fn events_scheduled_now_run_after_existing_same_time_events() {
    let mut sim = Simulator::default();
    let mut w = LogWorld {
        chain_once: true,
        ..LogWorld::default()
    };

    sim.schedule(SimTime(7), start(1));
    sim.schedule(SimTime(7), start(2));
    sim.run(&mut w);

    let order: Vec<usize> = w.log.iter().map(|e| e.1).collect();
    assert_eq!(order, vec![1, 2, 99]);
}

#[test]
fn handles_are_unique_and_delivered_with_their_event() {
    let mut sim = Simulator::default();
    let mut w = LogWorld::default();

    let a = sim.schedule(SimTime(1), start(0));
    let b = sim.schedule_in(SimTime(2), start(1));
    assert_ne!(a, b);
    sim.run(&mut w);

    assert_eq!(w.log[0].2, a);
    assert_eq!(w.log[1].2, b);
}

#[test]
fn scheduling_in_the_past_clamps_to_now() {
    let mut sim = Simulator::default();
    let mut w = LogWorld::default();

    sim.schedule(SimTime(100), start(0));
    sim.run(&mut w);
    sim.schedule(SimTime(3), start(1));
    sim.run(&mut w);

    assert_eq!(w.log[1].0, SimTime(100));
}

#[test]
fn run_until_includes_boundary_and_advances_clock() {
    let mut sim = Simulator::default();
    let mut w = LogWorld::default();

    sim.schedule(SimTime(10), start(0));
    sim.schedule(SimTime(20), start(1));
    sim.schedule(SimTime(21), start(2));
    sim.run_until(SimTime(20), &mut w);

    assert_eq!(w.log.len(), 2);
    assert_eq!(sim.now(), SimTime(20));
    assert_eq!(sim.pending(), 1);

    sim.run_until(SimTime(50), &mut w);
    assert_eq!(w.log.len(), 3);
    assert_eq!(sim.now(), SimTime(50));
}

#[test]
fn event_kind_is_reported_per_variant() {
    use crate::sim::EventKind;
    let ev = Event::LinkAvailable { link: LinkId(0) };
    assert_eq!(ev.kind(), EventKind::LinkAvailable);
    let ev = Event::RoutingTableOutdated { router: NodeId(3) };
    assert_eq!(ev.kind().to_string(), "RoutingTableOutdated");
}
