use crate::metrics::MetricsRecorder;
use crate::net::{DataSegment, FlowId, NetApi, NodeId, Packet, Payload};
use crate::proto::tla::{GoBackN, Tahoe, Vegas};
use crate::proto::{AckInfo, CcMode, FlowCtx, SenderState, Tla, TlaSpec, TransportConfig};
use crate::sim::{Event, EventHandle, SimTime, Simulator, World};

/// 只记录发出的 packet，不做任何传输
#[derive(Default)]
struct MockNet {
    sent: Vec<Packet>,
    metrics: MetricsRecorder,
    next_id: u64,
}

impl NetApi for MockNet {
    fn make_data_packet(
        &mut self,
        src: NodeId,
        dst: NodeId,
        created_at: SimTime,
        size_bits: u64,
        seg: DataSegment,
    ) -> Packet {
        self.next_id += 1;
        Packet {
            id: self.next_id,
            src,
            dst,
            created_at,
            size_bits,
            payload: Payload::Data(seg),
        }
    }

    fn send_from_host(&mut self, _host: NodeId, pkt: Packet, _sim: &mut Simulator) {
        self.sent.push(pkt);
    }

    fn metrics_mut(&mut self) -> &mut MetricsRecorder {
        &mut self.metrics
    }
}

impl MockNet {
    fn seqs(&self) -> Vec<u64> {
        self.sent
            .iter()
            .filter_map(|p| p.data().map(|d| d.seq))
            .collect()
    }

    fn last_seq(&self) -> Option<u64> {
        self.seqs().last().copied()
    }
}

/// 只收集到期事件及其句柄，由测试自己分派
#[derive(Default)]
struct Capture {
    fired: Vec<(EventHandle, Event)>,
}

impl World for Capture {
    fn handle(&mut self, handle: EventHandle, ev: Event, _sim: &mut Simulator) {
        self.fired.push((handle, ev));
    }
}

struct Harness {
    tla: Box<dyn Tla>,
    s: SenderState,
    net: MockNet,
    sim: Simulator,
}

impl Harness {
    fn new(tla: Box<dyn Tla>, packets: u64) -> Self {
        let s = SenderState::new(packets, tla.initial_window(), &TransportConfig::default());
        Self {
            tla,
            s,
            net: MockNet::default(),
            sim: Simulator::default(),
        }
    }

    fn with_ctx(&mut self, f: impl FnOnce(&mut dyn Tla, &mut SenderState, &mut FlowCtx<'_>)) {
        let mut cx = FlowCtx {
            flow: FlowId(0),
            src: NodeId(0),
            dst: NodeId(1),
            packet_bits: 8192,
            sim: &mut self.sim,
            net: &mut self.net,
        };
        f(self.tla.as_mut(), &mut self.s, &mut cx);
    }

    fn start(&mut self) {
        self.with_ctx(|tla, s, cx| tla.on_flow_start(s, cx));
    }

    fn ack(&mut self, n: u64) {
        self.ack_sent_at(n, SimTime::ZERO);
    }

    fn ack_sent_at(&mut self, n: u64, sent_at: SimTime) {
        self.with_ctx(|tla, s, cx| tla.on_ack(s, AckInfo { ack: n, sent_at }, cx));
    }

    /// 推进时钟，返回期间到期的 Vegas 定时器句柄
    fn advance_to(&mut self, t: SimTime) -> Vec<EventHandle> {
        let mut c = Capture::default();
        self.sim.run_until(t, &mut c);
        c.fired
            .into_iter()
            .filter_map(|(h, ev)| matches!(ev, Event::VegasTimeOut { .. }).then_some(h))
            .collect()
    }

    fn vegas_timeout(&mut self, handle: EventHandle) {
        self.with_ctx(|tla, s, cx| tla.on_vegas_timeout(s, handle, cx));
    }

    fn timeout(&mut self) {
        self.with_ctx(|tla, s, cx| tla.on_timeout(s, cx));
    }

    fn in_flight(&self) -> Vec<u64> {
        self.s.in_flight().iter().copied().collect()
    }
}

/// 慢启动到 W=5，在途 {4..8}
fn ramp_to_ack4(h: &mut Harness) {
    h.start();
    assert_eq!(h.net.seqs(), vec![0]);
    for n in 1..=4 {
        h.ack(n);
    }
    assert_eq!(h.s.window(), 5.0);
    assert_eq!(h.in_flight(), vec![4, 5, 6, 7, 8]);
    assert_eq!(h.net.seqs(), (0..=8).collect::<Vec<_>>());
}

#[test]
fn send_new_packets_respects_burst_limit() {
    let mut h = Harness::new(Box::new(GoBackN::new(8, false)), 100);
    h.start();
    // 窗口为 8，但一次最多突发 2 个
    assert_eq!(h.net.seqs(), vec![0, 1]);
    h.ack(1);
    assert_eq!(h.net.seqs(), vec![0, 1, 2, 3]);
    assert_eq!(h.in_flight(), vec![1, 2, 3]);
}

#[test]
fn sender_never_exceeds_packet_count() {
    let mut h = Harness::new(Box::new(GoBackN::new(8, false)), 3);
    h.start();
    h.ack(1);
    h.ack(2);
    assert_eq!(h.net.seqs(), vec![0, 1, 2]);
    h.ack(3);
    assert!(h.s.is_complete());
    assert!(h.s.in_flight().is_empty());
    assert_eq!(h.s.rto_timer(), None);
}

#[test]
fn go_back_n_timeout_resends_from_first_unacked_with_backoff() {
    let mut h = Harness::new(Box::new(GoBackN::new(4, false)), 100);
    h.start();
    h.timeout();
    assert_eq!(h.net.seqs(), vec![0, 1, 0, 1]);
    assert_eq!(h.s.window(), 4.0);
    assert_eq!(h.s.rtt.rto(), SimTime::from_millis(2000));
    assert_eq!(h.s.stats.retransmits, 2);
}

#[test]
fn fourth_identical_ack_triggers_tahoe_fast_retransmit() {
    let mut h = Harness::new(Box::new(Tahoe::new(true, false)), 100);
    ramp_to_ack4(&mut h);

    h.ack(4);
    h.ack(4);
    assert_eq!(h.s.stats.fast_retransmits, 0);
    let before = h.net.sent.len();
    h.ack(4);
    assert_eq!(h.s.stats.fast_retransmits, 1);
    assert_eq!(h.s.stats.dup_acks, 3);
    assert_eq!(h.net.sent.len(), before + 1);
    assert_eq!(h.net.last_seq(), Some(4));
    assert_eq!(h.s.window(), 1.0);
    assert_eq!(h.s.ssthresh, 2.5);
    assert_eq!(h.s.mode, CcMode::SlowStart);
    assert_eq!(h.in_flight(), vec![4]);
    // 快速重传不做 RTO 退避
    assert_eq!(h.s.rtt.rto(), SimTime::from_millis(1000));

    // 同一 ACK 号的后续重复 ACK 不再触发
    let before = h.net.sent.len();
    h.ack(4);
    h.ack(4);
    h.ack(4);
    assert_eq!(h.s.stats.fast_retransmits, 1);
    assert_eq!(h.net.sent.len(), before);
}

#[test]
fn lost_first_packet_needs_four_identical_acks() {
    let mut h = Harness::new(Box::new(GoBackN::new(8, true)), 100);
    h.start();
    // 第一个 ACK 0 是原始 ACK，其后两个才是重复
    for _ in 0..3 {
        h.ack(0);
    }
    assert_eq!(h.s.stats.fast_retransmits, 0);
    assert_eq!(h.s.stats.dup_acks, 2);
    assert_eq!(h.net.seqs(), (0..8).collect::<Vec<_>>());

    h.ack(0);
    assert_eq!(h.s.stats.fast_retransmits, 1);
    assert_eq!(h.s.stats.dup_acks, 3);
    assert_eq!(h.net.last_seq(), Some(0));
    assert_eq!(h.s.stats.retransmits, 1);
}

#[test]
fn duplicates_are_ignored_when_fast_retransmit_is_disabled() {
    let mut h = Harness::new(Box::new(Tahoe::new(false, false)), 100);
    ramp_to_ack4(&mut h);
    let before = h.net.sent.len();
    for _ in 0..6 {
        h.ack(4);
    }
    assert_eq!(h.net.sent.len(), before);
    assert_eq!(h.s.window(), 5.0);
    assert_eq!(h.s.stats.fast_retransmits, 0);
}

#[test]
fn fast_recovery_inflates_then_deflates() {
    let mut h = Harness::new(Box::new(Tahoe::new(false, true)), 100);
    ramp_to_ack4(&mut h);

    h.ack(4);
    h.ack(4);
    h.ack(4);
    assert_eq!(h.s.mode, CcMode::FastRecovery);
    assert_eq!(h.s.stats.fast_retransmits, 1);
    assert_eq!(h.s.ssthresh, 2.5);
    // 进入快速恢复时窗口保持不变
    assert_eq!(h.s.window(), 5.0);
    assert_eq!(h.in_flight(), vec![4, 5, 6, 7, 8]);
    assert_eq!(h.net.last_seq(), Some(4));

    // 额外的重复 ACK：窗口膨胀 1
    h.ack(4);
    assert_eq!(h.s.window(), 6.0);
    assert_eq!(h.in_flight(), vec![4, 5, 6, 7, 8, 9]);
    assert_eq!(h.net.last_seq(), Some(9));

    // 新 ACK：W = ssthresh - 1，回到拥塞避免
    h.ack(9);
    assert_eq!(h.s.mode, CcMode::CongestionAvoidance);
    assert_eq!(h.s.window(), 1.5);
    assert_eq!(h.in_flight(), vec![9]);
    assert_eq!(h.net.last_seq(), Some(9));
}

#[test]
fn congestion_avoidance_grows_by_inverse_window() {
    let mut h = Harness::new(Box::new(Tahoe::new(true, false)), 100);
    h.s.ssthresh = 1.5;
    h.start();
    h.ack(1);
    // 2 > 1.5：离开慢启动
    assert_eq!(h.s.mode, CcMode::CongestionAvoidance);
    assert_eq!(h.s.window(), 2.0);
    h.ack(2);
    assert_eq!(h.s.window(), 2.5);
}

#[test]
fn timeout_collapses_window_and_backs_off() {
    let mut h = Harness::new(Box::new(Tahoe::new(true, false)), 100);
    ramp_to_ack4(&mut h);
    h.timeout();
    assert_eq!(h.s.window(), 1.0);
    assert_eq!(h.s.ssthresh, 2.5);
    assert_eq!(h.s.mode, CcMode::SlowStart);
    assert_eq!(h.in_flight(), vec![4]);
    assert_eq!(h.net.last_seq(), Some(4));
    assert_eq!(h.s.rtt.rto(), SimTime::from_millis(2000));
    assert_eq!(h.s.last_reset(), SimTime::ZERO);
}

#[test]
fn window_changes_are_recorded() {
    let mut h = Harness::new(Box::new(Tahoe::new(true, false)), 100);
    ramp_to_ack4(&mut h);
    let w: Vec<f64> = h.net.metrics.window_series(FlowId(0)).into_iter().map(|x| x.1).collect();
    assert_eq!(w, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn vegas_diff_compares_expected_and_actual_throughput() {
    assert_eq!(Vegas::diff(10.0, SimTime(100), SimTime(200)), 5.0);
    assert_eq!(Vegas::diff(10.0, SimTime(100), SimTime(100)), 0.0);
    assert_eq!(Vegas::diff(10.0, SimTime(100), SimTime(0)), 0.0);
}

/// Vegas 流：t=100ms 收到首个 ACK（RTT 样本 100ms），定时器在 t=200ms 到期
fn vegas_after_first_ack() -> Harness {
    let mut h = Harness::new(Box::new(Vegas::new(1.0, 3.0, true)), 100);
    h.start();
    assert!(h.advance_to(SimTime::from_millis(100)).is_empty());
    h.ack_sent_at(1, SimTime::ZERO);
    assert_eq!(h.s.window(), 2.0);
    assert_eq!(h.s.rtt.min_rtt(), Some(SimTime::from_millis(100)));
    h
}

/// 让 srtt 升到 200ms（base 仍为 100ms），W=10：diff = 5 > beta
fn queueing_delay_at_window_10(h: &mut Harness) {
    h.s.rtt.on_sample(SimTime::from_millis(900));
    assert_eq!(h.s.rtt.srtt(), Some(SimTime::from_millis(200)));
    h.with_ctx(|_, s, cx| s.set_window(10.0, cx));
}

#[test]
fn vegas_decreases_window_in_congestion_avoidance() {
    let mut h = vegas_after_first_ack();
    h.s.mode = CcMode::CongestionAvoidance;
    queueing_delay_at_window_10(&mut h);

    let fired = h.advance_to(SimTime::from_millis(200));
    assert_eq!(fired.len(), 1);
    h.vegas_timeout(fired[0]);
    assert_eq!(h.s.window(), 9.0);
    assert_eq!(h.s.mode, CcMode::CongestionAvoidance);

    // 旧句柄已失效
    h.vegas_timeout(fired[0]);
    assert_eq!(h.s.window(), 9.0);

    // 定时器按 srtt 重新武装
    assert!(h.advance_to(SimTime::from_millis(399)).is_empty());
    let next = h.advance_to(SimTime::from_millis(400));
    assert_eq!(next.len(), 1);
    h.vegas_timeout(next[0]);
    assert_eq!(h.s.window(), 8.0);
}

#[test]
fn vegas_decrease_in_slow_start_also_ends_slow_start() {
    let mut h = vegas_after_first_ack();
    assert_eq!(h.s.mode, CcMode::SlowStart);
    queueing_delay_at_window_10(&mut h);

    let fired = h.advance_to(SimTime::from_millis(200));
    h.vegas_timeout(fired[0]);
    assert_eq!(h.s.window(), 9.0);
    assert_eq!(h.s.ssthresh, 9.0);
    assert_eq!(h.s.mode, CcMode::CongestionAvoidance);
}

#[test]
fn vegas_increases_window_without_queueing_delay() {
    let mut h = vegas_after_first_ack();
    h.s.mode = CcMode::CongestionAvoidance;
    assert_eq!(h.in_flight(), vec![1, 2]);

    // srtt == base：diff = 0 < alpha
    let fired = h.advance_to(SimTime::from_millis(200));
    h.vegas_timeout(fired[0]);
    assert_eq!(h.s.window(), 3.0);
    assert_eq!(h.in_flight(), vec![1, 2, 3]);
    assert_eq!(h.net.last_seq(), Some(3));
}

#[test]
fn tla_spec_selects_policy() {
    let spec: TlaSpec = serde_json::from_str(r#"{ "kind": "fast_retransmit" }"#).expect("spec");
    assert_eq!(spec, TlaSpec::FastRetransmit { window: 8 });
    assert_eq!(spec.build().name(), "fast_retransmit");

    let spec: TlaSpec = serde_json::from_str(r#"{ "kind": "go_back_n", "window": 4 }"#).expect("spec");
    let tla = spec.build();
    assert_eq!(tla.name(), "go_back_n");
    assert_eq!(tla.initial_window(), 4.0);

    let spec: TlaSpec = serde_json::from_str(r#"{ "kind": "tahoe", "fast_recovery": true }"#).expect("spec");
    assert_eq!(spec.build().name(), "reno");

    let spec: TlaSpec = serde_json::from_str(r#"{ "kind": "vegas" }"#).expect("spec");
    assert_eq!(
        spec,
        TlaSpec::Vegas {
            alpha: 1.0,
            beta: 3.0,
            fast_retransmit: true
        }
    );
    assert_eq!(TlaSpec::default().build().name(), "tahoe");

    assert!(serde_json::from_str::<TlaSpec>(r#"{ "kind": "cubic" }"#).is_err());
}
