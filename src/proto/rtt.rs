//! RTT 估计与重传超时（RFC 6298 风格）
//!
//! 首个样本：`srtt = rttvar = sample`；此后
//! `rttvar = (1-β)·rttvar + β·|sample - srtt|`，`srtt = (1-α)·srtt + α·sample`。
//! `RTO = srtt + 4·rttvar`，下限 `min_rto`，可选上限 `max_rto`；每次超时翻倍。

use crate::sim::SimTime;

pub const ALPHA: f64 = 0.125;
pub const BETA: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct RttEstimator {
    srtt: Option<f64>,
    rttvar: f64,
    min_rtt: Option<SimTime>,
    latest: Option<SimTime>,
    rto: SimTime,
    min_rto: SimTime,
    max_rto: Option<SimTime>,
}

impl RttEstimator {
    pub fn new(init_rto: SimTime, min_rto: SimTime, max_rto: Option<SimTime>) -> Self {
        let max_rto = max_rto.map(|m| m.max(min_rto));
        let rto = init_rto.max(min_rto);
        Self {
            srtt: None,
            rttvar: 0.0,
            min_rtt: None,
            latest: None,
            rto: max_rto.map_or(rto, |m| rto.min(m)),
            min_rto,
            max_rto,
        }
    }

    /// 记录一个 RTT 样本并据此重算 RTO（会撤销之前的指数退避）。
    pub fn on_sample(&mut self, sample: SimTime) {
        let s = sample.0 as f64;
        match self.srtt {
            None => {
                self.srtt = Some(s);
                self.rttvar = s;
            }
            Some(avg) => {
                self.rttvar = (1.0 - BETA) * self.rttvar + BETA * (s - avg).abs();
                self.srtt = Some((1.0 - ALPHA) * avg + ALPHA * s);
            }
        }
        self.latest = Some(sample);
        self.min_rtt = Some(self.min_rtt.map_or(sample, |m| m.min(sample)));
        self.rto = self.computed_rto();
    }

    fn computed_rto(&self) -> SimTime {
        let Some(srtt) = self.srtt else {
            return self.rto;
        };
        let raw = (srtt + 4.0 * self.rttvar).ceil();
        let raw = if raw >= u64::MAX as f64 { u64::MAX } else { raw as u64 };
        self.capped(SimTime(raw).max(self.min_rto))
    }

    fn capped(&self, rto: SimTime) -> SimTime {
        self.max_rto.map_or(rto, |m| rto.min(m))
    }

    /// 超时退避：RTO 翻倍（配置了上限时不超过上限）
    pub fn backoff(&mut self) {
        self.rto = self.capped(SimTime(self.rto.0.saturating_mul(2)));
    }

    pub fn rto(&self) -> SimTime {
        self.rto
    }

    pub fn min_rto(&self) -> SimTime {
        self.min_rto
    }

    /// 平滑 RTT
    pub fn srtt(&self) -> Option<SimTime> {
        self.srtt.map(|v| SimTime(v.round() as u64))
    }

    pub fn rttvar(&self) -> SimTime {
        SimTime(self.rttvar.round() as u64)
    }

    /// 观察到的最小 RTT（Vegas 的 base RTT）
    pub fn min_rtt(&self) -> Option<SimTime> {
        self.min_rtt
    }

    pub fn latest(&self) -> Option<SimTime> {
        self.latest
    }
}
