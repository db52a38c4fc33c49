use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::net::RoutingConfig;
use crate::proto::{TlaSpec, TransportConfig};
use crate::sim::SimTime;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseSpec {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub routers: Vec<String>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// 一条物理（双向）链路，展开为两条单向链路
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    pub name: String,
    #[serde(default)]
    pub a: Option<String>,
    #[serde(default)]
    pub b: Option<String>,
    #[serde(default)]
    pub rate_mbps: Option<f64>,
    #[serde(default)]
    pub delay_ms: Option<f64>,
    #[serde(default)]
    pub buffer_kb: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSpec {
    pub name: String,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub dst: Option<String>,
    #[serde(default)]
    pub data_mb: Option<f64>,
    #[serde(default)]
    pub start_s: Option<f64>,
    #[serde(default)]
    pub tla: TlaSpec,
}

fn required<'a, T>(v: &'a Option<T>, kind: &'static str, id: &str, attribute: &'static str) -> Result<&'a T, ConfigError> {
    v.as_ref().ok_or_else(|| ConfigError::MissingAttribute {
        kind,
        id: id.to_string(),
        attribute,
    })
}

fn invalid(kind: &'static str, id: &str, attribute: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        kind,
        id: id.to_string(),
        attribute,
        reason: reason.into(),
    }
}

impl LinkSpec {
    pub fn endpoints(&self) -> Result<(&str, &str), ConfigError> {
        let a = required(&self.a, "link", &self.name, "a")?;
        let b = required(&self.b, "link", &self.name, "b")?;
        Ok((a, b))
    }

    pub fn rate_bps(&self) -> Result<u64, ConfigError> {
        let mbps = *required(&self.rate_mbps, "link", &self.name, "rate_mbps")?;
        if !(mbps.is_finite() && mbps > 0.0) {
            return Err(invalid("link", &self.name, "rate_mbps", format!("must be positive, got {mbps}")));
        }
        Ok((mbps * 1e6).round().max(1.0) as u64)
    }

    pub fn latency(&self) -> Result<SimTime, ConfigError> {
        let ms = *required(&self.delay_ms, "link", &self.name, "delay_ms")?;
        if !(ms.is_finite() && ms >= 0.0) {
            return Err(invalid("link", &self.name, "delay_ms", format!("must be non-negative, got {ms}")));
        }
        Ok(SimTime::from_millis_f64(ms))
    }

    /// 缓冲区容量（KB -> bits）
    pub fn buffer_bits(&self) -> Result<u64, ConfigError> {
        let kb = *required(&self.buffer_kb, "link", &self.name, "buffer_kb")?;
        if !(kb.is_finite() && kb >= 0.0) {
            return Err(invalid("link", &self.name, "buffer_kb", format!("must be non-negative, got {kb}")));
        }
        Ok((kb * 1000.0 * 8.0).round() as u64)
    }
}

impl FlowSpec {
    pub fn endpoints(&self) -> Result<(&str, &str), ConfigError> {
        let src = required(&self.src, "flow", &self.name, "src")?;
        let dst = required(&self.dst, "flow", &self.name, "dst")?;
        Ok((src, dst))
    }

    /// 数据量（MB -> bits）
    pub fn total_bits(&self) -> Result<u64, ConfigError> {
        let mb = *required(&self.data_mb, "flow", &self.name, "data_mb")?;
        if !(mb.is_finite() && mb >= 0.0) {
            return Err(invalid("flow", &self.name, "data_mb", format!("must be non-negative, got {mb}")));
        }
        Ok((mb * 1e6 * 8.0).round() as u64)
    }

    pub fn start_at(&self) -> Result<SimTime, ConfigError> {
        let s = *required(&self.start_s, "flow", &self.name, "start_s")?;
        if !(s.is_finite() && s >= 0.0) {
            return Err(invalid("flow", &self.name, "start_s", format!("must be non-negative, got {s}")));
        }
        Ok(SimTime::from_millis_f64(s * 1000.0))
    }
}

impl CaseSpec {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// 引用完整性与取值检查；通过后才能构建网络
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for name in self.hosts.iter().chain(&self.routers) {
            if !names.insert(name.as_str()) {
                return Err(ConfigError::Duplicate(name.clone()));
            }
        }
        let hosts: HashSet<&str> = self.hosts.iter().map(String::as_str).collect();

        let mut link_names = HashSet::new();
        let mut host_links: HashMap<&str, usize> = HashMap::new();
        for link in &self.links {
            if !link_names.insert(link.name.as_str()) {
                return Err(ConfigError::Duplicate(link.name.clone()));
            }
            let (a, b) = link.endpoints()?;
            for end in [a, b] {
                if !names.contains(end) {
                    return Err(ConfigError::UnknownReference {
                        kind: "link",
                        id: link.name.clone(),
                        reference: end.to_string(),
                    });
                }
                if hosts.contains(end) {
                    *host_links.entry(end).or_insert(0) += 1;
                }
            }
            if a == b {
                return Err(invalid("link", &link.name, "b", "link endpoints must differ"));
            }
            link.rate_bps()?;
            link.latency()?;
            link.buffer_bits()?;
        }
        for host in &self.hosts {
            let links = host_links.get(host.as_str()).copied().unwrap_or(0);
            if links != 1 {
                return Err(ConfigError::HostLinks { host: host.clone(), links });
            }
        }

        let mut flow_names = HashSet::new();
        for flow in &self.flows {
            if !flow_names.insert(flow.name.as_str()) {
                return Err(ConfigError::Duplicate(flow.name.clone()));
            }
            let (src, dst) = flow.endpoints()?;
            for end in [src, dst] {
                if !hosts.contains(end) {
                    return Err(ConfigError::UnknownReference {
                        kind: "flow",
                        id: flow.name.clone(),
                        reference: end.to_string(),
                    });
                }
            }
            if src == dst {
                return Err(invalid("flow", &flow.name, "dst", "source and destination must differ"));
            }
            flow.total_bits()?;
            flow.start_at()?;
        }

        if !(self.routing.interval_ms.is_finite() && self.routing.interval_ms > 0.0) {
            return Err(invalid("routing", "routing", "interval_ms", "must be positive"));
        }
        if self.transport.packet_bits == 0 {
            return Err(invalid("transport", "transport", "packet_bits", "must be positive"));
        }
        Ok(())
    }
}
