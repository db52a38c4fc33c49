//! 仿真用例配置
//!
//! 用例文件是 JSON：主机、路由器、物理链路与流，外加可选的路由/传输参数。
//! 单位沿用课程实验的输入格式：Mbps、ms、KB、MB、秒。

mod error;
mod spec;

pub use error::ConfigError;
pub use spec::{CaseSpec, FlowSpec, LinkSpec};
