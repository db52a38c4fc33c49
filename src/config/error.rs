use std::path::PathBuf;

use thiserror::Error;

/// 配置错误：在仿真开始前检测，致命
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read case file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{kind} {id:?} is missing attribute `{attribute}`")]
    MissingAttribute {
        kind: &'static str,
        id: String,
        attribute: &'static str,
    },

    #[error("{kind} {id:?} refers to unknown node {reference:?}")]
    UnknownReference {
        kind: &'static str,
        id: String,
        reference: String,
    },

    #[error("duplicate name {0:?}")]
    Duplicate(String),

    #[error("host {host:?} must have exactly one link, found {links}")]
    HostLinks { host: String, links: usize },

    #[error("{kind} {id:?}: invalid {attribute}: {reason}")]
    Invalid {
        kind: &'static str,
        id: String,
        attribute: &'static str,
        reason: String,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
    }
}
