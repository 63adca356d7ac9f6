//! 配置档案
//!
//! 强类型的端点配置。配置可以 `based_on` 另一个配置，只覆盖自己设置的字段；
//! 模板只用于被继承。内置配置覆盖常见场景，JSON 文件可以新增或覆盖：
//!
//! ```json
//! {
//!   "senders": {
//!     "club_laptop": { "based_on": "sender_base", "receiver_addr": "10.0.0.7:2520" }
//!   },
//!   "receivers": {}
//! }
//! ```

mod builtin;
mod endpoint;
mod spec;

use std::collections::BTreeMap;
use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::score::ScoreError;

pub use endpoint::SocketEndpoint;
pub use spec::{
    ReceiverProfile, ReceiverProfileSpec, ScoreSinkSpec, ScoreSourceSpec, SenderProfile, SenderProfileSpec,
};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid profile file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no profile named {0:?}")]
    Unknown(String),
    #[error("profile {0:?} is a template and can only be used as a base")]
    Template(String),
    #[error("profile {0:?} inherits from itself")]
    Cycle(String),
    #[error("profile {profile:?} does not set {field}")]
    MissingField { profile: String, field: &'static str },
    #[error("bad socket address {value:?}: {source}")]
    BadAddr {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("bad score: {0}")]
    Score(#[from] ScoreError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// 可叠加在基础配置之上的部分配置
pub trait ProfileSpec: Clone {
    fn based_on(&self) -> Option<&str>;
    fn is_template(&self) -> bool;
    /// `self` 中设置的字段优先于 `base`
    fn merge_over(&self, base: &Self) -> Self;
}

/// 同一类的具名配置
#[derive(Debug, Clone)]
pub struct Profiles<S> {
    entries: BTreeMap<String, S>,
}

impl<S> Default for Profiles<S> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<S: ProfileSpec> Profiles<S> {
    pub fn insert(&mut self, name: impl Into<String>, spec: S) {
        self.entries.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&S> {
        self.entries.get(name)
    }

    /// 可构建的配置名（不含模板），已排序
    pub fn buildable_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, s)| !s.is_template())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// 沿 `based_on` 链把 `name` 合并为一个配置
    pub fn flatten(&self, name: &str) -> Result<S, ProfileError> {
        let top = self.entries.get(name).ok_or_else(|| ProfileError::Unknown(name.to_string()))?;
        if top.is_template() {
            return Err(ProfileError::Template(name.to_string()));
        }
        let mut seen = vec![name];
        let mut merged = top.clone();
        let mut cur = top;
        while let Some(base_name) = cur.based_on() {
            if seen.contains(&base_name) {
                return Err(ProfileError::Cycle(name.to_string()));
            }
            seen.push(base_name);
            let base = self
                .entries
                .get(base_name)
                .ok_or_else(|| ProfileError::Unknown(base_name.to_string()))?;
            merged = merged.merge_over(base);
            cur = base;
        }
        Ok(merged)
    }
}

/// 进程已知的全部发送端与接收端配置
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    pub senders: Profiles<SenderProfileSpec>,
    pub receivers: Profiles<ReceiverProfileSpec>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProfileFile {
    senders: BTreeMap<String, SenderProfileSpec>,
    receivers: BTreeMap<String, ReceiverProfileSpec>,
}

impl ProfileSet {
    /// 内置配置
    pub fn builtin() -> Self {
        builtin::profiles()
    }

    /// 从 JSON 文档新增（或替换）配置
    pub fn extend_from_json(&mut self, json: &str) -> Result<(), ProfileError> {
        let file: ProfileFile = serde_json::from_str(json)?;
        for (name, spec) in file.senders {
            self.senders.insert(name, spec);
        }
        for (name, spec) in file.receivers {
            self.receivers.insert(name, spec);
        }
        Ok(())
    }

    /// 内置配置加上 `path` 中的配置
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut set = Self::builtin();
        set.extend_from_json(&json)?;
        Ok(set)
    }

    pub fn sender(&self, name: &str) -> Result<SenderProfile, ProfileError> {
        SenderProfile::resolve(name, &self.senders.flatten(name)?)
    }

    pub fn receiver(&self, name: &str) -> Result<ReceiverProfile, ProfileError> {
        ReceiverProfile::resolve(name, &self.receivers.flatten(name)?)
    }
}

pub(crate) fn parse_addr(value: &str) -> Result<SocketAddr, ProfileError> {
    value.parse().map_err(|source| ProfileError::BadAddr {
        value: value.to_string(),
        source,
    })
}
