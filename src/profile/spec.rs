//! 配置字段定义
//!
//! 部分形式（来自文件，可继承）与解析后的完整形式。

use std::net::SocketAddr;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::{ProfileError, ProfileSpec, parse_addr};
use crate::proto::{ReceiverConfig, SenderConfig};
use crate::score::{self, FixedScore, ScoreGenerator, ScorePrinter, ScoreSink, ScoreSource, SegmentSink};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreSourceSpec {
    /// 大多数读取时加一的计数器
    Generator {
        #[serde(default)]
        seed: Option<u64>,
    },
    /// 固定比分，以十六进制字节给出
    Fixed { score: String },
}

impl ScoreSourceSpec {
    pub fn build(&self) -> Result<Box<dyn ScoreSource>, ProfileError> {
        Ok(match self {
            Self::Generator { seed } => Box::new(ScoreGenerator::new(*seed)),
            Self::Fixed { score } => Box::new(FixedScore(score::parse_hex(score)?)),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSinkSpec {
    Printer,
    Segments,
}

impl ScoreSinkSpec {
    pub fn build(&self, blank_leading_zeroes: bool) -> Box<dyn ScoreSink> {
        match self {
            Self::Printer => Box::new(ScorePrinter {
                blank_leading_zeroes,
                last: None,
            }),
            Self::Segments => Box::new(SegmentSink::new(blank_leading_zeroes)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SenderProfileSpec {
    pub based_on: Option<String>,
    pub template: bool,
    pub receiver_addr: Option<String>,
    pub bind_addr: Option<String>,
    pub lookout_timeout_ms: Option<u64>,
    pub tick_ms: Option<u64>,
    pub candidate_timeout_ms: Option<u64>,
    pub peer_liveness_timeout_ms: Option<u64>,
    pub resend_suppression_ms: Option<u64>,
    pub drain_budget_ms: Option<u64>,
    pub score_source: Option<ScoreSourceSpec>,
}

impl ProfileSpec for SenderProfileSpec {
    fn based_on(&self) -> Option<&str> {
        self.based_on.as_deref()
    }

    fn is_template(&self) -> bool {
        self.template
    }

    fn merge_over(&self, base: &Self) -> Self {
        Self {
            based_on: self.based_on.clone(),
            template: self.template,
            receiver_addr: self.receiver_addr.clone().or_else(|| base.receiver_addr.clone()),
            bind_addr: self.bind_addr.clone().or_else(|| base.bind_addr.clone()),
            lookout_timeout_ms: self.lookout_timeout_ms.or(base.lookout_timeout_ms),
            tick_ms: self.tick_ms.or(base.tick_ms),
            candidate_timeout_ms: self.candidate_timeout_ms.or(base.candidate_timeout_ms),
            peer_liveness_timeout_ms: self.peer_liveness_timeout_ms.or(base.peer_liveness_timeout_ms),
            resend_suppression_ms: self.resend_suppression_ms.or(base.resend_suppression_ms),
            drain_budget_ms: self.drain_budget_ms.or(base.drain_budget_ms),
            score_source: self.score_source.clone().or_else(|| base.score_source.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReceiverProfileSpec {
    pub based_on: Option<String>,
    pub template: bool,
    pub bind_addr: Option<String>,
    pub lookout_timeout_ms: Option<u64>,
    pub receive_timeout_ms: Option<u64>,
    pub score_sink: Option<ScoreSinkSpec>,
    pub blank_leading_zeroes: Option<bool>,
}

impl ProfileSpec for ReceiverProfileSpec {
    fn based_on(&self) -> Option<&str> {
        self.based_on.as_deref()
    }

    fn is_template(&self) -> bool {
        self.template
    }

    fn merge_over(&self, base: &Self) -> Self {
        Self {
            based_on: self.based_on.clone(),
            template: self.template,
            bind_addr: self.bind_addr.clone().or_else(|| base.bind_addr.clone()),
            lookout_timeout_ms: self.lookout_timeout_ms.or(base.lookout_timeout_ms),
            receive_timeout_ms: self.receive_timeout_ms.or(base.receive_timeout_ms),
            score_sink: self.score_sink.or(base.score_sink),
            blank_leading_zeroes: self.blank_leading_zeroes.or(base.blank_leading_zeroes),
        }
    }
}

fn required<T>(v: Option<T>, profile: &str, field: &'static str) -> Result<T, ProfileError> {
    v.ok_or_else(|| ProfileError::MissingField {
        profile: profile.to_string(),
        field,
    })
}

fn millis(v: Option<u64>, profile: &str, field: &'static str) -> Result<Duration, ProfileError> {
    required(v, profile, field).map(Duration::from_millis)
}

/// 解析完成的发送端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderProfile {
    pub name: String,
    pub receiver_addr: SocketAddr,
    pub bind_addr: SocketAddr,
    pub lookout_timeout: Duration,
    /// 两次读取比分的间隔
    pub tick: Duration,
    pub candidate_timeout: Duration,
    pub peer_liveness_timeout: Duration,
    pub resend_suppression: Duration,
    pub drain_budget: Duration,
    pub score_source: ScoreSourceSpec,
}

impl SenderProfile {
    pub fn resolve(name: &str, spec: &SenderProfileSpec) -> Result<Self, ProfileError> {
        let addr = |v: &Option<String>, field: &'static str| -> Result<SocketAddr, ProfileError> {
            parse_addr(&required(v.clone(), name, field)?)
        };
        Ok(Self {
            name: name.to_string(),
            receiver_addr: addr(&spec.receiver_addr, "receiver_addr")?,
            bind_addr: addr(&spec.bind_addr, "bind_addr")?,
            lookout_timeout: millis(spec.lookout_timeout_ms, name, "lookout_timeout_ms")?,
            tick: millis(spec.tick_ms, name, "tick_ms")?,
            candidate_timeout: millis(spec.candidate_timeout_ms, name, "candidate_timeout_ms")?,
            peer_liveness_timeout: millis(spec.peer_liveness_timeout_ms, name, "peer_liveness_timeout_ms")?,
            resend_suppression: millis(spec.resend_suppression_ms, name, "resend_suppression_ms")?,
            drain_budget: spec
                .drain_budget_ms
                .map_or(SenderConfig::default().drain_budget, Duration::from_millis),
            score_source: required(spec.score_source.clone(), name, "score_source")?,
        })
    }

    pub fn sender_config(&self) -> SenderConfig {
        SenderConfig {
            receiver_addr: self.receiver_addr,
            lookout_timeout: self.lookout_timeout,
            candidate_timeout: self.candidate_timeout,
            peer_liveness_timeout: self.peer_liveness_timeout,
            resend_suppression: self.resend_suppression,
            drain_budget: self.drain_budget,
        }
    }
}

/// 解析完成的接收端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverProfile {
    pub name: String,
    pub bind_addr: SocketAddr,
    pub lookout_timeout: Duration,
    pub receive_timeout: Duration,
    pub score_sink: ScoreSinkSpec,
    pub blank_leading_zeroes: bool,
}

impl ReceiverProfile {
    pub fn resolve(name: &str, spec: &ReceiverProfileSpec) -> Result<Self, ProfileError> {
        Ok(Self {
            name: name.to_string(),
            bind_addr: parse_addr(&required(spec.bind_addr.clone(), name, "bind_addr")?)?,
            lookout_timeout: millis(spec.lookout_timeout_ms, name, "lookout_timeout_ms")?,
            receive_timeout: millis(spec.receive_timeout_ms, name, "receive_timeout_ms")?,
            score_sink: required(spec.score_sink, name, "score_sink")?,
            blank_leading_zeroes: spec.blank_leading_zeroes.unwrap_or(true),
        })
    }

    pub fn receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig {
            receive_timeout: self.receive_timeout,
            lookout_timeout: self.lookout_timeout,
        }
    }
}
