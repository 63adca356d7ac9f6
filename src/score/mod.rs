//! 比分数据源与显示端
//!
//! 协议把比分视为不透明的 9 字节载荷。本模块提供两侧的协作者：
//! 发送端轮询的数据源，以及接收端写入已校验变化的显示端。

pub mod display;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::net::{PAYLOAD_SIZE, Payload, PayloadHex};

/// 序列化的记分牌数据
pub type Score = Payload;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("score must be {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },
    #[error("invalid hex byte {0:?}")]
    BadHex(String),
    #[error("digit {index} has value {value}, expected 0-9")]
    InvalidDigit { index: usize, value: u8 },
}

/// 拉取侧：每次调用返回当前比分
pub trait ScoreSource {
    fn read(&mut self) -> Score;
}

/// 推送侧：只在带内比分变化时调用
pub trait ScoreSink {
    fn write(&mut self, score: &Score);
}

impl<S: ScoreSource + ?Sized> ScoreSource for Box<S> {
    fn read(&mut self) -> Score {
        (**self).read()
    }
}

impl<S: ScoreSink + ?Sized> ScoreSink for Box<S> {
    fn write(&mut self, score: &Score) {
        (**self).write(score)
    }
}

/// 把 `"01 02 0A ..."`（或不带空格的同样字节）解析为比分
pub fn parse_hex(s: &str) -> Result<Score, ScoreError> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    let bytes: Vec<String> = if tokens.len() == 1 && tokens[0].len() > 2 {
        let t = tokens[0];
        if t.len() % 2 != 0 || !t.is_ascii() {
            return Err(ScoreError::BadHex(t.to_string()));
        }
        (0..t.len()).step_by(2).map(|i| t[i..i + 2].to_string()).collect()
    } else {
        tokens.iter().map(|t| t.to_string()).collect()
    };
    if bytes.len() != PAYLOAD_SIZE {
        return Err(ScoreError::WrongLength {
            expected: PAYLOAD_SIZE,
            got: bytes.len(),
        });
    }
    let mut score = [0u8; PAYLOAD_SIZE];
    for (slot, tok) in score.iter_mut().zip(&bytes) {
        if tok.len() > 2 || !tok.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ScoreError::BadHex(tok.clone()));
        }
        *slot = u8::from_str_radix(tok, 16).map_err(|_| ScoreError::BadHex(tok.clone()))?;
    }
    Ok(score)
}

/// 始终返回同一比分
#[derive(Debug, Clone)]
pub struct FixedScore(pub Score);

impl ScoreSource for FixedScore {
    fn read(&mut self) -> Score {
        self.0
    }
}

/// 测试数据源：大多数读取时加一的计数器，小端编码
#[derive(Debug)]
pub struct ScoreGenerator {
    score: u64,
    increase_probability: f64,
    rng: StdRng,
}

impl ScoreGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            score: 0,
            increase_probability: 0.8,
            rng,
        }
    }

    pub fn current(&self) -> u64 {
        self.score
    }
}

impl ScoreSource for ScoreGenerator {
    fn read(&mut self) -> Score {
        if self.rng.gen_bool(self.increase_probability) {
            self.score += 1;
            info!(score = self.score, "latest score increased");
        }
        let mut out = [0u8; PAYLOAD_SIZE];
        out[..8].copy_from_slice(&self.score.to_le_bytes());
        out
    }
}

/// 记录收到的每个比分
#[derive(Debug, Default)]
pub struct ScorePrinter {
    pub blank_leading_zeroes: bool,
    pub last: Option<Score>,
}

impl ScoreSink for ScorePrinter {
    fn write(&mut self, score: &Score) {
        match display::digits(score, self.blank_leading_zeroes) {
            Ok(digits) => info!(
                score = %PayloadHex(score),
                board = %display::DigitsText(&digits),
                "new score received"
            ),
            Err(e) => info!(score = %PayloadHex(score), note = %e, "new score received"),
        }
        self.last = Some(*score);
    }
}

/// 驱动七段数码管：把比分渲染为段码，只重写段码变化的数位
#[derive(Debug, Default)]
pub struct SegmentSink {
    pub blank_leading_zeroes: bool,
    frame: Option<[u8; PAYLOAD_SIZE]>,
    writes: u64,
}

impl SegmentSink {
    pub fn new(blank_leading_zeroes: bool) -> Self {
        Self {
            blank_leading_zeroes,
            ..Self::default()
        }
    }

    /// 当前显示的段码，收到第一个有效比分前为 `None`
    pub fn frame(&self) -> Option<[u8; PAYLOAD_SIZE]> {
        self.frame
    }

    /// 迄今单个数位的写入次数
    pub fn digit_writes(&self) -> u64 {
        self.writes
    }
}

impl ScoreSink for SegmentSink {
    fn write(&mut self, score: &Score) {
        let codes = match display::render(score, self.blank_leading_zeroes) {
            Ok(codes) => codes,
            Err(e) => {
                warn!(score = %PayloadHex(score), error = %e, "not displaying invalid score");
                return;
            }
        };
        let old = self.frame.unwrap_or([display::UNLIT; PAYLOAD_SIZE]);
        for (i, (&was, &now)) in old.iter().zip(&codes).enumerate() {
            if self.frame.is_some() && was == now {
                continue;
            }
            debug!(digit = i, was = %format!("{was:#04x}"), now = %format!("{now:#04x}"), "segment write");
            self.writes += 1;
        }
        self.frame = Some(codes);
    }
}
