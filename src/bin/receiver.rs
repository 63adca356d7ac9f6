//! 记分牌接收端
//!
//! 通过 UDP 接收发送端的比分并显示。

use clap::Parser;
use scorelink::net::PayloadHex;
use scorelink::profile::{ProfileSet, ScoreSinkSpec, SocketEndpoint};
use scorelink::proto::Receiver;
use scorelink::score::display;
use scorelink::timer::{ClockHandle, CountdownTimer, SystemClock};
use std::error::Error;
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

#[derive(Debug, Parser)]
#[command(name = "receiver", about = "Scoreboard side: accept scores from a sender over UDP")]
struct Args {
    /// 接收端配置名
    #[arg(long, default_value = "test_receiver")]
    profile: String,

    /// 额外的配置文件（JSON），叠加在内置配置之上
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// 列出可构建的接收端配置后退出
    #[arg(long)]
    list_profiles: bool,

    /// 覆盖本地绑定地址
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// 覆盖比分显示端
    #[arg(long, value_enum)]
    sink: Option<ScoreSinkSpec>,

    /// 覆盖单次接收的等待时间（毫秒）
    #[arg(long)]
    receive_timeout_ms: Option<u64>,

    /// 接收端初始 id 的随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 运行多少毫秒后退出，默认一直运行
    #[arg(long)]
    run_ms: Option<u64>,

    /// 同时把日志追加到该文件
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// 关闭日志
    #[arg(long)]
    quiet: bool,
}

fn init_tracing(quiet: bool, log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(std::io::stdout.and(Mutex::new(file)))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };
    tracing_subscriber::fmt()
        .with_env_filter(if quiet {
            EnvFilter::new("off")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        })
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.quiet, args.log_file.as_deref())?;

    let set = match &args.profiles {
        Some(path) => ProfileSet::load(path)?,
        None => ProfileSet::builtin(),
    };
    if args.list_profiles {
        for name in set.receivers.buildable_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut profile = set.receiver(&args.profile)?;
    if let Some(addr) = args.bind {
        profile.bind_addr = addr;
    }
    if let Some(ms) = args.receive_timeout_ms {
        profile.receive_timeout = Duration::from_millis(ms);
    }
    if let Some(sink) = args.sink {
        profile.score_sink = sink;
    }
    tracing::info!(?profile, "resolved receiver profile");

    let clock: ClockHandle = SystemClock::handle();
    let mut endpoint = SocketEndpoint::new(profile.bind_addr, Rc::clone(&clock));
    endpoint.init()?;
    let sink = profile.score_sink.build(profile.blank_leading_zeroes);

    let cfg = profile.receiver_config();
    let mut receiver = match args.seed {
        Some(seed) => Receiver::with_seed(endpoint, sink, cfg, Rc::clone(&clock), seed),
        None => Receiver::new(endpoint, sink, cfg, Rc::clone(&clock)),
    };

    let mut deadline = args.run_ms.map(|ms| CountdownTimer::from_millis(ms, true, Rc::clone(&clock)));
    receiver.run(|_| deadline.as_mut().is_some_and(CountdownTimer::just_expired));

    let conn = receiver.connection();
    println!(
        "my_id={} peer_id={} bound_addr={}",
        conn.my_id,
        conn.peer_id,
        receiver
            .bound_address()
            .map_or_else(|| "none".to_string(), |a| a.to_string())
    );
    let score = receiver.current_score();
    println!("score {}", PayloadHex(&score));
    if let Ok(digits) = display::digits(&score, profile.blank_leading_zeroes) {
        println!("board {}", display::DigitsText(&digits));
    }
    println!("stats {}", receiver.stats());

    let (mut endpoint, _) = receiver.into_parts();
    endpoint.close();
    Ok(())
}
