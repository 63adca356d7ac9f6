//! 比分发送端
//!
//! 读取比分并通过 UDP 同步到记分牌。

use clap::Parser;
use scorelink::net::PayloadHex;
use scorelink::profile::{ProfileSet, ScoreSourceSpec, SocketEndpoint};
use scorelink::proto::Sender;
use scorelink::score::ScoreSource;
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

/// 两次轮询套接字之间的间隔
const IDLE_PAUSE: Duration = Duration::from_millis(10);

#[derive(Debug, Parser)]
#[command(name = "sender", about = "Push the current score to a scoreboard receiver over UDP")]
struct Args {
    /// 发送端配置名
    #[arg(long, default_value = "test_sender")]
    profile: String,

    /// 额外的配置文件（JSON），叠加在内置配置之上
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// 列出可构建的发送端配置后退出
    #[arg(long)]
    list_profiles: bool,

    /// 覆盖接收端地址
    #[arg(long)]
    receiver: Option<SocketAddr>,

    /// 覆盖本地绑定地址
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// 发送该固定比分（9 个十六进制字节），代替配置中的数据源
    #[arg(long)]
    score: Option<String>,

    /// 对端 id 与比分生成器的随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 覆盖读取比分的间隔（毫秒）
    #[arg(long)]
    tick_ms: Option<u64>,

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
        for name in set.senders.buildable_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut profile = set.sender(&args.profile)?;
    if let Some(addr) = args.receiver {
        profile.receiver_addr = addr;
    }
    if let Some(addr) = args.bind {
        profile.bind_addr = addr;
    }
    if let Some(ms) = args.tick_ms {
        profile.tick = Duration::from_millis(ms);
    }
    if let Some(score) = args.score {
        profile.score_source = ScoreSourceSpec::Fixed { score };
    } else if let (Some(s), ScoreSourceSpec::Generator { seed }) = (args.seed, &mut profile.score_source) {
        *seed = Some(s);
    }
    tracing::info!(?profile, "resolved sender profile");

    let clock: ClockHandle = SystemClock::handle();
    let mut endpoint = SocketEndpoint::new(profile.bind_addr, Rc::clone(&clock));
    endpoint.init()?;
    let mut source = profile.score_source.build()?;

    let cfg = profile.sender_config();
    let mut sender = match args.seed {
        Some(seed) => Sender::with_seed(endpoint, cfg, Rc::clone(&clock), seed),
        None => Sender::new(endpoint, cfg, Rc::clone(&clock)),
    };

    let mut deadline = args.run_ms.map(|ms| CountdownTimer::from_millis(ms, true, Rc::clone(&clock)));
    let mut tick = CountdownTimer::new(profile.tick, true, Rc::clone(&clock));
    let mut score = source.read();
    loop {
        if tick.just_expired() {
            score = source.read();
            tick.reset();
        }
        sender.poll(score);
        if deadline.as_mut().is_some_and(CountdownTimer::just_expired) {
            break;
        }
        clock.sleep(IDLE_PAUSE);
    }

    println!(
        "connected={} peer_id={} peer_addr={}",
        sender.is_connected(),
        sender.connection().peer_id,
        sender.peer_addr()
    );
    if let Some(score) = sender.current_score() {
        println!("score {}", PayloadHex(&score));
    }
    println!("stats {}", sender.stats());

    let mut endpoint = sender.into_transport();
    endpoint.close();
    Ok(())
}
