use std::{
    path::{Path, PathBuf},
    rc::Rc,
    str::FromStr,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use cssmotion::Clock as _;

#[derive(Parser, Debug)]
#[command(name = "cssmotion", version)]
struct Cli {
    /// Log level for diagnostics on stderr.
    #[arg(long, global = true, default_value = "warn")]
    log: tracing::Level,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the `@keyframes` rule an animation file registers.
    Compile(CompileArgs),
    /// Run an animation file on a virtual clock and print sampled state.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Input animation JSON (`{"keyframes": [...], "timing": ...}`).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Name prefix for the registered rule.
    #[arg(long, default_value = cssmotion::DEFAULT_NAME_PREFIX)]
    prefix: String,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input animation JSON (`{"keyframes": [...], "timing": ...}`).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Stop after this many virtual milliseconds.
    #[arg(long)]
    until: f64,

    /// Sampling interval in ms.
    #[arg(long, default_value_t = 50.0)]
    every: f64,

    /// Operation to apply at a time, e.g. `40=pause`, `90=seek:10`, `120=rate:-1`.
    #[arg(long = "op")]
    ops: Vec<TimedOp>,
}

#[derive(Clone, Debug)]
enum Op {
    Play,
    Pause,
    Cancel,
    Finish,
    Reverse,
    Seek(f64),
    Rate(f64),
}

#[derive(Clone, Debug)]
struct TimedOp {
    at: f64,
    op: Op,
}

impl FromStr for TimedOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (at, action) = s
            .split_once('=')
            .ok_or_else(|| format!("expected <ms>=<action>, got '{s}'"))?;
        let at: f64 = at
            .trim()
            .parse()
            .map_err(|_| format!("invalid time '{at}'"))?;
        let number = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid number '{v}'"))
        };
        let op = match action.trim().split_once(':') {
            Some(("seek", v)) => Op::Seek(number(v)?),
            Some(("rate", v)) => Op::Rate(number(v)?),
            None => match action.trim() {
                "play" => Op::Play,
                "pause" => Op::Pause,
                "cancel" => Op::Cancel,
                "finish" => Op::Finish,
                "reverse" => Op::Reverse,
                other => return Err(format!("unknown action '{other}'")),
            },
            Some((other, _)) => return Err(format!("unknown action '{other}'")),
        };
        Ok(Self { at, op })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log)
        .init();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn read_animation_json(path: &Path) -> anyhow::Result<cssmotion::AnimationFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("open animation '{}'", path.display()))?;
    let file = cssmotion::AnimationFile::from_json(&text)
        .with_context(|| "parse animation JSON")?;
    Ok(file)
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let file = read_animation_json(&args.in_path)?;
    file.timing
        .clone()
        .into_timing()
        .resolve()
        .with_context(|| "validate timing")?;
    let rules = cssmotion::compile_keyframes(&file.keyframes).with_context(|| "compile keyframes")?;

    let sheet = Rc::new(cssmotion::MemoryStyleSheet::new());
    let timers = Rc::new(cssmotion::TimerQueue::new(cssmotion::VirtualClock::new()));
    let registry = cssmotion::StyleRegistry::with_prefix(
        sheet.clone(),
        timers,
        cssmotion::FlushStrategy::Rebuild,
        args.prefix,
    );
    let name = registry.insert(&rules);
    registry.flush();

    println!("{}", sheet.css());
    eprintln!("registered {name}");
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.until.is_finite() && args.until >= 0.0,
        "--until must be a finite number >= 0"
    );
    anyhow::ensure!(
        args.every.is_finite() && args.every > 0.0,
        "--every must be a finite number > 0"
    );
    let file = read_animation_json(&args.in_path)?;

    let timers = Rc::new(cssmotion::TimerQueue::new(cssmotion::VirtualClock::new()));
    let engine = cssmotion::Engine::new(Rc::new(cssmotion::MemoryStyleSheet::new()), timers.clone());
    let element = Rc::new(cssmotion::MemoryElement::new());
    let animation = engine
        .animate_file(element.clone(), &file)
        .with_context(|| format!("animate '{}'", args.in_path.display()))?;

    let clock = timers.clone();
    animation.set_onfinish(move || println!("{:>10}  onfinish", fmt_ms(clock.now_ms())));
    let clock = timers.clone();
    animation.set_oncancel(move || println!("{:>10}  oncancel", fmt_ms(clock.now_ms())));

    let mut ops = args.ops;
    ops.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut ops = ops.into_iter().filter(|o| o.at <= args.until).peekable();

    let mut sample = 0.0;
    loop {
        let next_op = ops.peek().map(|o| o.at);
        let at = match next_op {
            // operations win ties so the sample shows their effect
            Some(op_at) if op_at <= sample || sample > args.until => op_at,
            _ if sample <= args.until => sample,
            _ => break,
        };
        timers.advance_by(at - timers.now_ms());

        if next_op == Some(at) {
            if let Some(timed) = ops.next() {
                println!("{:>10}  {:?}", fmt_ms(at), timed.op);
                apply(&animation, &timed.op);
            }
            continue;
        }

        let time = animation
            .current_time()
            .map_or_else(|| "none".to_string(), fmt_ms);
        println!(
            "{:>10}  {:<8}  {:>10}  {}",
            fmt_ms(at),
            animation.play_state(),
            time,
            element.css_text()
        );
        sample += args.every;
    }

    Ok(())
}

fn apply(animation: &cssmotion::Animation, op: &Op) {
    match *op {
        Op::Play => animation.play(),
        Op::Pause => animation.pause(),
        Op::Cancel => animation.cancel(),
        Op::Finish => animation.finish(),
        Op::Reverse => animation.reverse(),
        Op::Seek(ms) => animation.set_current_time(ms),
        Op::Rate(rate) => animation.set_playback_rate(rate),
    }
}

fn fmt_ms(ms: f64) -> String {
    format!("{}ms", cssmotion::css_number((ms * 1000.0).round() / 1000.0))
}
