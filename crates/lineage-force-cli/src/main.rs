use lineage_force::{
    Graph, NodeState, RunState, Simulation, SimulationConfig, SimulationEvent, StopReason,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Lineage(lineage_force::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Lineage(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<lineage_force::Error> for CliError {
    fn from(value: lineage_force::Error) -> Self {
        Self::Lineage(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Validate,
    Frames,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    max_ticks: Option<u64>,
    every: u64,
    pins: Vec<(String, f64, f64)>,
}

/// Input document: a lineage graph plus an optional `config` object.
#[derive(Debug, Deserialize)]
struct Document {
    #[serde(flatten)]
    graph: Graph,
    #[serde(default)]
    config: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct LayoutOut<'a> {
    ticks: u64,
    alpha: f64,
    state: &'static str,
    nodes: &'a [NodeState],
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum FrameOut<'a> {
    Tick {
        step: u64,
        alpha: f64,
        nodes: &'a [NodeState],
    },
    Stopped {
        step: u64,
        alpha: f64,
        reason: &'static str,
    },
}

fn usage() -> &'static str {
    "lineage-force-cli\n\
\n\
USAGE:\n\
  lineage-force-cli [layout] [--pretty] [--max-ticks <n>] [--pin <id>=<x>,<y>]... [<path>|-]\n\
  lineage-force-cli validate [<path>|-]\n\
  lineage-force-cli frames [--every <n>] [--max-ticks <n>] [--pin <id>=<x>,<y>]... [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a JSON document with `nodes`, `edges` and an optional `config` object.\n\
  - layout prints the final node positions once the simulation cools down.\n\
  - frames prints one JSON line per tick (every <n>-th tick) and a final `stopped` line.\n\
  - Set RUST_LOG (e.g. RUST_LOG=lineage_force=debug) for diagnostics on stderr.\n\
"
}

fn parse_pin(raw: &str) -> Option<(String, f64, f64)> {
    let (id, coords) = raw.rsplit_once('=')?;
    let (x, y) = coords.split_once(',')?;
    let x = x.trim().parse::<f64>().ok()?;
    let y = y.trim().parse::<f64>().ok()?;
    if id.is_empty() || !(x.is_finite() && y.is_finite()) {
        return None;
    }
    Some((id.to_string(), x, y))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        every: 1,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "validate" => args.command = Command::Validate,
            "frames" => args.command = Command::Frames,
            "--pretty" => args.pretty = true,
            "--max-ticks" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.max_ticks = Some(n.parse::<u64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--every" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.every = n.parse::<u64>().map_err(|_| CliError::Usage(usage()))?;
                if args.every == 0 {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--pin" => {
                let Some(raw) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.pins
                    .push(parse_pin(raw).ok_or(CliError::Usage(usage()))?);
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => args.input = Some("-".to_string()),
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn build_simulation(doc: &Document, pins: &[(String, f64, f64)]) -> Result<Simulation, CliError> {
    let config = match doc.config.clone() {
        Some(value) => SimulationConfig::from_value(value)?,
        None => SimulationConfig::default(),
    };
    let mut sim = Simulation::new(&doc.graph, config)?;
    for (id, x, y) in pins {
        sim.pin(id, *x, *y)?;
    }
    Ok(sim)
}

fn tick_limit(sim: &Simulation, max_ticks: Option<u64>) -> u64 {
    max_ticks.unwrap_or_else(|| {
        sim.config()
            .cooling_ticks()
            .min(lineage_force::MAX_HEADLESS_TICKS)
    })
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let doc: Document = serde_json::from_str(&text)?;

    match args.command {
        Command::Validate => {
            doc.graph.validate()?;
            println!("ok");
            Ok(())
        }
        Command::Layout => {
            let mut sim = build_simulation(&doc, &args.pins)?;
            let limit = tick_limit(&sim, args.max_ticks);
            let ticks = sim.run(limit);
            tracing::info!(ticks, alpha = sim.alpha(), "layout complete");
            let state = match sim.state() {
                RunState::Idle => "idle",
                RunState::Running => "running",
                RunState::Stopped => "stopped",
            };
            write_json(
                &LayoutOut {
                    ticks,
                    alpha: sim.alpha(),
                    state,
                    nodes: sim.nodes(),
                },
                args.pretty,
            )
        }
        Command::Frames => {
            let mut sim = build_simulation(&doc, &args.pins)?;
            let limit = tick_limit(&sim, args.max_ticks);
            let every = args.every;
            let failure: Rc<RefCell<Option<CliError>>> = Rc::new(RefCell::new(None));
            {
                let failure = failure.clone();
                sim.observe(move |event| {
                    let frame = match *event {
                        SimulationEvent::Tick { step, alpha, nodes } => {
                            if step % every != 0 {
                                return;
                            }
                            FrameOut::Tick { step, alpha, nodes }
                        }
                        SimulationEvent::Stopped {
                            step,
                            alpha,
                            reason,
                        } => FrameOut::Stopped {
                            step,
                            alpha,
                            reason: match reason {
                                StopReason::Converged => "converged",
                                StopReason::Requested => "requested",
                            },
                        },
                    };
                    if failure.borrow().is_some() {
                        return;
                    }
                    if let Err(err) = write_json(&frame, false) {
                        *failure.borrow_mut() = Some(err);
                    }
                });
            }
            sim.run(limit);
            if sim.state() == RunState::Running {
                sim.stop();
            }
            match failure.borrow_mut().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
