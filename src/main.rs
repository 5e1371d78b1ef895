use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use linefish::cache::HttpLineCache;
use linefish::fish::{combinatorics, export, import, Fisher, RunOutcome, SearchConfig, SearchState};
use linefish::oracle::{MaterialOracle, Oracle, UciOracle};

#[derive(Parser, Debug)]
#[command(name = "linefish", version, about = "Explore an opening as a bounded tree of engine-chosen lines")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a fresh run
    Run {
        #[command(flatten)]
        search: SearchArgs,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Continue a run from an exported state
    Resume {
        file: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Validate an exported state and print its summary
    Inspect { file: PathBuf },
    /// Print how large a run could get
    Count {
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// JSON search configuration; the flags below are ignored when given
    #[arg(long)]
    config: Option<PathBuf>,
    /// Root position (defaults to the start position)
    #[arg(long)]
    fen: Option<String>,
    #[arg(long, default_value_t = 3)]
    max_ply: usize,
    /// Responder fan-out per depth, e.g. 3,2
    #[arg(long, value_delimiter = ',')]
    fanout: Vec<usize>,
    #[arg(long, default_value_t = 2)]
    default_fanout: usize,
    /// Forced initiator moves per depth, empty entries ask the engine: e4,,Nf3
    #[arg(long)]
    forced: Option<String>,
    #[arg(long, default_value_t = 1)]
    threads: usize,
    #[arg(long, default_value_t = 18)]
    depth: u32,
    /// Black is the initiator
    #[arg(long)]
    black_initiator: bool,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// UCI engine binary, or `builtin` for the material oracle
    #[arg(long, default_value = "builtin")]
    engine: String,
    /// Base URL of a line cache service
    #[arg(long)]
    cache_url: Option<String>,
    /// Where to export the state when the run ends or stops
    #[arg(long)]
    out: Option<PathBuf>,
    /// Stop after this many steps (the exported state can be resumed)
    #[arg(long)]
    max_steps: Option<u64>,
}

impl SearchArgs {
    fn to_config(&self) -> Result<SearchConfig> {
        if let Some(path) = &self.config {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            return serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()));
        }
        let mut config = SearchConfig {
            max_ply: self.max_ply,
            responder_fanout: self.fanout.clone(),
            default_fanout: self.default_fanout,
            threads: self.threads,
            search_depth: self.depth,
            initiator_is_first_side: !self.black_initiator,
            ..SearchConfig::default()
        };
        if let Some(fen) = &self.fen {
            config.root_position = fen.clone();
        }
        if let Some(forced) = &self.forced {
            config.initiator_forced_moves = forced
                .split(',')
                .map(|m| Some(m.trim().to_string()).filter(|m| !m.is_empty()))
                .collect();
        }
        Ok(config)
    }
}

fn open_oracle(engine: &str) -> Result<Box<dyn Oracle>> {
    if engine == "builtin" {
        return Ok(Box::new(MaterialOracle::new()));
    }
    let oracle = UciOracle::spawn(engine).with_context(|| format!("starting engine {engine}"))?;
    Ok(Box::new(oracle))
}

fn fisher_for(args: &EngineArgs) -> Result<Fisher<Box<dyn Oracle>>> {
    let mut fisher = Fisher::new(open_oracle(&args.engine)?);
    if let Some(url) = &args.cache_url {
        let cache = HttpLineCache::new(url).with_context(|| format!("line cache at {url}"))?;
        fisher = fisher.with_cache(Box::new(cache));
    }
    Ok(fisher)
}

fn load(path: &Path) -> Result<SearchState> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match import(&text).into_result() {
        Ok(state) => Ok(state),
        Err(reasons) => bail!("{} is not a usable state:\n  {}", path.display(), reasons.join("\n  ")),
    }
}

fn save(state: &SearchState, path: &Path) -> Result<()> {
    let json = export(state).context("serializing state")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn print_summary(state: &SearchState) -> Result<()> {
    let doc = linefish::fish::export::document(state);
    println!(
        "{} queued, {} done, {} full (at most {} records, {} lines)",
        doc.summary.wip, doc.summary.done, doc.summary.full, doc.summary.total_nodes, doc.summary.total_lines
    );
    for line in &doc.summary.lines {
        println!("  {line}");
    }
    Ok(())
}

fn drive(mut fisher: Fisher<Box<dyn Oracle>>, mut state: SearchState, args: &EngineArgs) -> Result<()> {
    let pb = ProgressBar::new(combinatorics::total_nodes(&state.config));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_position(state.done.len() as u64);

    let stop = fisher.stop_handle();
    let mut steps = 0u64;
    let outcome = fisher.run(&mut state, |p| {
        steps += 1;
        pb.set_position(p.done as u64);
        if let Some(line) = &p.current {
            pb.set_message(format!("{} queued | {}", p.wip, line.moves.join(" ")));
        }
        if args.max_steps.is_some_and(|max| steps >= max) {
            stop.cancel();
        }
    });
    let outcome = match outcome {
        Ok(o) => o,
        Err(e) => {
            pb.abandon_with_message("failed");
            if let Some(out) = &args.out {
                save(&state, out)?;
            }
            return Err(e).context("line fishing failed");
        }
    };
    match outcome {
        RunOutcome::Finished => pb.finish_with_message("done"),
        RunOutcome::Stopped => pb.abandon_with_message(format!("stopped after {steps} steps")),
    }
    print_summary(&state)?;
    if let Some(out) = &args.out {
        save(&state, out)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run { search, engine } => {
            let config = search.to_config()?;
            let mut fisher = fisher_for(&engine)?;
            let state = fisher.seed(config).context("seeding the search")?;
            drive(fisher, state, &engine)
        }
        Command::Resume { file, engine } => {
            let state = load(&file)?;
            let fisher = fisher_for(&engine)?;
            drive(fisher, state, &engine)
        }
        Command::Inspect { file } => print_summary(&load(&file)?),
        Command::Count { search } => {
            let config = search.to_config()?;
            println!("records per depth: {:?}", combinatorics::lines_per_depth(&config));
            println!("total records:     {}", combinatorics::total_nodes(&config));
            println!("full lines:        {}", combinatorics::total_lines(&config));
            println!("oracle half-moves: {}", combinatorics::total_half_moves(&config));
            Ok(())
        }
    }
}
