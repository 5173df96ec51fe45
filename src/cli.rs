use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use http_mutant::pipeline::{BatchSummary, Pipeline, mutate_jsonl};
use http_mutant::reporter::{MutantReporter, UsageReporter};
use http_mutant::strategy::{AllMutants, MutantStrategy, RandomPerGroup};
use http_mutant::writer::{JsonlMutantWriter, MutantWriter};
use http_mutant::{HttpMutatorEngine, Mode, MutationContext, MutatorConfig};

use crate::report::{catalog, format_catalog};
use crate::run_report::{GenerationReport, RunSettings};
use crate::ui::Ui;

const EXIT_ERROR: i32 = 1;

/// Top-level CLI arguments for the `http-mutant` binary.
#[derive(Debug, Parser)]
#[command(
    name = "http-mutant",
    version,
    about = "Mutation of HTTP responses for testing API clients"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Which mutants of each group are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Every generated mutant.
    All,
    /// One random mutant per group.
    RandomPerGroup,
}

impl StrategyKind {
    fn label(self) -> &'static str {
        match self {
            StrategyKind::All => "all",
            StrategyKind::RandomPerGroup => "random-per-group",
        }
    }
}

/// Arguments of `http-mutant mutate`.
#[derive(Debug, Args)]
pub struct MutateArgs {
    /// Input file, one response document per line.
    #[arg(long)]
    pub input: PathBuf,

    /// Directory receiving the mutant shards.
    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = Mode::Exhaustive)]
    pub mode: Mode,

    #[arg(long, value_enum, default_value_t = StrategyKind::All)]
    pub strategy: StrategyKind,

    /// Seed for every random draw of the run.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Mutator configuration (JSON).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum number of mutants per shard file.
    #[arg(long, default_value_t = 10_000)]
    pub shard_lines: usize,

    /// Shard file name prefix.
    #[arg(long, default_value = "mutants")]
    pub prefix: String,

    /// Emit a machine-readable JSON report to stdout.
    #[arg(long)]
    pub json: bool,
}

/// Subcommands supported by `http-mutant`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mutate every response of a JSONL file.
    Mutate(MutateArgs),

    /// Print the enabled mutators and their operator weights.
    Catalog {
        /// Mutator configuration (JSON).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit the catalog as JSON to stdout.
        #[arg(long)]
        json: bool,
    },
}

fn print_json_and_exit(report: GenerationReport, exit_code: i32) -> ! {
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize report: {e}"),
    }
    std::process::exit(exit_code);
}

fn load_config(path: Option<&Path>) -> Result<MutatorConfig> {
    let config = match path {
        Some(path) => MutatorConfig::from_path(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => MutatorConfig::default(),
    };
    config.validate().context("invalid mutator configuration")?;
    Ok(config)
}

/// Parse CLI arguments and dispatch the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Mutate(args) => {
            let mut ui = Ui::new(args.json);
            let settings = RunSettings {
                input: args.input.clone(),
                output: args.output.clone(),
                mode: args.mode,
                strategy: args.strategy.label(),
                seed: args.seed,
            };

            ui.title("http-mutant: mutate");
            ui.line(format!("input: {:?}", args.input));

            let (summary, usage, shards) = match mutate(&args) {
                Ok(done) => done,
                Err(e) => {
                    if args.json {
                        let report = GenerationReport::failure(settings, format!("{e:#}"));
                        print_json_and_exit(report, EXIT_ERROR);
                    }
                    ui.error(format!("mutation failed: {e:#}"));
                    return Err(e);
                }
            };

            for shard in &shards {
                ui.shard(shard);
            }
            ui.summary(&summary);

            if args.json {
                let report = GenerationReport::success(settings, summary, usage, shards);
                let text = serde_json::to_string_pretty(&report).context("serialize report")?;
                println!("{text}");
            }

            Ok(())
        }

        Command::Catalog { config, json } => {
            let config = load_config(config.as_deref())?;
            let engine = HttpMutatorEngine::new(&config).context("build mutators")?;
            let entries = catalog(&engine);

            if json {
                let text = serde_json::to_string_pretty(&entries).context("serialize catalog")?;
                println!("{text}");
            } else {
                let ui = Ui::new(false);
                ui.title("http-mutant: catalog");
                ui.line(format_catalog(&entries));
            }

            Ok(())
        }
    }
}

fn mutate(args: &MutateArgs) -> Result<(BatchSummary, UsageReporter, Vec<PathBuf>)> {
    let config = load_config(args.config.as_deref())?;
    let engine = HttpMutatorEngine::new(&config).context("build mutators")?;

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open input {:?}", args.input))?;
    let mut writer = JsonlMutantWriter::new(&args.output, args.prefix.as_str(), args.shard_lines)?;
    let mut usage = UsageReporter::default();
    let mut ctx = MutationContext::seeded(args.seed);

    let mut all = AllMutants;
    let mut random = RandomPerGroup::seeded(args.seed);
    let strategy: &mut dyn MutantStrategy = match args.strategy {
        StrategyKind::All => &mut all,
        StrategyKind::RandomPerGroup => &mut random,
    };

    let summary = mutate_jsonl(
        BufReader::new(file),
        &engine,
        args.mode,
        &mut ctx,
        Pipeline {
            strategy,
            writers: vec![&mut writer as &mut dyn MutantWriter],
            reporters: vec![&mut usage as &mut dyn MutantReporter],
        },
    )
    .with_context(|| format!("failed to mutate {:?}", args.input))?;

    Ok((summary, usage, writer.shards().to_vec()))
}
