//! joinguard CLI - run the scoped worker lessons.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use joinguard_core::Disposition;
use joinguard_lessons::{Lesson, LessonReport, LessonsConfig};
use joinguard_sync::Launch;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "joinguard")]
#[command(about = "Scoped worker threads: wait or detach, never abandon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file (missing fields use defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect multiples in a worker, optionally leaving early
    Filter {
        /// Upper bound of the scanned range
        #[arg(long)]
        max: Option<u64>,
        /// Keep values divisible by this
        #[arg(long)]
        step: Option<u64>,
        /// What to do with the collector on early exit (wait|detach)
        #[arg(long)]
        disposition: Option<Disposition>,
        /// Make the precondition check fail
        #[arg(long)]
        reject: bool,
    },
    /// Drop a detach-on-release worker and watch it finish on its own
    Detach {
        /// How long the worker runs
        #[arg(long)]
        work_ms: Option<u64>,
    },
    /// Hand a value and an event from a detecting to reacting threads
    Signal {
        /// Delay before publishing
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Launch a task and collect its result or panic
    Task {
        /// Make the task panic
        #[arg(long)]
        fail: bool,
        /// Run lazily on the caller thread
        #[arg(long)]
        deferred: bool,
    },
    /// Run every lesson
    All,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Reports go to stdout; keep logs on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => LessonsConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => LessonsConfig::default(),
    };
    debug!(?config, "Loaded configuration");

    let lessons = match cli.command {
        Commands::Filter { max, step, disposition, reject } => {
            if let Some(max) = max {
                config.filter.max = max;
            }
            if let Some(step) = step {
                config.filter.step = step;
            }
            if let Some(disposition) = disposition {
                config.filter.disposition = disposition;
            }
            if reject {
                config.filter.accept = false;
            }
            vec![Lesson::Filter]
        }
        Commands::Detach { work_ms } => {
            if let Some(work_ms) = work_ms {
                config.detach.work_ms = work_ms;
            }
            vec![Lesson::Detach]
        }
        Commands::Signal { delay_ms } => {
            if let Some(delay_ms) = delay_ms {
                config.signal.delay_ms = delay_ms;
            }
            vec![Lesson::Signal]
        }
        Commands::Task { fail, deferred } => {
            if fail {
                config.task.fail = true;
            }
            if deferred {
                config.task.launch = Launch::Deferred;
            }
            vec![Lesson::Task]
        }
        Commands::All => Lesson::ALL.to_vec(),
    };
    config.validate()?;

    let mut reports = Vec::with_capacity(lessons.len());
    for lesson in lessons {
        reports.push(lesson.run(&config)?);
    }
    info!("Completed {} lesson(s)", reports.len());

    print_reports(&reports, cli.json)
}

fn print_reports(reports: &[LessonReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        for report in reports {
            println!("{report}");
        }
    }
    Ok(())
}
