//! Tutorkit CLI - inspect and maintain saved tutorial progress.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tutorkit_core::{TutorialConfig, TutorialId};
use tutorkit_session::{TutorialCatalog, TutorialSession};
use tutorkit_storage::JsonStorage;
use tutorkit_validation::ValidationEngine;

#[derive(Parser)]
#[command(name = "tutorkit")]
#[command(about = "Guided tutorial progress and statistics", long_about = None)]
struct Cli {
    /// Directory holding the saved records
    #[arg(long, default_value = ".tutorkit")]
    data_dir: PathBuf,

    /// Tutorial content file
    #[arg(long)]
    content: Option<PathBuf>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the saved progress
    Status,
    /// List the tutorials that can be started
    Tutorials,
    /// Show statistics
    Stats {
        /// Per-step breakdown of one tutorial
        #[arg(long)]
        tutorial: Option<String>,
    },
    /// Estimate the time left in a tutorial
    Estimate {
        /// Tutorial ID
        id: String,
        /// Step to count from
        #[arg(long, default_value = "0")]
        from: usize,
    },
    /// Delete saved records (both when no flag is given)
    Reset {
        /// Delete progress
        #[arg(long)]
        progress: bool,
        /// Delete statistics
        #[arg(long)]
        stats: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            TutorialConfig::from_json_str(&json)?
        }
        None => TutorialConfig::default(),
    };

    let catalog = match &cli.content {
        Some(path) => TutorialCatalog::from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => TutorialCatalog::new(),
    };

    let storage = JsonStorage::new(&cli.data_dir).await?;
    tracing::debug!(
        data_dir = %cli.data_dir.display(),
        tutorials = catalog.len(),
        "opened tutorial data"
    );
    let mut session = TutorialSession::new(storage, catalog, config, ValidationEngine::disconnected());
    session.load().await;

    match cli.command {
        Commands::Status => {
            let progress = session.progress().progress();

            println!("Tutorkit Status");
            println!("  Completed: {}", progress.completed_tutorials.len());
            for id in &progress.completed_tutorials {
                println!("    {}", id);
            }
            match &progress.current_tutorial_id {
                Some(id) => {
                    println!(
                        "  Current: {} (step {}{})",
                        id,
                        progress.current_step + 1,
                        if progress.paused { ", paused" } else { "" }
                    );
                    if let Some(remaining) = session.estimated_time_remaining() {
                        println!("  Time remaining: {}", format_ms(remaining));
                    }
                }
                None => println!("  Current: none"),
            }
            if !progress.skipped_steps.is_empty() {
                let skipped: Vec<_> = progress.skipped_steps.iter().map(|s| s.as_str()).collect();
                println!("  Skipped steps: {}", skipped.join(", "));
            }
        }
        Commands::Tutorials => {
            let available = session.available_tutorials();

            println!("Tutorials ({})", available.len());
            for t in available {
                println!(
                    "  {} {} | {:?} | {} steps | ~{} - {}",
                    if t.completed { "[x]" } else { "[ ]" },
                    t.id,
                    t.difficulty,
                    t.step_count,
                    format_ms(t.estimated_time),
                    t.title,
                );
            }
        }
        Commands::Stats { tutorial: Some(id) } => {
            let id = TutorialId::new(id);
            let steps = session.step_statistics(&id)?;

            println!("Steps of {} ({:.1}% complete)", id, session.completion_rate(&id)?);
            for s in steps {
                println!(
                    "  {} | attempts {} | failures {} | skips {} | success {:.1}% | avg {}",
                    s.step_id,
                    s.attempts,
                    s.failure_count,
                    s.skip_count,
                    s.success_rate,
                    s.average_time.map(|ms| format_ms(ms.round() as u64)).unwrap_or_else(|| "-".into()),
                );
            }
        }
        Commands::Stats { tutorial: None } => {
            let stats = session.statistics();

            println!("Tutorial Statistics");
            println!(
                "  Completed: {}/{} ({:.1}%)",
                stats.completed_tutorials, stats.total_tutorials, stats.completion_rate
            );
            if let (Some(id), Some(rate)) = (&stats.current_tutorial, stats.current_tutorial_progress) {
                println!("  Current: {} ({:.1}%)", id, rate);
            }
            println!("  Time spent: {}", format_ms(stats.total_time_spent));
            for (id, attempts) in &stats.tutorial_attempts {
                println!(
                    "  {} | started {} | completed {} | skipped {} | failed {}",
                    id, attempts.start, attempts.complete, attempts.skip, attempts.fail
                );
            }
        }
        Commands::Estimate { id, from } => {
            let id = TutorialId::new(id);
            let remaining = session.estimate_from(&id, from)?;
            println!("{} from step {}: {}", id, from + 1, format_ms(remaining));
        }
        Commands::Reset { progress, stats } => {
            let both = !progress && !stats;
            if progress || both {
                session.reset_progress().await;
                println!("Progress reset");
            }
            if stats || both {
                session.reset_stats().await;
                println!("Statistics reset");
            }
        }
    }

    Ok(())
}

fn format_ms(ms: u64) -> String {
    let secs = ms / 1000;
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
