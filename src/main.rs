use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use countysales::{
    config::PipelineConfig,
    pipeline,
    report::{self, View},
    store::OutputLayout,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "countysales", about = "Clean and report on county vehicle sales")]
struct Cli {
    /// YAML config file; CLI flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for tables, views and reports
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest, clean, and write every view and report
    Run {
        /// Input CSV path or glob pattern
        #[arg(long)]
        input: Option<String>,
        /// N for the top-N report
        #[arg(long, allow_hyphen_values = true)]
        top_n: Option<String>,
    },
    /// Top-N counties from the persisted cleaned table
    Top {
        #[arg(long, short, allow_hyphen_values = true)]
        n: String,
    },
    /// Evaluate a named view against the persisted cleaned table
    View { name: String },
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) resolve config ───────────────────────────────────────────
    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(out_dir) = cli.out_dir {
        cfg.out_dir = out_dir;
    }
    let layout = OutputLayout::new(&cfg.out_dir);

    // ─── 3) dispatch ─────────────────────────────────────────────────
    match cli.command {
        Command::Run { input, top_n } => {
            if let Some(input) = input {
                cfg.input = input;
            }
            if let Some(n) = top_n {
                cfg.top_n = report::parse_top_n(&n)?;
            }
            let summary = pipeline::run(&cfg)?;
            println!("{}", serde_json::to_string_pretty(&summary.reports.summary)?);
            info!(out_dir = %summary.layout.root().display(), "all done");
        }
        Command::Top { n } => {
            let n = report::parse_top_n(&n)?;
            let table = pipeline::load_cleaned(&layout)?;
            let top = report::top_n(&table, n)?;
            println!("{}", serde_json::to_string_pretty(&top)?);
        }
        Command::View { name } => {
            let view: View = name.parse()?;
            let table = pipeline::load_cleaned(&layout)?;
            let rows = view.evaluate(&table);
            println!(
                "{}",
                serde_json::to_string_pretty(&rows)
                    .with_context(|| format!("serializing view {}", view))?
            );
        }
    }
    Ok(())
}
