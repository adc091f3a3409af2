//! rtscore CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "rtscore",
    version,
    about = "Deterministic scoring for radio-telephony phraseology"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single evaluation request
    Score {
        /// Request JSON file, or "-" for stdin
        #[arg(long)]
        request: PathBuf,

        /// Output format: json, text
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score every recorded attempt in a drill set
    Run {
        /// Path to .toml drill set or directory
        #[arg(long)]
        drill_set: PathBuf,

        /// Filter by tags (comma-separated)
        #[arg(long)]
        filter: Option<String>,

        /// Directory to save session reports in
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Attach template feedback to each drill
        #[arg(long)]
        feedback: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two session reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Change in total score (points) that counts as significant
        #[arg(long, default_value = "5")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate drill-set TOML files
    Validate {
        /// Path to drill set file or directory
        #[arg(long)]
        drill_set: PathBuf,
    },

    /// Create starter config and example drill set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rtscore=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            request,
            format,
            config,
        } => commands::score::execute(request, format, config),
        Commands::Run {
            drill_set,
            filter,
            output,
            format,
            feedback,
            config,
        } => commands::run::execute(drill_set, filter, output, format, feedback, config).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { drill_set } => commands::validate::execute(drill_set),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
