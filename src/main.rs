//! # Stepcheck CLI (`stepcheck`)
//!
//! ## Usage
//!
//! ```bash
//! stepcheck --config ./config/stepcheck.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stepcheck init` | Create the SQLite database and run schema migrations |
//! | `stepcheck grade --answer <eq> --step <eq>...` | Grade a step-by-step solution |
//! | `stepcheck solve "<equation>"` | Solve an equation |
//! | `stepcheck parse "<line>"` | Show how a line is understood |
//! | `stepcheck report [<id>]` | Show a stored report, or list recent ones |
//! | `stepcheck serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Grade and keep the report
//! stepcheck grade --answer "x = 2" --step "2x + 3 = 7" --step "2x = 5" --step "x = 2" --save
//!
//! # Accept a step satisfied by at least one root
//! stepcheck grade --answer "x^2 = 4" --step "x = 2" --policy any
//!
//! # Steps from a file, one per line
//! stepcheck grade --answer "x = 2" --steps-file work.txt --json
//! ```
//!
//! Logs go to stderr and are controlled by `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use stepcheck::{config, grade, migrate, report, server};
use stepcheck_core::check::RootPolicy;

/// Stepcheck: checks step-by-step equation solutions and awards partial credit.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/stepcheck.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "stepcheck",
    about = "Stepcheck: find the first wrong step in a worked equation and score the work",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/stepcheck.toml`. When the file does not exist,
    /// built-in defaults are used and nothing is persisted.
    #[arg(long, global = true, default_value = "./config/stepcheck.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the report tables. Requires a
    /// `[db]` section. Running it more than once is safe.
    Init,

    /// Grade a step-by-step solution against the correct answer.
    Grade {
        /// The correct answer, as an equation (e.g. `x = 2`).
        #[arg(long)]
        answer: String,

        /// A student step; repeat for each step, in order.
        #[arg(long = "step")]
        steps: Vec<String>,

        /// Read further steps from a file, one per line.
        #[arg(long)]
        steps_file: Option<PathBuf>,

        /// Question text, echoed in the report.
        #[arg(long, default_value = "")]
        question: String,

        /// Multi-root policy: `all` or `any`. Overrides `[grading].root_policy`.
        #[arg(long)]
        policy: Option<RootPolicy>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Store the report in the database (requires `[db]`).
        #[arg(long)]
        save: bool,
    },

    /// Solve an equation and print its solution set.
    Solve {
        /// The equation, e.g. `x^2 - 5x + 6 = 0`.
        equation: String,

        /// Variable to solve for. Defaults to the first one that appears.
        #[arg(long)]
        var: Option<char>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the normalized form and parsed equation of one line.
    Parse {
        /// The line to parse.
        line: String,
    },

    /// Show a stored report, or list the most recent ones.
    Report {
        /// Report id. Omit to list recent reports.
        id: Option<String>,

        /// Number of reports to list.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stepcheck=info,stepcheck_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let db_config = cfg.require_db("init")?;
            migrate::run_migrations(db_config).await?;
            println!("Database initialized successfully.");
        }
        Commands::Grade {
            answer,
            steps,
            steps_file,
            question,
            policy,
            json,
            save,
        } => {
            let args = grade::GradeArgs {
                question,
                answer,
                steps,
                steps_file,
                policy,
                json,
                save,
            };
            grade::run_grade(&cfg, args).await?;
        }
        Commands::Solve {
            equation,
            var,
            json,
        } => {
            grade::run_solve(&cfg, &equation, var, json)?;
        }
        Commands::Parse { line } => {
            grade::run_parse(&cfg, &line)?;
        }
        Commands::Report { id, limit, json } => match id {
            Some(id) => report::run_report(&cfg, &id, json).await?,
            None => report::run_recent(&cfg, limit, json).await?,
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
