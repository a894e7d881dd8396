use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use action_executor::ActionExecutor;
use anyhow::Context;
use clap::{Parser, Subcommand};
use field_resolver::DefaultFieldResolver;
use session_flow::{SessionOrchestrator, SessionSettings, TracingProgress};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use formpilot_cli::attachments::StaticAttachments;
use formpilot_cli::config::AppConfig;
use formpilot_cli::panel;
use formpilot_cli::planner::FilePlanner;

#[derive(Parser)]
#[command(name = "formpilot", about = "Form inventory and action execution engine")]
struct Cli {
    /// Extra configuration file (defaults and formpilot.toml still apply).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inventory a page fixture and print what was found.
    Detect {
        /// Page fixture document (JSON).
        #[arg(long)]
        page: PathBuf,
        /// Emit the raw snapshot as JSON instead of a panel.
        #[arg(long)]
        json: bool,
    },
    /// Execute a plan against a page fixture.
    Run {
        #[arg(long)]
        page: PathBuf,
        /// Plan document (JSON) to execute.
        #[arg(long)]
        plan: PathBuf,
        /// Resume file bound by upload actions.
        #[arg(long)]
        resume: Option<PathBuf>,
        /// Permit clicking the submit control when the plan asks for it.
        #[arg(long)]
        allow_submit: bool,
        /// Stop after inventory.
        #[arg(long)]
        detect_only: bool,
        /// Only act on fields marked required.
        #[arg(long)]
        required_only: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Detect { page, json } => {
            let dom = formpilot_cli::load_page(&page)?;
            let snapshot = form_inventory::InventoryBuilder::new(dom.as_ref())
                .scan()
                .await
                .context("scanning page")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", panel::render_snapshot(&snapshot));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            page,
            plan,
            resume,
            allow_submit,
            detect_only,
            required_only,
        } => {
            let dom = formpilot_cli::load_page(&page)?;
            let cancel = CancellationToken::new();
            let resolver = Arc::new(DefaultFieldResolver::new(dom.clone()));
            let executor = ActionExecutor::new(
                dom.clone(),
                resolver,
                Arc::new(StaticAttachments::new(resume)),
                config.tempo(cancel),
            );
            let orchestrator = SessionOrchestrator::new(
                dom,
                Arc::new(FilePlanner::new(plan)),
                Arc::new(TracingProgress),
                executor,
            );

            let outcome = orchestrator
                .run(SessionSettings {
                    detect_only,
                    prevent_submit: !allow_submit,
                    required_only,
                })
                .await
                .context("running session")?;

            print!("{}", panel::render_outcome(&outcome));
            Ok(if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
