use std::sync::Arc;

use ai_client::OpenRouter;
use anyhow::Result;
use clap::{Parser, Subcommand};
use sheets_client::SheetsClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vibecode_factory::approval::{AutoApprove, CostApproval, TerminalApproval};
use vibecode_factory::{
    inspect, BatchOrchestrator, ConfigArgs, CsvStore, FactoryConfig, GenerationClient,
    PromptTemplate, RowStore, SheetsStore, StoreLocation,
};

const APP_NAME: &str = "Vibecode Content Factory";

#[derive(Parser)]
#[command(name = "vibecode-factory")]
#[command(about = "Generate short-form video copy for every unprocessed transcript")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate content for pending rows (default)
    Run,
    /// Show row counts, output columns and the cost estimate without generating
    Inspect,
}

fn open_store(location: &StoreLocation) -> Arc<dyn RowStore> {
    match location {
        StoreLocation::Sheet {
            spreadsheet_id,
            worksheet,
            access_token,
        } => Arc::new(SheetsStore::new(
            SheetsClient::new(access_token.clone()),
            spreadsheet_id.as_str(),
            worksheet.as_str(),
        )),
        StoreLocation::Csv { path } => Arc::new(CsvStore::new(path.clone())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("vibecode_factory=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = FactoryConfig::try_from(cli.config)?;
    config.log_redacted();

    let template = match &config.prompt_file {
        Some(path) => PromptTemplate::from_file(path)?,
        None => PromptTemplate::default(),
    };
    let store = open_store(&config.store);

    match cli.command.unwrap_or(Command::Run) {
        Command::Inspect => {
            let report = inspect(store.as_ref(), &template, &config.run_settings()).await?;
            info!(
                total = report.total,
                processed = report.processed,
                pending = report.pending,
                invalid = report.invalid,
                outputs = ?report.populated_outputs,
                "Inspection complete"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Run => {
            let generator = OpenRouter::new(config.require_api_key()?, config.model.as_str())
                .with_app_name(APP_NAME);
            let client = GenerationClient::new(generator)
                .with_template(template)
                .with_retry(config.retry_policy())
                .with_timeout(config.timeout);

            let approval: Arc<dyn CostApproval> = if config.skip_approval {
                Arc::new(AutoApprove)
            } else {
                Arc::new(TerminalApproval)
            };

            let orchestrator = BatchOrchestrator::new(store, client, config.run_settings())
                .with_approval(approval);
            let report = orchestrator.run().await?;

            if report.declined {
                println!(
                    "Declined: estimated ${:.2} for {} row(s). Nothing was generated.",
                    report.estimate.cost_usd, report.estimate.rows
                );
            } else {
                println!(
                    "Processed: {}  Skipped: {}  Failed: {}",
                    report.processed, report.skipped, report.failed
                );
                for failure in &report.failures {
                    println!(
                        "  row {} ({}): {}",
                        failure.index, failure.title, failure.reason
                    );
                }
            }
        }
    }

    Ok(())
}
