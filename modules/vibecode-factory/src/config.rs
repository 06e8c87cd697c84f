use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::info;

use crate::error::FactoryError;
use crate::orchestrator::RunSettings;
use crate::pacing::PacingPolicy;
use crate::retry::RetryPolicy;

pub const DEFAULT_MODEL: &str = "anthropic/claude-3-sonnet-20240229";

/// Command-line and environment settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Google spreadsheet id
    #[arg(long, env = "GOOGLE_SHEET_ID")]
    pub sheet_id: Option<String>,

    /// Worksheet (tab) name
    #[arg(long, env = "WORKSHEET_NAME", default_value = "Sheet1")]
    pub worksheet: String,

    /// OAuth2 access token for the Sheets API
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub google_token: Option<String>,

    /// Read and write a local CSV file instead of a spreadsheet. Takes precedence over --sheet-id
    #[arg(long)]
    pub csv: Option<PathBuf>,

    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_key: Option<String>,

    #[arg(long, env = "OPENROUTER_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Rows per batch
    #[arg(long, default_value_t = 3)]
    pub batch_size: usize,

    /// Pause between rows inside a batch
    #[arg(long, default_value_t = 1000)]
    pub call_delay_ms: u64,

    /// Pause between batches
    #[arg(long, default_value_t = 5000)]
    pub batch_delay_ms: u64,

    /// Per-request timeout
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Attempts per row, including the first
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// First retry backoff; doubles on each further retry
    #[arg(long, default_value_t = 2000)]
    pub retry_base_ms: u64,

    /// Ask before runs estimated above this many dollars
    #[arg(long, default_value_t = 5.0)]
    pub cost_threshold: f64,

    /// Skip the cost confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Prompt template file (system text, then `=== USER ===`, then the user text)
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Sheet {
        spreadsheet_id: String,
        worksheet: String,
        access_token: String,
    },
    Csv {
        path: PathBuf,
    },
}

/// Settings for one invocation. Built once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct FactoryConfig {
    pub store: StoreLocation,
    pub openrouter_api_key: Option<String>,
    pub model: String,
    pub batch_size: usize,
    pub call_delay: Duration,
    pub batch_delay: Duration,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_base: Duration,
    pub cost_threshold: f64,
    pub skip_approval: bool,
    pub prompt_file: Option<PathBuf>,
}

impl TryFrom<ConfigArgs> for FactoryConfig {
    type Error = FactoryError;

    fn try_from(args: ConfigArgs) -> Result<Self, Self::Error> {
        let store = match (args.csv, args.sheet_id) {
            (Some(path), _) => StoreLocation::Csv { path },
            (None, Some(spreadsheet_id)) => {
                let access_token = args.google_token.filter(|t| !t.trim().is_empty()).ok_or_else(
                    || FactoryError::Config("GOOGLE_ACCESS_TOKEN is required with --sheet-id".into()),
                )?;
                StoreLocation::Sheet {
                    spreadsheet_id,
                    worksheet: args.worksheet,
                    access_token,
                }
            }
            (None, None) => {
                return Err(FactoryError::Config(
                    "no store given: pass --sheet-id (or GOOGLE_SHEET_ID) or --csv".into(),
                ))
            }
        };

        let config = Self {
            store,
            openrouter_api_key: args.openrouter_key.filter(|k| !k.trim().is_empty()),
            model: args.model,
            batch_size: args.batch_size,
            call_delay: Duration::from_millis(args.call_delay_ms),
            batch_delay: Duration::from_millis(args.batch_delay_ms),
            timeout: Duration::from_secs(args.timeout_secs),
            max_attempts: args.max_attempts,
            retry_base: Duration::from_millis(args.retry_base_ms),
            cost_threshold: args.cost_threshold,
            skip_approval: args.yes,
            prompt_file: args.prompt_file,
        };
        config.validate()?;
        Ok(config)
    }
}

impl FactoryConfig {
    pub fn validate(&self) -> Result<(), FactoryError> {
        if self.batch_size == 0 {
            return Err(FactoryError::Config("batch size must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(FactoryError::Config("max attempts must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(FactoryError::Config("timeout must be positive".into()));
        }
        if !self.cost_threshold.is_finite() || self.cost_threshold < 0.0 {
            return Err(FactoryError::Config(
                "cost threshold must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// The OpenRouter key, required for anything that generates.
    pub fn require_api_key(&self) -> Result<&str, FactoryError> {
        self.openrouter_api_key
            .as_deref()
            .ok_or_else(|| FactoryError::Config("OPENROUTER_API_KEY is required".into()))
    }

    pub fn pacing(&self) -> PacingPolicy {
        PacingPolicy {
            batch_size: self.batch_size,
            call_delay: self.call_delay,
            batch_delay: self.batch_delay,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.retry_base,
            ..RetryPolicy::default()
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings::builder()
            .pacing(self.pacing())
            .cost_threshold(self.cost_threshold)
            .build()
    }

    /// Log config values with secrets masked.
    pub fn log_redacted(&self) {
        match &self.store {
            StoreLocation::Sheet {
                spreadsheet_id,
                worksheet,
                access_token,
            } => info!(
                spreadsheet_id = spreadsheet_id.as_str(),
                worksheet = worksheet.as_str(),
                access_token = redact(access_token).as_str(),
                "Store: Google Sheets"
            ),
            StoreLocation::Csv { path } => info!(path = %path.display(), "Store: CSV file"),
        }
        info!(
            model = self.model.as_str(),
            openrouter_key = self
                .openrouter_api_key
                .as_deref()
                .map(redact)
                .unwrap_or_else(|| "(unset)".into())
                .as_str(),
            batch_size = self.batch_size,
            call_delay_ms = self.call_delay.as_millis() as u64,
            batch_delay_ms = self.batch_delay.as_millis() as u64,
            timeout_secs = self.timeout.as_secs(),
            max_attempts = self.max_attempts,
            cost_threshold = self.cost_threshold,
            "Config loaded"
        );
    }
}

/// Keep the first and last four characters of long secrets.
fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
