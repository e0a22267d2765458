use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

// CLI argument structure, every flag can also come from the environment (or .env)
#[derive(Parser, Debug, Clone)]
#[command(name = "dork-gateway")]
#[command(about = "Rate limited backend that turns an intent into a single search dork")]
pub struct Args {
    // Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    // SQLite file holding the query counter and visitor set
    #[arg(long, env = "DB_PATH", default_value = "./stats.db")]
    pub db_path: PathBuf,

    // Model service credential. Missing key only fails /generate, not startup
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_MODEL", default_value = "claude-3-5-sonnet-20241022")]
    pub anthropic_model: String,

    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = "https://api.anthropic.com")]
    pub anthropic_base_url: String,

    // Upper bound on a single model call, in seconds
    #[arg(long, env = "MODEL_TIMEOUT_SECONDS", default_value_t = 30)]
    pub model_timeout: u64,

    // Rate limit window for /generate in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECONDS", default_value_t = 60)]
    pub rate_window: u64,

    // Rate limit max requests per window for /generate
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 30)]
    pub rate_limit: usize,

    // Rate limit window for /visit, defaults to the /generate window
    #[arg(long, env = "RATE_LIMIT_VISIT_WINDOW_SECONDS")]
    pub visit_rate_window: Option<u64>,

    // Rate limit max requests per window for /visit
    #[arg(long, env = "RATE_LIMIT_VISIT_MAX_REQUESTS", default_value_t = 120)]
    pub visit_rate_limit: usize,

    // How often idle rate limit buckets are dropped
    #[arg(long, env = "RATE_LIMIT_SWEEP_SECONDS", default_value_t = 300)]
    pub sweep_interval: u64,
}

impl Args {
    pub fn generate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn visit_window(&self) -> Duration {
        Duration::from_secs(self.visit_rate_window.unwrap_or(self.rate_window))
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
