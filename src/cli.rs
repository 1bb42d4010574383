use clap::{Parser, Subcommand};
use std::net::SocketAddr;

/// Suggest recipes for whatever is left in the fridge.
///
/// Every global option can also come from the environment (or a `.env` file).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Chat provider: "openrouter" or "fake"
    #[arg(long, env = "FRIDGE_FEAST_PROVIDER", default_value = "openrouter")]
    pub provider: String,

    /// Name of the environment variable holding the API key
    #[arg(long, env = "FRIDGE_FEAST_API_KEY_VAR", default_value = "OPENROUTER_API_KEY")]
    pub api_key_env_var: String,

    /// Model identifier sent with every request
    #[arg(long, env = "FRIDGE_FEAST_MODEL", default_value = "qwen/qwen3-32b")]
    pub model: String,

    /// Chat completions endpoint
    #[arg(
        long,
        env = "FRIDGE_FEAST_BASE_URL",
        default_value = "https://openrouter.ai/api/v1/chat/completions"
    )]
    pub base_url: String,

    #[arg(long, env = "FRIDGE_FEAST_TEMPERATURE")]
    pub temperature: Option<f32>,

    #[arg(long, env = "FRIDGE_FEAST_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    /// Per-request timeout in seconds; unset waits indefinitely
    #[arg(long, env = "FRIDGE_FEAST_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the single-page web UI
    Serve {
        #[arg(long, env = "FRIDGE_FEAST_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Generate and rank recipes once, printing the result
    Suggest {
        /// Comma-separated ingredients, e.g. "chicken, rice, broccoli"
        #[arg(short, long)]
        ingredients: String,
        /// Dietary restriction (repeatable)
        #[arg(long = "diet")]
        dietary_restrictions: Vec<String>,
        /// Cuisine preference (repeatable)
        #[arg(long = "cuisine")]
        cuisine_preferences: Vec<String>,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
