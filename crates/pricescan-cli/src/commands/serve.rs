//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pricescan_web::{ServerConfig, DEFAULT_ALLOWED_ORIGINS};
use std::path::PathBuf;

use super::VisionArgs;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Comma-separated CORS allow-list ("*" allows any origin)
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_ALLOWED_ORIGINS.map(String::from)
    )]
    pub allowed_origins: Vec<String>,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file used with --log
    #[arg(long, default_value = "pricescan.log")]
    pub log_file: PathBuf,

    #[command(flatten)]
    pub vision: VisionArgs,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let analyzer = args.vision.build_analyzer();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        allowed_origins: args.allowed_origins,
    };

    println!();
    println!("  {} {}", "Price Scanner".cyan().bold(), "Gateway".bold());
    println!();
    println!("  {}     http://{}:{}", "Info".green(), config.host, config.port);
    println!("  {}   http://{}:{}/api/health", "Health".green(), config.host, config.port);
    println!("  {}  http://{}:{}/api/analyze", "Analyze".green(), config.host, config.port);
    println!();
    println!("  {}    {} ({})", "Model".green(), args.vision.model, args.vision.policy);
    if !analyzer.is_configured() {
        println!("  {}", "OPENAI_API_KEY is not set; analysis requests will fail".yellow());
    }
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    pricescan_web::run_server(config, analyzer).await?;

    Ok(())
}
