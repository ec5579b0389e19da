//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pricescan_core::analysis::vision::{OpenAiVisionClient, VisionModel, DEFAULT_API_BASE, DEFAULT_MODEL};
use pricescan_core::analysis::DEFAULT_MAX_IMAGE_BYTES;
use pricescan_core::{Analyzer, ResponsePolicy};
use std::sync::Arc;
use std::time::Duration;

pub mod scan;
pub mod serve;

/// Price Scanner - estimate the price of anything in a photo
#[derive(Parser)]
#[command(name = "pricescan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve(serve::ServeArgs),

    /// Analyze a local image file and print the estimate
    Scan(scan::ScanArgs),
}

/// Vision model settings shared by every command.
#[derive(Args)]
pub struct VisionArgs {
    /// API key for the vision model
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Vision model to use
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// How model replies are shaped: schema or legacy
    #[arg(long, env = "RESPONSE_POLICY", default_value = "schema")]
    pub policy: ResponsePolicy,

    /// Largest accepted image, in bytes
    #[arg(long, env = "MAX_IMAGE_BYTES", default_value_t = DEFAULT_MAX_IMAGE_BYTES)]
    pub max_image_bytes: usize,

    /// Timeout for the vision API call (client default when unset)
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,
}

impl VisionArgs {
    /// Build the analyzer. A blank key counts as no key.
    pub fn build_analyzer(&self) -> Analyzer {
        let model = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| {
                let timeout = self.request_timeout_secs.map(Duration::from_secs);
                Arc::new(OpenAiVisionClient::new(key, &self.api_base, &self.model, timeout))
                    as Arc<dyn VisionModel>
            });

        Analyzer::new(model, self.policy)
            .with_model_id(&self.model)
            .with_max_image_bytes(self.max_image_bytes)
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::execute(args).await,
            Commands::Scan(args) => scan::execute(args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["pricescan", "serve", "--api-key", "sk-test"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.vision.model, DEFAULT_MODEL);
        assert_eq!(args.vision.policy, ResponsePolicy::Schema);
        assert_eq!(args.vision.max_image_bytes, DEFAULT_MAX_IMAGE_BYTES);

        let analyzer = args.vision.build_analyzer();
        assert!(analyzer.is_configured());
        assert_eq!(analyzer.model_id(), DEFAULT_MODEL);
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let cli = Cli::try_parse_from(["pricescan", "scan", "photo.jpg", "--api-key", "  ", "--policy", "legacy"]).unwrap();
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        let analyzer = args.vision.build_analyzer();
        assert!(!analyzer.is_configured());
        assert_eq!(analyzer.policy(), ResponsePolicy::Legacy);
        assert_eq!(analyzer.model_id(), DEFAULT_MODEL);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(Cli::try_parse_from(["pricescan", "serve", "--policy", "yaml"]).is_err());
    }
}
