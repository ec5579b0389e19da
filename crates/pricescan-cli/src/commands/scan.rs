//! One-off image analysis from the terminal.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pricescan_core::AnalysisRequest;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::VisionArgs;
use crate::output;

#[derive(Args)]
pub struct ScanArgs {
    /// Image file to analyze
    pub path: PathBuf,

    /// Question to ask about the image
    #[arg(short, long)]
    pub question: Option<String>,

    /// Print the raw JSON result
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub vision: VisionArgs,
}

pub async fn execute(args: ScanArgs) -> Result<()> {
    let analyzer = args.vision.build_analyzer();
    if !analyzer.is_configured() {
        anyhow::bail!(
            "OPENAI_API_KEY environment variable not set.\n\
             Set it with: export OPENAI_API_KEY=your-key"
        );
    }

    let bytes = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("Failed to read image file: {}", args.path.display()))?;
    debug!(path = %args.path.display(), size = bytes.len(), "Read image file");
    let request = AnalysisRequest::new(
        bytes,
        Some(media_type_for_path(&args.path)),
        args.question.clone(),
    );

    if !args.json {
        println!("{} Analyzing image: {}", "→".dimmed(), args.path.display());
    }
    let result = analyzer.analyze(request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        output::print_result(&result);
    }

    Ok(())
}

/// Guess the media type from the file extension.
fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}
