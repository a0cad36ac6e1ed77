//! Verify a media file against the analysis backend
//!
//! Usage: `cargo run --example verify_file -- <path> [backend-url]`

use anyhow::Context;
use deepcheck::{init_logging, AnalysisService, DataUri, DeepCheck, GlobalConfig, ResultView};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: verify_file <path> [backend-url]")?;

    let mut config = GlobalConfig::from_env()?;
    if let Some(url) = args.next() {
        config.api_base_url = url;
    }
    init_logging(config.debug_logging);

    let deepcheck = DeepCheck::init_with(config)?;
    let media = DataUri::from_file(&path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    println!("📤 Uploading {path} ({}, {} bytes)", media.mime(), media.len());

    let result = deepcheck.client().verify_media(&media).await?;
    let view = ResultView::from_result(&result);
    println!("{} {} ({})", view.icon, view.label_text, view.confidence_text);
    for line in &view.details {
        println!("   {line}");
    }
    Ok(())
}
