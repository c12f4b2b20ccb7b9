use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{error, info};

use capvoice::cleanup::OpenAiCleaner;
use capvoice::ocr::GoogleVisionRecognizer;
use capvoice::subtitle::Wordlist;
use capvoice::tts::OpenAiSynthesizer;
use capvoice::{Pipeline, PipelineConfig};

const DEFAULT_WORDLIST: &str = "/usr/share/dict/words";

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(e) = run().await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let (Some(video), Some(output_dir)) = (args.next(), args.next()) else {
        bail!("usage: capvoice <video.mp4> <output_dir>");
    };
    let video = PathBuf::from(video);
    let output_dir = PathBuf::from(output_dir);

    let openai_api_key =
        env::var("OPENAI_API_KEY").context("OPENAI_API_KEY environment variable is not set")?;
    let google_api_key =
        env::var("GOOGLE_API_KEY").context("GOOGLE_API_KEY environment variable is not set")?;

    let wordlist_path = env::var("CAPVOICE_WORDLIST")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_WORDLIST));
    let wordlist = Wordlist::from_file(&wordlist_path)
        .with_context(|| format!("failed to load wordlist from {}", wordlist_path.display()))?;
    info!(
        "Loaded {} words from {}",
        wordlist.len(),
        wordlist_path.display()
    );

    let config = PipelineConfig::default();

    let recognizer = Arc::new(GoogleVisionRecognizer::new(google_api_key));
    let cleaner = Arc::new(OpenAiCleaner::new(
        openai_api_key.clone(),
        config.cleanup_model.clone(),
    ));
    let synthesizer = Arc::new(OpenAiSynthesizer::new(
        openai_api_key,
        config.tts_model.clone(),
        config.tts_voice.clone(),
    ));

    let pipeline = Pipeline::new(config, wordlist, recognizer, cleaner, synthesizer);
    let summary = pipeline
        .run(Path::new(&video), &output_dir)
        .await
        .context("pipeline run failed")?;

    info!(
        "Extracted {} captions, kept {} after cleaning",
        summary.extracted_events, summary.cleaned_events
    );
    info!("Audio track: {}", summary.audio_path.display());
    if let Some(video_path) = summary.video_path {
        info!("Voiced video: {}", video_path.display());
    }
    Ok(())
}
