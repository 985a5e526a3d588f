use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;

use idlens_core::Side;
use idlens_ocr::{CardPipeline, ProgressCallback, SideReport};

mod config;

use config::AppConfig;

/// Extract structured identity-card details from front/back card photos.
#[derive(Debug, Parser)]
#[command(name = "idlens", version, about)]
struct Cli {
    /// Front-side image file
    #[arg(long, value_name = "FILE")]
    front: Option<PathBuf>,

    /// Back-side image file
    #[arg(long, value_name = "FILE")]
    back: Option<PathBuf>,

    /// OCR language code (overrides the config file)
    #[arg(long)]
    lang: Option<String>,

    /// Path to a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the extracted record
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if cli.front.is_none() && cli.back.is_none() {
        bail!("supply at least one of --front / --back");
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(lang) = cli.lang {
        config.lang = lang;
    }

    let recognizer = build_recognizer(&config);
    let pipeline = CardPipeline::new(recognizer, config.lang.clone());

    let progress: ProgressCallback = Box::new(|side, pct| {
        tracing::info!("{side}: {pct}%");
    });

    let scan = pipeline
        .process_files(cli.front.as_deref(), cli.back.as_deref(), Some(progress))
        .await;

    report_side(Side::Front, &scan.front);
    report_side(Side::Back, &scan.back);

    match scan.record {
        Some(record) if record.has_details() => {
            let json = if cli.pretty {
                serde_json::to_string_pretty(&record)?
            } else {
                serde_json::to_string(&record)?
            };
            println!("{json}");
        }
        Some(record) => {
            // Text came back but nothing matched; a valid, empty outcome.
            tracing::debug!(
                front_chars = record.front_text.len(),
                back_chars = record.back_text.len(),
                "no fields matched"
            );
            eprintln!("No details could be extracted.");
        }
        None => eprintln!("No details could be extracted."),
    }

    Ok(())
}

fn report_side(side: Side, report: &SideReport) {
    match report {
        SideReport::Skipped => tracing::debug!("{side}: skipped"),
        SideReport::Recognized(result) => {
            tracing::info!("{side}: recognized {} chars", result.text.len());
        }
        SideReport::Failed(e) => tracing::warn!("{side}: {e}"),
    }
}

#[cfg(feature = "tesseract")]
fn build_recognizer(
    config: &AppConfig,
) -> idlens_ocr::recognizer::tesseract_backend::TesseractRecognizer {
    idlens_ocr::recognizer::tesseract_backend::TesseractRecognizer::new(
        config
            .tessdata_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
    )
}

#[cfg(not(feature = "tesseract"))]
fn build_recognizer(_config: &AppConfig) -> idlens_ocr::MockRecognizer {
    tracing::warn!("built without the `tesseract` feature; recognition returns empty text");
    idlens_ocr::MockRecognizer::new("")
}
