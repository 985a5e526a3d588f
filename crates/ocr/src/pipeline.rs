use std::path::Path;

use sha2::{Digest, Sha256};
use thiserror::Error;

use idlens_core::{IdRecord, RecognitionResult, Side};

use crate::extract::Extractor;
use crate::progress::{PercentThrottle, ProgressCallback};
use crate::recognizer::{OcrBackend, RecognizeError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] RecognizeError),
}

/// Outcome of one side of a scan.
#[derive(Debug)]
pub enum SideReport {
    /// No image was supplied for this side.
    Skipped,
    Recognized(RecognitionResult),
    /// This side failed; the other side is unaffected.
    Failed(PipelineError),
}

impl SideReport {
    /// Recognized text, or the empty string for skipped/failed sides. This is
    /// exactly what the extractor receives for the side.
    pub fn text(&self) -> &str {
        match self {
            SideReport::Recognized(result) => &result.text,
            _ => "",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SideReport::Failed(_))
    }
}

/// Result of a full front/back scan.
#[derive(Debug)]
pub struct CardScan {
    pub front: SideReport,
    pub back: SideReport,
    /// Present iff at least one side yielded non-empty text.
    pub record: Option<IdRecord>,
}

/// Orchestrates per-side recognition and the final field extraction.
///
/// Sides are processed front first, then back. Each side gets its own
/// throttle state, so one image's progress stream never reports the other's,
/// and a failure on one side never aborts the other. Extraction runs once
/// both sides settle, over whatever text was obtained.
pub struct CardPipeline<B: OcrBackend> {
    backend: B,
    lang: String,
}

impl<B: OcrBackend> CardPipeline<B> {
    pub fn new(backend: B, lang: impl Into<String>) -> Self {
        Self { backend, lang: lang.into() }
    }

    /// Recognize a single side. Validates that the bytes decode as a raster
    /// image before handing them to the engine, and reports throttled
    /// integer progress tagged with `side`.
    ///
    /// No timeout is enforced here; callers wanting bounded latency wrap the
    /// returned future themselves.
    pub async fn recognize_side(
        &self,
        side: Side,
        image_bytes: &[u8],
        progress: Option<&ProgressCallback>,
    ) -> Result<RecognitionResult, PipelineError> {
        image::load_from_memory(image_bytes)
            .map_err(|e| RecognizeError::ImageDecode(e.to_string()))?;

        let digest = digest_hex(image_bytes);
        tracing::debug!(%side, sha256 = %digest, bytes = image_bytes.len(), "recognizing image");

        let mut throttle = PercentThrottle::new();
        let mut report = |ratio: f32| {
            if let Some(pct) = throttle.update(ratio) {
                if let Some(cb) = progress {
                    cb(side, pct);
                }
            }
        };
        let text = self.backend.recognize(image_bytes, &self.lang, &mut report)?;

        tracing::debug!(%side, chars = text.len(), "recognition complete");
        Ok(RecognitionResult::new(side, text))
    }

    /// Scan the supplied sides from in-memory image bytes.
    pub async fn process(
        &self,
        front: Option<&[u8]>,
        back: Option<&[u8]>,
        progress: Option<ProgressCallback>,
    ) -> CardScan {
        let front_report = self.bytes_side(Side::Front, front, progress.as_ref()).await;
        let back_report = self.bytes_side(Side::Back, back, progress.as_ref()).await;
        Self::assemble(front_report, back_report)
    }

    /// Scan image files on disk. A side whose file cannot be read is reported
    /// as failed without touching the other side.
    pub async fn process_files(
        &self,
        front: Option<&Path>,
        back: Option<&Path>,
        progress: Option<ProgressCallback>,
    ) -> CardScan {
        let front_report = self.file_side(Side::Front, front, progress.as_ref()).await;
        let back_report = self.file_side(Side::Back, back, progress.as_ref()).await;
        Self::assemble(front_report, back_report)
    }

    async fn bytes_side(
        &self,
        side: Side,
        image_bytes: Option<&[u8]>,
        progress: Option<&ProgressCallback>,
    ) -> SideReport {
        match image_bytes {
            Some(bytes) => Self::settle(side, self.recognize_side(side, bytes, progress).await),
            None => SideReport::Skipped,
        }
    }

    async fn file_side(
        &self,
        side: Side,
        path: Option<&Path>,
        progress: Option<&ProgressCallback>,
    ) -> SideReport {
        let Some(path) = path else {
            return SideReport::Skipped;
        };
        let outcome = match tokio::fs::read(path).await {
            Ok(bytes) => self.recognize_side(side, &bytes, progress).await,
            Err(e) => Err(PipelineError::Io(e)),
        };
        Self::settle(side, outcome)
    }

    fn settle(side: Side, outcome: Result<RecognitionResult, PipelineError>) -> SideReport {
        match outcome {
            Ok(result) => SideReport::Recognized(result),
            Err(err) => {
                tracing::warn!(%side, error = %err, "side processing failed");
                SideReport::Failed(err)
            }
        }
    }

    fn assemble(front: SideReport, back: SideReport) -> CardScan {
        let record = if front.text().is_empty() && back.text().is_empty() {
            None
        } else {
            Some(Extractor::extract(front.text(), back.text()))
        };
        CardScan { front, back, record }
    }
}

/// SHA-256 hex digest of the input bytes, logged so a scan can be tied back
/// to the exact image that produced it.
fn digest_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::MockRecognizer;
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    fn tiny_png(shade: u8) -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([shade]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    /// Test backend keyed on the exact image bytes, so front and back can
    /// recognize to different texts through a single backend instance.
    struct KeyedRecognizer(HashMap<Vec<u8>, String>);

    impl OcrBackend for KeyedRecognizer {
        fn recognize(
            &self,
            image_bytes: &[u8],
            _lang: &str,
            report: &mut dyn FnMut(f32),
        ) -> Result<String, RecognizeError> {
            report(1.0);
            Ok(self.0.get(image_bytes).cloned().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn process_extracts_record_from_both_sides() {
        let front_png = tiny_png(10);
        let back_png = tiny_png(200);
        let backend = KeyedRecognizer(HashMap::from([
            (front_png.clone(), "Name: Jane Doe\n1234 5678 9012".to_string()),
            (back_png.clone(), "Flat 12, Some Building\nNear Main Road, City\nPIN: 400001".to_string()),
        ]));
        let pipeline = CardPipeline::new(backend, "eng");

        let scan = pipeline
            .process(Some(front_png.as_slice()), Some(back_png.as_slice()), None)
            .await;

        let record = scan.record.unwrap();
        assert_eq!(record.name.as_deref(), Some("Jane Doe"));
        assert_eq!(record.id_number.as_deref(), Some("123456789012"));
        assert_eq!(
            record.address.as_deref(),
            Some("Flat 12, Some Building, Near Main Road, City")
        );
        assert_eq!(record.front_text, "Name: Jane Doe\n1234 5678 9012");
        assert!(!scan.front.is_failed());
        assert!(!scan.back.is_failed());
    }

    #[tokio::test]
    async fn record_produced_when_one_side_skipped() {
        let pipeline = CardPipeline::new(
            MockRecognizer::new("Name: Jane Doe\n1234 5678 9012"),
            "eng",
        );

        let front_png = tiny_png(50);
        let scan = pipeline.process(Some(front_png.as_slice()), None, None).await;

        assert!(matches!(scan.back, SideReport::Skipped));
        let record = scan.record.unwrap();
        assert_eq!(record.name.as_deref(), Some("Jane Doe"));
        // Address only comes from the back, which was never scanned.
        assert_eq!(record.address, None);
        assert_eq!(record.back_text, "");
    }

    #[tokio::test]
    async fn no_record_when_all_text_empty() {
        let pipeline = CardPipeline::new(MockRecognizer::new(""), "eng");

        let front_png = tiny_png(50);
        let back_png = tiny_png(60);
        let scan = pipeline
            .process(Some(front_png.as_slice()), Some(back_png.as_slice()), None)
            .await;

        assert!(matches!(scan.front, SideReport::Recognized(_)));
        assert!(scan.record.is_none());
    }

    #[tokio::test]
    async fn both_sides_skipped_yield_no_record() {
        let pipeline = CardPipeline::new(MockRecognizer::new("unused"), "eng");

        let scan = pipeline.process(None, None, None).await;

        assert!(matches!(scan.front, SideReport::Skipped));
        assert!(matches!(scan.back, SideReport::Skipped));
        assert!(scan.record.is_none());
    }

    #[tokio::test]
    async fn corrupt_side_does_not_block_the_other() {
        let pipeline = CardPipeline::new(
            MockRecognizer::new("Name: Jane Doe\n1234 5678 9012"),
            "eng",
        );

        let front_png = tiny_png(50);
        let scan = pipeline
            .process(Some(front_png.as_slice()), Some(b"not an image".as_slice()), None)
            .await;

        assert!(matches!(
            scan.back,
            SideReport::Failed(PipelineError::Ocr(RecognizeError::ImageDecode(_)))
        ));
        let record = scan.record.unwrap();
        assert_eq!(record.name.as_deref(), Some("Jane Doe"));
        assert_eq!(record.back_text, "");
    }

    #[tokio::test]
    async fn progress_is_throttled_and_tagged_per_side() {
        let backend = MockRecognizer::new("text").with_steps(vec![0.0, 0.004, 0.5, 0.5, 1.0]);
        let pipeline = CardPipeline::new(backend, "eng");

        let events: Arc<Mutex<Vec<(Side, u8)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let progress: ProgressCallback =
            Box::new(move |side, pct| sink.lock().unwrap().push((side, pct)));

        let front_png = tiny_png(50);
        let back_png = tiny_png(60);
        pipeline
            .process(Some(front_png.as_slice()), Some(back_png.as_slice()), Some(progress))
            .await;

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (Side::Front, 0),
                (Side::Front, 50),
                (Side::Front, 100),
                (Side::Back, 0),
                (Side::Back, 50),
                (Side::Back, 100),
            ]
        );
    }

    #[tokio::test]
    async fn process_files_reads_sides_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let front_path = dir.path().join("front.png");
        tokio::fs::write(&front_path, tiny_png(50)).await.unwrap();

        let pipeline = CardPipeline::new(
            MockRecognizer::new("Name: Jane Doe\n1234 5678 9012"),
            "eng",
        );

        let scan = pipeline
            .process_files(Some(front_path.as_path()), None, None)
            .await;

        assert!(matches!(scan.front, SideReport::Recognized(_)));
        assert_eq!(scan.record.unwrap().id_number.as_deref(), Some("123456789012"));
    }

    #[tokio::test]
    async fn process_files_missing_file_is_side_failure() {
        let dir = tempfile::tempdir().unwrap();
        let back_path = dir.path().join("back.png");
        tokio::fs::write(&back_path, tiny_png(50)).await.unwrap();

        let pipeline = CardPipeline::new(
            MockRecognizer::new("Flat 12, Some Building\nNear Main Road, City"),
            "eng",
        );

        let scan = pipeline
            .process_files(
                Some(dir.path().join("missing.png").as_path()),
                Some(back_path.as_path()),
                None,
            )
            .await;

        assert!(matches!(scan.front, SideReport::Failed(PipelineError::Io(_))));
        let record = scan.record.unwrap();
        assert_eq!(
            record.address.as_deref(),
            Some("Flat 12, Some Building, Near Main Road, City")
        );
    }

    #[test]
    fn digest_is_stable_hex() {
        let d = digest_hex(b"");
        assert_eq!(
            d,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(digest_hex(b"card"), digest_hex(b"card"));
    }
}
