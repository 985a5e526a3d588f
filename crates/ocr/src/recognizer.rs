use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available; build with the `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR engine.
///
/// Implementations accept raw PNG/JPEG image bytes plus a language hint and
/// return the recognized text. `report` receives the engine's completion
/// ratio in `[0.0, 1.0]`; it may be called zero or more times and is not
/// required to be monotonic. Failures are not retried here; retry policy
/// belongs to the caller.
pub trait OcrBackend: Send + Sync {
    fn recognize(
        &self,
        image_bytes: &[u8],
        lang: &str,
        report: &mut dyn FnMut(f32),
    ) -> Result<String, RecognizeError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string and replays a scripted progress ramp. Useful for
/// exercising the pipeline without requiring Tesseract to be installed.
pub struct MockRecognizer {
    text: String,
    steps: Vec<f32>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), steps: vec![0.0, 0.5, 1.0] }
    }

    /// Replace the progress ramp replayed on every call.
    pub fn with_steps(mut self, steps: Vec<f32>) -> Self {
        self.steps = steps;
        self
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(
        &self,
        _image_bytes: &[u8],
        _lang: &str,
        report: &mut dyn FnMut(f32),
    ) -> Result<String, RecognizeError> {
        for &step in &self.steps {
            report(step);
        }
        Ok(self.text.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, RecognizeError};
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>) -> Self {
            Self { data_path }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(
            &self,
            image_bytes: &[u8],
            lang: &str,
            report: &mut dyn FnMut(f32),
        ) -> Result<String, RecognizeError> {
            report(0.0);
            let mut lt = LepTess::new(self.data_path.as_deref(), lang)
                .map_err(|e| RecognizeError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| RecognizeError::ImageDecode(e.to_string()))?;
            let text = lt
                .get_utf8_text()
                .map_err(|e| RecognizeError::Engine(e.to_string()))?;
            // leptess exposes no incremental progress hook, so the ramp is
            // just start and finish.
            report(1.0);
            Ok(text)
        }
    }
}
