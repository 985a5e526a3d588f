pub mod extract;
pub mod pipeline;
pub mod progress;
pub mod recognizer;

pub use extract::Extractor;
pub use pipeline::{CardPipeline, CardScan, PipelineError, SideReport};
pub use progress::{PercentThrottle, ProgressCallback};
pub use recognizer::{MockRecognizer, OcrBackend, RecognizeError};
