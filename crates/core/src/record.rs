use serde::{Deserialize, Serialize};

use crate::side::Side;

/// Raw text recognized from one card image. Created once per processed image
/// and consumed immediately by the extractor; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub side: Side,
    /// Engine output, possibly empty.
    pub text: String,
}

impl RecognitionResult {
    pub fn new(side: Side, text: impl Into<String>) -> Self {
        Self { side, text: text.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Structured details extracted from a card.
///
/// Every field is independently optional; a missing field means "not found",
/// never an error. The raw per-side texts are retained for audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRecord {
    pub name: Option<String>,
    /// Exactly 12 ASCII digits when present, separators stripped.
    pub id_number: Option<String>,
    /// Stored verbatim as matched; not validated as a calendar date.
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub guardian_name: Option<String>,
    pub address: Option<String>,
    pub front_text: String,
    pub back_text: String,
}

impl IdRecord {
    /// Whether any structured field matched. Callers use this to distinguish
    /// a useful record from a reportable-as-empty one.
    pub fn has_details(&self) -> bool {
        self.name.is_some()
            || self.id_number.is_some()
            || self.date_of_birth.is_some()
            || self.gender.is_some()
            || self.guardian_name.is_some()
            || self.address.is_some()
    }
}
