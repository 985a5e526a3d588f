use idlens_core::Side;

/// Per-side progress callback: integer percent in `0..=100`, tagged with the
/// side it belongs to. Invoked on a single logical sequence per image; two
/// sides never share throttle state.
pub type ProgressCallback = Box<dyn Fn(Side, u8) + Send + Sync>;

/// Converts raw engine completion ratios into integer percentages and drops
/// consecutive duplicates, so a chatty engine cannot flood the caller.
///
/// The engine's ratios are not guaranteed to be monotonic; only repeats of
/// the same integer value are suppressed.
#[derive(Debug, Default)]
pub struct PercentThrottle {
    last: Option<u8>,
}

impl PercentThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `ratio` in `[0.0, 1.0]` to a rounded percent; `Some` only when the
    /// integer value changed since the last report. Out-of-range input is
    /// clamped.
    pub fn update(&mut self, ratio: f32) -> Option<u8> {
        let pct = (ratio.clamp(0.0, 1.0) * 100.0).round() as u8;
        if self.last == Some(pct) {
            return None;
        }
        self.last = Some(pct);
        Some(pct)
    }
}
