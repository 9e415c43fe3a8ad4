//! # Readout Module
//!
//! Display-side policy applied to raw estimates before they reach the screen:
//! implausible frequencies are dropped, and the last good value is held
//! through brief dropouts instead of flashing to zero.

/// Lowest frequency shown on the readout.
pub const MIN_DISPLAY_HZ: f32 = 50.0;

/// Highest frequency shown on the readout.
pub const MAX_DISPLAY_HZ: f32 = 5000.0;

/// Plausibility filter with last-value hold.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadoutFilter {
    min_hz: f32,
    max_hz: f32,
    last: Option<f32>,
}

impl Default for ReadoutFilter {
    fn default() -> Self {
        Self::new(MIN_DISPLAY_HZ, MAX_DISPLAY_HZ)
    }
}

impl ReadoutFilter {
    /// Creates a filter accepting frequencies in `[min_hz, max_hz]`.
    pub fn new(min_hz: f32, max_hz: f32) -> Self {
        Self {
            min_hz,
            max_hz,
            last: None,
        }
    }

    /// Whether `frequency` falls inside the plausible range.
    pub fn accepts(&self, frequency: f32) -> bool {
        (self.min_hz..=self.max_hz).contains(&frequency)
    }

    /// Feeds one estimate and returns the value to display.
    ///
    /// # Arguments
    /// * `estimate` - This tick's estimate, if any
    ///
    /// # Returns
    /// * The new estimate when plausible, otherwise the previously displayed value
    pub fn update(&mut self, estimate: Option<f32>) -> Option<f32> {
        if let Some(frequency) = estimate.filter(|&f| self.accepts(f)) {
            self.last = Some(frequency);
        }
        self.last
    }

    /// The value currently on display.
    pub fn last(&self) -> Option<f32> {
        self.last
    }

    /// Forgets the held value.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
