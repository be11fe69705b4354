use crate::foundation::error::{ScrollPathError, ScrollPathResult};

/// Single-pole IIR filter over raw progress.
///
/// `smoothed ← smoothed + (raw − smoothed) × factor`. Lower factors mean more inertia. When
/// disabled the raw value passes through unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSmoother {
    factor: f64,
    enabled: bool,
    value: f64,
}

impl ProgressSmoother {
    /// Create a smoother starting at `0`. `factor` must be in `(0, 1]`.
    pub fn new(factor: f64, enabled: bool) -> ScrollPathResult<Self> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(ScrollPathError::validation(format!(
                "smoothing factor must be within (0, 1], got {factor}"
            )));
        }
        Ok(Self {
            factor,
            enabled,
            value: 0.0,
        })
    }

    /// Pass-through smoother.
    pub fn disabled() -> Self {
        Self {
            factor: 1.0,
            enabled: false,
            value: 0.0,
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current filtered value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Feed one raw sample and return the new filtered value.
    pub fn update(&mut self, raw: f64) -> f64 {
        if self.enabled {
            self.value += (raw - self.value) * self.factor;
        } else {
            self.value = raw;
        }
        self.value
    }

    /// Re-initialize the filter state.
    pub fn reset(&mut self, value: f64) {
        self.value = value;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/smooth.rs"]
mod tests;
