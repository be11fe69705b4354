use std::collections::HashSet;
use std::time::Duration;

use crate::animation::ease::{Easing, EasingDef};
use crate::foundation::error::{ScrollPathError, ScrollPathResult};
use crate::geometry::path::DEFAULT_TANGENT_DELTA;
use crate::tracking::segment::Segment;

pub const DEFAULT_SMOOTHING: f64 = 0.15;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Engine construction options.
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub easing: EasingDef,
    /// Smoothing factor in `(0, 1]`.
    pub smoothing: f64,
    pub smooth: bool,
    pub initial_segments: Vec<Segment>,
    /// Half-width of the tangent estimation window, in normalized units.
    pub tangent_delta: f64,
    /// Delay before the one-time parallax layout re-capture.
    pub settle_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            easing: EasingDef::default(),
            smoothing: DEFAULT_SMOOTHING,
            smooth: true,
            initial_segments: Vec::new(),
            tangent_delta: DEFAULT_TANGENT_DELTA,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl EngineConfig {
    #[tracing::instrument(level = "debug", skip(s))]
    pub fn from_json_str(s: &str) -> ScrollPathResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ScrollPathResult<()> {
        self.easing()?;
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ScrollPathError::validation(format!(
                "smoothing must be within (0, 1], got {}",
                self.smoothing
            )));
        }
        if !(self.tangent_delta > 0.0 && self.tangent_delta <= 0.5) {
            return Err(ScrollPathError::validation(format!(
                "tangent_delta must be within (0, 0.5], got {}",
                self.tangent_delta
            )));
        }
        let mut seen = HashSet::new();
        for seg in &self.initial_segments {
            seg.validate()?;
            if !seen.insert(seg.id.as_str()) {
                return Err(ScrollPathError::validation(format!(
                    "duplicate segment id \"{}\"",
                    seg.id
                )));
            }
        }
        Ok(())
    }

    /// Resolve the configured easing.
    pub fn easing(&self) -> ScrollPathResult<Easing> {
        Easing::from_def(&self.easing)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/config.rs"]
mod tests;
