use crate::foundation::core::Direction;
use crate::foundation::error::{ScrollPathError, ScrollPathResult};
use crate::foundation::math::clamp01;

/// Named sub-range of the progress axis with independent activation tracking.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    pub id: String,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Opaque caller payload, carried through events untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Segment {
    pub fn new(id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            label: None,
            data: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn validate(&self) -> ScrollPathResult<()> {
        if self.id.trim().is_empty() {
            return Err(ScrollPathError::validation("segment id must be non-empty"));
        }
        if !(self.start.is_finite() && self.end.is_finite()) {
            return Err(ScrollPathError::validation(format!(
                "segment \"{}\" bounds must be finite",
                self.id
            )));
        }
        if self.start > self.end {
            return Err(ScrollPathError::validation(format!(
                "segment \"{}\" start must be <= end",
                self.id
            )));
        }
        Ok(())
    }

    /// `start <= progress <= end`.
    pub fn contains(&self, progress: f64) -> bool {
        self.start <= progress && progress <= self.end
    }

    /// Fraction of the way through this segment, clamped to `[0, 1]`.
    ///
    /// Zero-length segments report `0`.
    pub fn local_progress(&self, progress: f64) -> f64 {
        let span = self.end - self.start;
        if span == 0.0 {
            return 0.0;
        }
        clamp01((progress - self.start) / span)
    }
}

/// Split `[0, 1]` into `count` equal, contiguous segments named `segment-0`, `segment-1`, ...
pub fn equal_split(count: usize) -> Vec<Segment> {
    let n = count as f64;
    (0..count)
        .map(|i| {
            let start = i as f64 / n;
            let end = if i + 1 == count {
                1.0
            } else {
                (i + 1) as f64 / n
            };
            Segment::new(format!("segment-{i}"), start, end)
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentEventKind {
    Enter,
    Exit,
    Progress,
}

/// Transition emitted by the tracker for one segment on one tick.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SegmentEvent {
    pub kind: SegmentEventKind,
    pub segment: Segment,
    /// Position within the segment. On `Exit` this is the crossed boundary (`1` moving forward,
    /// `0` moving backward), not a re-projection of the current progress.
    pub segment_progress: f64,
    pub path_progress: f64,
    pub direction: Direction,
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/segment.rs"]
mod tests;
