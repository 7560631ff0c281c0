//! Clamped resource tracks.
//!
//! A track is a named numeric value clamped between a minimum and a
//! maximum. The table's shared Fear counter is a track; actor resources
//! live in the field store but borrow the same clamping semantics.

use serde::{Deserialize, Serialize};

/// A named numeric resource clamped between min and max.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Display name of the track.
    pub name: String,
    /// Current value.
    pub current: i64,
    /// Maximum value.
    pub max: i64,
    /// Minimum value (usually 0).
    pub min: i64,
}

impl Track {
    /// Create a track starting at its minimum value.
    pub fn new(name: impl Into<String>, max: i64) -> Self {
        Self {
            name: name.into(),
            current: 0,
            max,
            min: 0,
        }
    }

    /// Create a track with an explicit range and starting value.
    pub fn with_range(name: impl Into<String>, current: i64, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            current: current.clamp(min, max),
            max,
            min,
        }
    }

    /// Adjust by a delta, clamping to bounds. Returns the delta that was
    /// actually applied (which may be smaller in magnitude than requested).
    pub fn adjust(&mut self, delta: i64) -> i64 {
        let before = self.current;
        self.current = (self.current + delta).clamp(self.min, self.max);
        self.current - before
    }

    /// Returns true if the track is at its maximum.
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Returns true if the track is at its minimum.
    pub fn is_empty(&self) -> bool {
        self.current <= self.min
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}/{}", self.name, self.current, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_at_min() {
        let t = Track::new("Fear", 12);
        assert_eq!(t.current, 0);
        assert!(t.is_empty());
    }

    #[test]
    fn adjust_reports_applied_delta() {
        let mut t = Track::with_range("Fear", 11, 0, 12);
        assert_eq!(t.adjust(3), 1);
        assert!(t.is_full());
        assert_eq!(t.adjust(1), 0);
    }

    #[test]
    fn adjust_clamps_to_min() {
        let mut t = Track::with_range("Fear", 1, 0, 12);
        assert_eq!(t.adjust(-5), -1);
        assert_eq!(t.current, 0);
    }

    #[test]
    fn display() {
        let t = Track::with_range("Fear", 4, 0, 12);
        assert_eq!(t.to_string(), "Fear: 4/12");
    }
}
