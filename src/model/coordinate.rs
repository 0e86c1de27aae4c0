//! Coordinate data model for particle picks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Extra attribute key tagging which picking run produced a coordinate.
pub const ORIGIN_RUN_KEY: &str = "origin-run";

/// A single pick on a micrograph, in pixel coordinates.
///
/// Point picks only use `x`/`y`. Filament picks are segments and also carry
/// the second end point in `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Primary X position
    pub x: i32,
    /// Primary Y position
    pub y: i32,
    /// Second end point for segment picks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<(i32, i32)>,
    /// Label name, resolved against the owning model's label registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Score or figure of merit of the pick
    #[serde(default)]
    pub score: f64,
    /// Integer threshold attribute used by synthetic models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i32>,
    /// Application-specific attributes
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

impl Coordinate {
    /// Create a point pick.
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            end: None,
            label: None,
            score: 0.0,
            threshold: None,
            extra: HashMap::new(),
        }
    }

    /// Create a segment pick between two end points.
    pub fn segment(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let mut coord = Self::new(x1, y1);
        coord.end = Some((x2, y2));
        coord
    }

    /// Create a point pick from floating-point positions, rounding to pixels.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(x.round() as i32, y.round() as i32)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Attach an extra attribute.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Replace the label in place.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Whether this pick is a filament segment.
    pub fn is_segment(&self) -> bool {
        self.end.is_some()
    }

    /// Euclidean distance between the primary positions of two picks.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_rounds() {
        let coord = Coordinate::from_f64(10.4, 20.6);
        assert_eq!((coord.x, coord.y), (10, 21));
        assert!(!coord.is_segment());
    }

    #[test]
    fn test_segment() {
        let coord = Coordinate::segment(1, 2, 30, 40).with_label("F");
        assert!(coord.is_segment());
        assert_eq!(coord.end, Some((30, 40)));
        assert_eq!(coord.label.as_deref(), Some("F"));
    }

    #[test]
    fn test_distance() {
        let a = Coordinate::new(0, 0);
        let b = Coordinate::new(3, 4);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_at_integer_limits() {
        let far = Coordinate::from_f64(3.0e9, 0.0);
        assert_eq!(far.x, i32::MAX);
        let d = far.distance_to(&Coordinate::new(-10, 0));
        assert_eq!(d, f64::from(i32::MAX) + 10.0);

        let low = Coordinate::new(i32::MIN, i32::MIN);
        let high = Coordinate::new(i32::MAX, i32::MAX);
        assert!(low.distance_to(&high) > 6.0e9);
    }

    #[test]
    fn test_extra_attributes() {
        let coord = Coordinate::new(1, 1).with_extra(ORIGIN_RUN_KEY, "A");
        assert_eq!(coord.extra.get(ORIGIN_RUN_KEY).map(String::as_str), Some("A"));
    }
}
