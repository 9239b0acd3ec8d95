//! Grid track template parsing and resolution.
//!
//! Templates use the `"1fr 2fr 1fr"` fraction syntax: each token describes
//! one lane whose share of the cross-axis extent is proportional to its
//! weight. An empty template means a single full-extent lane.

use std::fmt;

/// Error produced when a track template string cannot be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// A token did not end with the `fr` unit.
    UnknownUnit(String),
    /// A token's numeric part was not a valid number.
    InvalidNumber(String),
    /// A track weight was zero or negative.
    NonPositiveWeight(f32),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UnknownUnit(token) => {
                write!(f, "unknown track unit in template token '{token}'")
            }
            TemplateError::InvalidNumber(token) => {
                write!(f, "invalid track weight in template token '{token}'")
            }
            TemplateError::NonPositiveWeight(weight) => {
                write!(f, "track weight must be positive, got {weight}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// A parsed grid track template.
///
/// Equality on the parsed weights participates in the structural signature
/// that decides whether persisted layout state must be reset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackTemplate {
    weights: Vec<f32>,
}

impl Default for TrackTemplate {
    fn default() -> Self {
        Self::single()
    }
}

impl TrackTemplate {
    /// A template with one full-extent lane.
    pub fn single() -> Self {
        Self {
            weights: vec![1.0],
        }
    }

    /// A template with `count` equally weighted lanes.
    pub fn uniform(count: usize) -> Self {
        Self {
            weights: vec![1.0; count.max(1)],
        }
    }

    /// Parses a `"1fr 2fr"` style template string.
    ///
    /// Whitespace separates tracks; an empty or blank string yields a single
    /// full-extent lane.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut weights = Vec::new();
        for token in template.split_whitespace() {
            let number = token
                .strip_suffix("fr")
                .ok_or_else(|| TemplateError::UnknownUnit(token.to_string()))?;
            let weight: f32 = number
                .parse()
                .map_err(|_| TemplateError::InvalidNumber(token.to_string()))?;
            if weight <= 0.0 {
                return Err(TemplateError::NonPositiveWeight(weight));
            }
            weights.push(weight);
        }
        if weights.is_empty() {
            return Ok(Self::single());
        }
        Ok(Self { weights })
    }

    /// Number of lanes described by this template.
    #[inline]
    pub fn lane_count(&self) -> usize {
        self.weights.len()
    }

    /// Raw lane weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Resolves lane sizes and start offsets for a cross-axis extent.
    ///
    /// `cross_gap` pixels separate adjacent lanes. Returns one
    /// `(offset, size)` pair per lane.
    pub fn resolve(&self, cross_extent: f32, cross_gap: f32) -> Vec<LaneSlot> {
        let lanes = self.weights.len();
        let gaps_total = cross_gap * lanes.saturating_sub(1) as f32;
        let available = (cross_extent - gaps_total).max(0.0);
        let weight_total: f32 = self.weights.iter().sum();

        let mut slots = Vec::with_capacity(lanes);
        let mut cursor = 0.0;
        for &weight in &self.weights {
            let size = if weight_total > 0.0 {
                available * weight / weight_total
            } else {
                0.0
            };
            slots.push(LaneSlot {
                offset: cursor,
                size,
            });
            cursor += size + cross_gap;
        }
        slots
    }
}

/// Cross-axis position of one resolved lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneSlot {
    /// Offset of the lane start from the content cross-axis start.
    pub offset: f32,
    /// Lane size along the cross axis.
    pub size: f32,
}

impl LaneSlot {
    /// Cross-axis extent covered by `span` lanes starting at this one.
    ///
    /// Includes the gaps between the spanned lanes, which is why the caller
    /// passes the slot table rather than multiplying `size`.
    pub fn spanned_size(slots: &[LaneSlot], lane: usize, span: usize) -> f32 {
        let last = (lane + span.max(1) - 1).min(slots.len().saturating_sub(1));
        if slots.is_empty() {
            return 0.0;
        }
        slots[last].offset + slots[last].size - slots[lane.min(last)].offset
    }
}
