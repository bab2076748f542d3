// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive normalization: raw drawing records to uniform wall segments.
//!
//! Each primitive kind has its own rule and base confidence:
//!
//! | kind                    | rule                          | confidence |
//! |-------------------------|-------------------------------|------------|
//! | line, axis-aligned      | direct                        | 0.80       |
//! | line, diagonal          | direct                        | 0.60       |
//! | edge                    | direct                        | 0.75       |
//! | thin rectangle          | centerline along the long axis| 0.85       |
//! | other rectangle         | up to four boundary sides     | 0.75       |
//! | curve                   | chord first → last point      | 0.60       |
//!
//! Segments shorter than `min_length` are dropped, then near-identical
//! segments (same endpoints at 0.1 precision, either direction) collapse to
//! the first occurrence.

use rustc_hash::FxHashSet;

use crate::config::NormalizerConfig;
use crate::primitives::{
    CurvePrimitive, LinePrimitive, PrimitiveSet, RawPrimitive, RectPrimitive,
};
use crate::types::{
    ConfidenceScore, Point2D, SegmentData, SegmentMetadata, SegmentOrigin, WallSegment,
};

/// Coordinate delta below which a segment counts as horizontal/vertical
pub const AXIS_TOLERANCE: f64 = 5.0;

const LINE_AXIS_CONFIDENCE: f64 = 0.8;
const LINE_DIAGONAL_CONFIDENCE: f64 = 0.6;
const EDGE_CONFIDENCE: f64 = 0.75;
const RECT_WALL_CONFIDENCE: f64 = 0.85;
const RECT_EDGE_CONFIDENCE: f64 = 0.75;
const CURVE_CONFIDENCE: f64 = 0.6;

const DEFAULT_STROKE_WIDTH: f64 = 1.0;
const EXTRACTOR: &str = "primitive_normalizer";

/// Output of one normalization run
#[derive(Debug, Clone, Default)]
pub struct NormalizedSegments {
    /// Deduplicated segments; `id` equals the position in this list
    pub segments: Vec<WallSegment>,
    pub malformed: usize,
    pub too_short: usize,
    pub duplicates: usize,
}

/// Converts raw primitives into wall segments
#[derive(Debug, Clone)]
pub struct PrimitiveNormalizer {
    config: NormalizerConfig,
}

impl PrimitiveNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize and deduplicate every record of a primitive set.
    ///
    /// Malformed records are logged and skipped.
    pub fn normalize(&self, primitives: &PrimitiveSet) -> NormalizedSegments {
        let mut candidates = Vec::with_capacity(primitives.len());
        let mut malformed = 0;
        let mut too_short = 0;

        for (index, (kind, record)) in primitives.records().enumerate() {
            match RawPrimitive::from_record(kind, record) {
                Ok(primitive) => too_short += self.normalize_into(&primitive, &mut candidates),
                Err(e) => {
                    tracing::warn!(record = index, error = %e, "skipping malformed primitive");
                    malformed += 1;
                }
            }
        }

        let before = candidates.len();
        let mut segments = deduplicate(candidates);
        for (id, segment) in segments.iter_mut().enumerate() {
            segment.id = id;
        }
        let duplicates = before - segments.len();

        tracing::debug!(
            primitives = primitives.len(),
            segments = segments.len(),
            malformed,
            too_short,
            duplicates,
            "normalized primitives"
        );

        NormalizedSegments {
            segments,
            malformed,
            too_short,
            duplicates,
        }
    }

    /// Segments for a single resolved primitive (ids are not yet assigned).
    pub fn normalize_primitive(&self, primitive: &RawPrimitive) -> Vec<WallSegment> {
        let mut out = Vec::new();
        self.normalize_into(primitive, &mut out);
        out
    }

    /// Appends the segments of `primitive` to `out`, returning how many
    /// candidate segments were rejected as too short.
    fn normalize_into(&self, primitive: &RawPrimitive, out: &mut Vec<WallSegment>) -> usize {
        let before = out.len();
        let attempted = match primitive {
            RawPrimitive::Line(line) => {
                out.extend(self.line_segment(line, SegmentOrigin::Line));
                1
            }
            RawPrimitive::Edge(edge) => {
                out.extend(self.line_segment(edge, SegmentOrigin::Edge));
                1
            }
            RawPrimitive::Rect(rect) => self.rect_segments(rect, out),
            RawPrimitive::Curve(curve) => {
                out.extend(self.curve_chord(curve));
                1
            }
        };
        attempted - (out.len() - before)
    }

    fn line_segment(&self, line: &LinePrimitive, origin: SegmentOrigin) -> Option<WallSegment> {
        let (confidence, method) = match origin {
            SegmentOrigin::Edge => (EDGE_CONFIDENCE, "edge_direct"),
            _ => {
                let axis_aligned = (line.end.x - line.start.x).abs() < AXIS_TOLERANCE
                    || (line.end.y - line.start.y).abs() < AXIS_TOLERANCE;
                let confidence = if axis_aligned {
                    LINE_AXIS_CONFIDENCE
                } else {
                    LINE_DIAGONAL_CONFIDENCE
                };
                (confidence, "line_direct")
            }
        };

        self.segment(
            line.start,
            line.end,
            line.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
            confidence,
            origin,
            method,
        )
    }

    /// Thin rectangles become one centerline wall; anything else is
    /// decomposed into its sides. Returns the number of candidate segments.
    fn rect_segments(&self, rect: &RectPrimitive, out: &mut Vec<WallSegment>) -> usize {
        let min_length = self.config.min_length;
        let threshold = self.config.thickness_threshold;
        let is_thin_wall = rect.width > min_length
            && rect.height > min_length
            && (rect.width < threshold || rect.height < threshold);

        if is_thin_wall {
            let (start, end, thickness) = if rect.width >= rect.height {
                let cy = (rect.y0 + rect.y1) / 2.0;
                (
                    Point2D::new(rect.x0, cy),
                    Point2D::new(rect.x1, cy),
                    rect.height,
                )
            } else {
                let cx = (rect.x0 + rect.x1) / 2.0;
                (
                    Point2D::new(cx, rect.y0),
                    Point2D::new(cx, rect.y1),
                    rect.width,
                )
            };
            out.extend(self.segment(
                start,
                end,
                thickness,
                RECT_WALL_CONFIDENCE,
                SegmentOrigin::RectWall,
                "rect_centerline",
            ));
            return 1;
        }

        let stroke = rect.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH);
        let sides = [
            // top, bottom, left, right
            (Point2D::new(rect.x0, rect.y0), Point2D::new(rect.x1, rect.y0)),
            (Point2D::new(rect.x0, rect.y1), Point2D::new(rect.x1, rect.y1)),
            (Point2D::new(rect.x0, rect.y0), Point2D::new(rect.x0, rect.y1)),
            (Point2D::new(rect.x1, rect.y0), Point2D::new(rect.x1, rect.y1)),
        ];
        for (start, end) in sides {
            out.extend(self.segment(
                start,
                end,
                stroke,
                RECT_EDGE_CONFIDENCE,
                SegmentOrigin::RectEdge,
                "rect_boundary",
            ));
        }
        sides.len()
    }

    fn curve_chord(&self, curve: &CurvePrimitive) -> Option<WallSegment> {
        let start = *curve.points.first()?;
        let end = *curve.points.last()?;
        self.segment(
            start,
            end,
            curve.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
            CURVE_CONFIDENCE,
            SegmentOrigin::Curve,
            "curve_chord",
        )
    }

    fn segment(
        &self,
        start: Point2D,
        end: Point2D,
        thickness: f64,
        confidence: f64,
        origin: SegmentOrigin,
        method: &str,
    ) -> Option<WallSegment> {
        let length = start.distance_to(&end);
        if length < self.config.min_length {
            return None;
        }

        Some(WallSegment {
            id: 0,
            geometry: vec![start, end],
            confidence: ConfidenceScore::from_base(confidence),
            data: SegmentData {
                length,
                thickness,
                is_horizontal: (end.y - start.y).abs() < AXIS_TOLERANCE,
                is_vertical: (end.x - start.x).abs() < AXIS_TOLERANCE,
                origin,
            },
            metadata: SegmentMetadata {
                extractor: EXTRACTOR.to_string(),
                method: method.to_string(),
            },
        })
    }
}

type RoundedPoint = (i64, i64);

/// Coordinates rounded to one decimal place. Ties round away from zero, so
/// 0.25 and 0.2 land in different buckets.
fn rounded(p: &Point2D) -> RoundedPoint {
    ((p.x * 10.0).round() as i64, (p.y * 10.0).round() as i64)
}

/// Keep the first of every group of segments sharing rounded endpoints,
/// regardless of direction.
pub fn deduplicate(segments: Vec<WallSegment>) -> Vec<WallSegment> {
    let mut seen: FxHashSet<(RoundedPoint, RoundedPoint)> = FxHashSet::default();

    segments
        .into_iter()
        .filter(|segment| {
            let a = rounded(&segment.start());
            let b = rounded(&segment.end());
            if seen.contains(&(a, b)) || seen.contains(&(b, a)) {
                false
            } else {
                seen.insert((a, b));
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn normalizer() -> PrimitiveNormalizer {
        PrimitiveNormalizer::new(NormalizerConfig::default())
    }

    #[test]
    fn test_line_confidence_by_alignment() {
        let mut set = PrimitiveSet::new();
        set.push_line(0.0, 0.0, 100.0, 2.0);
        set.push_line(0.0, 0.0, 60.0, 80.0);

        let result = normalizer().normalize(&set);
        assert_eq!(result.segments.len(), 2);
        assert_relative_eq!(result.segments[0].confidence.overall, 0.8);
        assert!(result.segments[0].data.is_horizontal);
        assert_relative_eq!(result.segments[1].confidence.overall, 0.6);
        assert_relative_eq!(result.segments[1].data.length, 100.0);
        assert_eq!(result.segments[1].id, 1);
    }

    #[test]
    fn test_short_line_is_dropped() {
        let mut set = PrimitiveSet::new();
        set.push_line(0.0, 0.0, 5.0, 0.0);

        let result = normalizer().normalize(&set);
        assert!(result.segments.is_empty());
        assert_eq!(result.too_short, 1);
    }

    #[test]
    fn test_edge_fixed_confidence() {
        let mut set = PrimitiveSet::new();
        set.push_edge(0.0, 0.0, 30.0, 40.0);

        let result = normalizer().normalize(&set);
        assert_eq!(result.segments.len(), 1);
        assert_relative_eq!(result.segments[0].confidence.overall, 0.75);
        assert_eq!(result.segments[0].data.origin, SegmentOrigin::Edge);
    }

    #[test]
    fn test_thin_rect_becomes_centerline() {
        // Both sides exceed min_length, one is below thickness_threshold.
        let config = NormalizerConfig {
            min_length: 10.0,
            thickness_threshold: 15.0,
        };
        let rect = RawPrimitive::Rect(RectPrimitive {
            x0: 0.0,
            y0: 0.0,
            x1: 200.0,
            y1: 12.0,
            width: 200.0,
            height: 12.0,
            stroke_width: None,
        });

        let segments = PrimitiveNormalizer::new(config).normalize_primitive(&rect);
        assert_eq!(segments.len(), 1);
        let wall = &segments[0];
        assert_eq!(wall.start(), Point2D::new(0.0, 6.0));
        assert_eq!(wall.end(), Point2D::new(200.0, 6.0));
        assert_relative_eq!(wall.data.thickness, 12.0);
        assert_relative_eq!(wall.confidence.overall, 0.85);
        assert_eq!(wall.data.origin, SegmentOrigin::RectWall);
    }

    #[test]
    fn test_vertical_thin_rect() {
        let config = NormalizerConfig {
            min_length: 10.0,
            thickness_threshold: 15.0,
        };
        let mut set = PrimitiveSet::new();
        set.push_rect(100.0, 0.0, 112.0, 300.0);

        let result = PrimitiveNormalizer::new(config).normalize(&set);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].start(), Point2D::new(106.0, 0.0));
        assert_eq!(result.segments[0].end(), Point2D::new(106.0, 300.0));
        assert!(result.segments[0].data.is_vertical);
    }

    #[test]
    fn test_rect_decomposes_into_sides() {
        let mut set = PrimitiveSet::new();
        set.push_rect(0.0, 0.0, 100.0, 50.0);

        let result = normalizer().normalize(&set);
        assert_eq!(result.segments.len(), 4);
        assert!(result
            .segments
            .iter()
            .all(|s| s.data.origin == SegmentOrigin::RectEdge));
        assert_relative_eq!(result.segments[0].confidence.overall, 0.75);
    }

    #[test]
    fn test_rect_short_sides_skipped() {
        // 100 x 10 with defaults: 10 < min_length, so not a thin wall; only
        // the two long sides survive.
        let mut set = PrimitiveSet::new();
        set.push_rect(0.0, 0.0, 100.0, 10.0);

        let result = normalizer().normalize(&set);
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.too_short, 2);
        assert!(result.segments.iter().all(|s| s.data.is_horizontal));
    }

    #[test]
    fn test_curve_chord() {
        let mut set = PrimitiveSet::new();
        set.push_curve(&[[0.0, 0.0], [15.0, 20.0], [30.0, 0.0]]);
        set.push_curve(&[[0.0, 0.0], [50.0, 50.0], [1.0, 1.0]]);

        let result = normalizer().normalize(&set);
        assert_eq!(result.segments.len(), 1);
        let chord = &result.segments[0];
        assert_eq!(chord.geometry, vec![Point2D::new(0.0, 0.0), Point2D::new(30.0, 0.0)]);
        assert_relative_eq!(chord.confidence.overall, 0.6);
        assert_eq!(result.too_short, 1);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let mut set = PrimitiveSet::new();
        set.lines.push(serde_json::json!({"x0": 0.0, "y0": 0.0}));
        set.push_line(0.0, 0.0, 50.0, 0.0);
        set.curves.push(serde_json::json!({"radius": 4.0}));

        let result = normalizer().normalize(&set);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.malformed, 2);
    }

    #[test]
    fn test_dedup_rounding_ties_go_away_from_zero() {
        // 0.25 rounds to 0.3, so it does not match 0.2.
        let mut set = PrimitiveSet::new();
        set.push_line(0.0, 0.0, 50.0, 0.25);
        set.push_line(0.0, 0.0, 50.0, 0.2);

        let result = normalizer().normalize(&set);
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.duplicates, 0);
    }

    #[test]
    fn test_dedup_ignores_direction_and_small_noise() {
        let mut set = PrimitiveSet::new();
        set.push_line(0.0, 0.0, 50.0, 0.0);
        set.push_line(50.0, 0.0, 0.0, 0.0);
        set.push_line(0.01, 0.02, 50.03, 0.0);
        set.push_line(0.0, 0.0, 50.0, 1.0);

        let result = normalizer().normalize(&set);
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.duplicates, 2);
        assert_eq!(result.segments[0].end(), Point2D::new(50.0, 0.0));
        assert_eq!(result.segments[1].end(), Point2D::new(50.0, 1.0));
        assert_eq!(result.segments[1].id, 1);
    }
}
