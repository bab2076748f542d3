// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for wall topology reconstruction

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Deserializer, Serialize};

/// Default per-component confidence for segments that carry none.
pub const DEFAULT_SEGMENT_CONFIDENCE: f64 = 0.7;

/// A 2D point (simplified for serialization)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        nalgebra::distance(&self.to_nalgebra(), &other.to_nalgebra())
    }

    /// Vector from `self` to `other`.
    pub fn vector_to(&self, other: &Point2D) -> Vector2<f64> {
        other.to_nalgebra() - self.to_nalgebra()
    }

    pub fn to_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Exact-equality hash key. Connection points are identified by their
    /// coordinates after snapping, so this is the node identity of the graph.
    pub fn key(&self) -> PointKey {
        PointKey(canonical_bits(self.x), canonical_bits(self.y))
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

/// Bit-pattern key of a [`Point2D`], with `-0.0` folded onto `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey(u64, u64);

impl PointKey {
    pub fn point(&self) -> Point2D {
        Point2D::new(f64::from_bits(self.0), f64::from_bits(self.1))
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Four-component reliability score, each component in [0, 1]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceScore {
    pub overall: f64,
    pub classification: f64,
    pub position: f64,
    pub properties: f64,
}

impl ConfidenceScore {
    pub fn new(overall: f64, classification: f64, position: f64, properties: f64) -> Self {
        Self {
            overall,
            classification,
            position,
            properties,
        }
    }

    /// Derive the full score from a kind-specific base confidence:
    /// position is weighted 0.9, properties 0.8.
    pub fn from_base(base: f64) -> Self {
        Self {
            overall: base,
            classification: base,
            position: base * 0.9,
            properties: base * 0.8,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            overall: self.overall.clamp(0.0, 1.0),
            classification: self.classification.clamp(0.0, 1.0),
            position: self.position.clamp(0.0, 1.0),
            properties: self.properties.clamp(0.0, 1.0),
        }
    }
}

impl Default for ConfidenceScore {
    fn default() -> Self {
        Self::new(
            DEFAULT_SEGMENT_CONFIDENCE,
            DEFAULT_SEGMENT_CONFIDENCE,
            DEFAULT_SEGMENT_CONFIDENCE,
            DEFAULT_SEGMENT_CONFIDENCE,
        )
    }
}

/// Which normalization rule produced a segment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SegmentOrigin {
    Line,
    Edge,
    /// Centerline of a thin filled rectangle
    RectWall,
    /// One side of a rectangle outline
    RectEdge,
    /// Chord of a curve
    Curve,
}

impl SegmentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentOrigin::Line => "line",
            SegmentOrigin::Edge => "edge",
            SegmentOrigin::RectWall => "rect_wall",
            SegmentOrigin::RectEdge => "rect_edge",
            SegmentOrigin::Curve => "curve",
        }
    }
}

impl std::fmt::Display for SegmentOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived per-segment measurements
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentData {
    pub length: f64,
    pub thickness: f64,
    pub is_horizontal: bool,
    pub is_vertical: bool,
    pub origin: SegmentOrigin,
}

/// Where a segment came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentMetadata {
    pub extractor: String,
    pub method: String,
}

/// Atomic straight wall segment produced by normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallSegment {
    /// Run-local identity (index into the normalized segment list)
    pub id: usize,
    /// Ordered points; at least start and end
    #[serde(deserialize_with = "deserialize_polyline")]
    pub geometry: Vec<Point2D>,
    #[serde(default)]
    pub confidence: ConfidenceScore,
    pub data: SegmentData,
    pub metadata: SegmentMetadata,
}

/// Rejects segment geometry with fewer than two points.
fn deserialize_polyline<'de, D>(deserializer: D) -> std::result::Result<Vec<Point2D>, D::Error>
where
    D: Deserializer<'de>,
{
    let points = Vec::<Point2D>::deserialize(deserializer)?;
    if points.len() < 2 {
        return Err(serde::de::Error::invalid_length(
            points.len(),
            &"at least 2 points",
        ));
    }
    Ok(points)
}

impl WallSegment {
    /// Whether the geometry has both a start and an end point.
    pub fn is_well_formed(&self) -> bool {
        self.geometry.len() >= 2
    }

    /// First point. Panics on geometry shorter than two points; see
    /// [`is_well_formed`](Self::is_well_formed).
    pub fn start(&self) -> Point2D {
        self.geometry[0]
    }

    pub fn end(&self) -> Point2D {
        self.geometry[self.geometry.len() - 1]
    }

    /// Whole-segment direction in degrees, from first to last point.
    pub fn direction_degrees(&self) -> f64 {
        let v = self.start().vector_to(&self.end());
        v.y.atan2(v.x).to_degrees()
    }

    pub fn length(&self) -> f64 {
        polyline_length(&self.geometry)
    }
}

/// Ordered chain of segments produced by graph traversal
#[derive(Debug, Clone, PartialEq)]
pub struct WallPath {
    /// Position of the path in extraction order; used to derive output ids
    pub index: usize,
    pub segments: Vec<WallSegment>,
}

impl WallPath {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first_point(&self) -> Option<Point2D> {
        self.segments.first().map(|s| s.start())
    }

    pub fn last_point(&self) -> Option<Point2D> {
        self.segments.last().map(|s| s.end())
    }

    /// A path is closed when it has at least three segments and its ends
    /// meet within `2 * snap_distance`.
    pub fn is_closed(&self, snap_distance: f64) -> bool {
        if self.segments.len() < 3 {
            return false;
        }
        match (self.first_point(), self.last_point()) {
            (Some(first), Some(last)) => first.distance_to(&last) <= 2.0 * snap_distance,
            _ => false,
        }
    }

    pub fn segment_ids(&self) -> Vec<usize> {
        self.segments.iter().map(|s| s.id).collect()
    }
}

/// Sum of consecutive point distances
pub fn polyline_length(points: &[Point2D]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Output element type tag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Wall,
    Room,
}

/// GeoJSON-style geometry of an output element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<[f64; 2]> },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

impl Geometry {
    pub fn line_string(points: &[Point2D]) -> Self {
        Geometry::LineString {
            coordinates: points.iter().map(Point2D::to_array).collect(),
        }
    }

    pub fn polygon(ring: &[Point2D]) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring.iter().map(Point2D::to_array).collect()],
        }
    }

    /// Line string coordinates, or the outer ring of a polygon.
    pub fn points(&self) -> Vec<Point2D> {
        match self {
            Geometry::LineString { coordinates } => {
                coordinates.iter().copied().map(Point2D::from).collect()
            }
            Geometry::Polygon { coordinates } => coordinates
                .first()
                .map(|ring| ring.iter().copied().map(Point2D::from).collect())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedWallData {
    /// Ids of the constituent segments, in traversal order
    pub merged_from: Vec<usize>,
    pub length: f64,
    pub segments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedWallMetadata {
    pub source: String,
    pub merge_type: String,
}

/// A whole path merged into one wall polyline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedWall {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub geometry: Geometry,
    pub confidence: ConfidenceScore,
    pub data: MergedWallData,
    pub metadata: MergedWallMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomData {
    pub wall_count: usize,
    pub area: f64,
    pub perimeter: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomMetadata {
    pub source: String,
    pub detection_method: String,
}

/// Room polygon derived from a closed path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub geometry: Geometry,
    pub confidence: ConfidenceScore,
    pub data: RoomData,
    pub metadata: RoomMetadata,
}

impl Room {
    /// Calculate polygon area using shoelace formula
    ///
    /// Works on open or closed rings; a repeated closing point contributes
    /// a zero term.
    pub fn calculate_area(points: &[Point2D]) -> f64 {
        let n = points.len();
        if n < 3 {
            return 0.0;
        }

        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += points[i].x * points[j].y;
            area -= points[j].x * points[i].y;
        }

        (area / 2.0).abs()
    }

    pub fn ring(&self) -> Vec<Point2D> {
        self.geometry.points()
    }
}

/// Counters collected across one pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyStats {
    pub primitives_in: usize,
    pub malformed_skipped: usize,
    pub too_short_skipped: usize,
    pub duplicates_removed: usize,
    pub segments: usize,
    pub connection_points: usize,
    pub snapped_endpoints: usize,
    /// Connection points reached by a single segment (open wall ends)
    pub dangling_endpoints: usize,
    pub paths: usize,
    pub closed_paths: usize,
    pub rooms: usize,
    pub degenerate_rooms: usize,
    pub merged_walls: usize,
    pub degenerate_walls: usize,
    pub short_walls_removed: usize,
}

/// Complete reconstruction result for one drawing/page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TopologyResult {
    pub merged_walls: Vec<MergedWall>,
    pub rooms: Vec<Room>,
    pub stats: TopologyStats,
}

/// Two-point line segment for unit tests.
#[cfg(test)]
pub(crate) fn segment_between(id: usize, a: (f64, f64), b: (f64, f64)) -> WallSegment {
    let start = Point2D::new(a.0, a.1);
    let end = Point2D::new(b.0, b.1);
    WallSegment {
        id,
        geometry: vec![start, end],
        confidence: ConfidenceScore::default(),
        data: SegmentData {
            length: start.distance_to(&end),
            thickness: 1.0,
            is_horizontal: (b.1 - a.1).abs() < 5.0,
            is_vertical: (b.0 - a.0).abs() < 5.0,
            origin: SegmentOrigin::Line,
        },
        metadata: SegmentMetadata {
            extractor: "test".into(),
            method: "test".into(),
        },
    }
}
