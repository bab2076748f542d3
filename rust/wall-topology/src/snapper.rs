// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Endpoint snapping onto shared connection points.
//!
//! Segment endpoints are visited in order (first point, then last point of
//! each segment). Every endpoint either resolves to an already registered
//! connection point within `snap_distance` or is registered itself. With
//! [`SnapPolicy::FirstMatch`] the resolved point is the earliest registered
//! one in range, not the closest. [`SnapPolicy::Nearest`] picks the closest.
//!
//! Registered points are pairwise further apart than `snap_distance`, so
//! snapping already-snapped segments is a no-op.

use rustc_hash::FxHashMap;

use crate::config::SnapPolicy;
use crate::types::{Point2D, WallSegment};

/// A 2D spatial hash grid over registered connection points.
///
/// The grid divides the plane into square cells of side `cell_size`.
/// Lookups check the 3x3 neighbourhood of the query cell, so the query
/// tolerance must be <= `cell_size`. Points keep their registration index,
/// which is what "first match" is defined over.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    points: Vec<Point2D>,
    grid: FxHashMap<(i64, i64), Vec<usize>>,
}

impl SpatialIndex {
    /// Creates a new spatial index with the given cell size.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            points: Vec::new(),
            grid: FxHashMap::default(),
        }
    }

    /// Registers a point and returns its registration index.
    pub fn insert(&mut self, point: Point2D) -> usize {
        let idx = self.points.len();
        self.points.push(point);
        let cell = self.cell_coords(&point);
        self.grid.entry(cell).or_default().push(idx);
        idx
    }

    pub fn point(&self, idx: usize) -> Point2D {
        self.points[idx]
    }

    /// All registered points in registration order.
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Earliest registered point within `tolerance` of `query`.
    pub fn find_first_within(&self, query: &Point2D, tolerance: f64) -> Option<usize> {
        self.candidates_within(query, tolerance)
            .map(|(idx, _)| idx)
            .min()
    }

    /// Closest registered point within `tolerance`; ties go to the earlier
    /// registration.
    pub fn find_nearest_within(&self, query: &Point2D, tolerance: f64) -> Option<usize> {
        self.candidates_within(query, tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(idx, _)| idx)
    }

    /// (registration index, squared distance) of every point in range.
    fn candidates_within<'a>(
        &'a self,
        query: &'a Point2D,
        tolerance: f64,
    ) -> impl Iterator<Item = (usize, f64)> + 'a {
        let (cx, cy) = self.cell_coords(query);
        let tol_sq = tolerance * tolerance;

        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(move |cell| self.grid.get(&cell))
            .flatten()
            .filter_map(move |&idx| {
                let p = &self.points[idx];
                let dist_sq = (p.x - query.x).powi(2) + (p.y - query.y).powi(2);
                (dist_sq <= tol_sq).then_some((idx, dist_sq))
            })
    }

    fn cell_coords(&self, p: &Point2D) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }
}

/// Merges nearby segment endpoints into shared connection points.
///
/// One snapper owns the connection-point registry of one pipeline run.
#[derive(Debug, Clone)]
pub struct EndpointSnapper {
    snap_distance: f64,
    policy: SnapPolicy,
    index: SpatialIndex,
    snapped: usize,
}

impl EndpointSnapper {
    /// `snap_distance` must be positive; [`crate::TopologyConfig::validate`]
    /// guarantees this for configured runs.
    pub fn new(snap_distance: f64, policy: SnapPolicy) -> Self {
        Self {
            snap_distance,
            policy,
            index: SpatialIndex::new(snap_distance),
            snapped: 0,
        }
    }

    /// Resolve a point to a registered connection point, registering it
    /// when nothing is in range.
    pub fn snap_point(&mut self, point: Point2D) -> Point2D {
        let found = match self.policy {
            SnapPolicy::FirstMatch => self.index.find_first_within(&point, self.snap_distance),
            SnapPolicy::Nearest => self.index.find_nearest_within(&point, self.snap_distance),
        };

        match found {
            Some(idx) => {
                let target = self.index.point(idx);
                if target != point {
                    self.snapped += 1;
                }
                target
            }
            None => {
                self.index.insert(point);
                point
            }
        }
    }

    /// Rewrite the first and last point of every segment.
    pub fn snap(&mut self, mut segments: Vec<WallSegment>) -> Vec<WallSegment> {
        for segment in &mut segments {
            if !segment.is_well_formed() {
                continue;
            }
            let last = segment.geometry.len() - 1;
            segment.geometry[0] = self.snap_point(segment.geometry[0]);
            segment.geometry[last] = self.snap_point(segment.geometry[last]);
        }

        tracing::debug!(
            segments = segments.len(),
            connection_points = self.index.len(),
            moved = self.snapped,
            "snapped endpoints"
        );
        segments
    }

    /// Registered connection points in discovery order.
    pub fn connection_points(&self) -> &[Point2D] {
        self.index.points()
    }

    /// Number of endpoints moved onto a different registered point.
    pub fn snapped_count(&self) -> usize {
        self.snapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::segment_between as seg;

    #[test]
    fn test_spatial_index_first_vs_nearest() {
        let mut index = SpatialIndex::new(10.0);
        index.insert(Point2D::new(0.0, 0.0));
        index.insert(Point2D::new(8.0, 0.0));

        let query = Point2D::new(7.0, 0.0);
        assert_eq!(index.find_first_within(&query, 10.0), Some(0));
        assert_eq!(index.find_nearest_within(&query, 10.0), Some(1));
        assert_eq!(index.find_first_within(&Point2D::new(50.0, 0.0), 10.0), None);
    }

    #[test]
    fn test_spatial_index_crosses_cell_boundaries() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(Point2D::new(-0.2, 0.9));
        assert_eq!(index.find_first_within(&Point2D::new(0.1, 1.1), 1.0), Some(0));
        assert_eq!(index.find_first_within(&Point2D::new(1.5, 1.5), 1.0), None);
    }

    #[test]
    fn test_snap_joins_close_endpoints() {
        let segments = vec![seg(0, (0.0, 0.0), (100.0, 0.0)), seg(1, (100.5, 0.0), (200.0, 0.0))];
        let mut snapper = EndpointSnapper::new(10.0, SnapPolicy::FirstMatch);
        let snapped = snapper.snap(segments);

        assert_eq!(snapped[1].start(), Point2D::new(100.0, 0.0));
        assert_eq!(snapper.connection_points().len(), 3);
        assert_eq!(snapper.snapped_count(), 1);
    }

    #[test]
    fn test_snap_respects_distance() {
        let segments = vec![seg(0, (0.0, 0.0), (100.0, 0.0)), seg(1, (100.5, 0.0), (200.0, 0.0))];
        let mut snapper = EndpointSnapper::new(0.1, SnapPolicy::FirstMatch);
        let snapped = snapper.snap(segments);

        assert_eq!(snapped[1].start(), Point2D::new(100.5, 0.0));
        assert_eq!(snapper.connection_points().len(), 4);
    }

    #[test]
    fn test_first_match_is_discovery_order() {
        // (9,1) is in range of both (0,0) and (12,0); (0,0) was registered first.
        let segments = vec![
            seg(0, (0.0, 0.0), (0.0, 50.0)),
            seg(1, (12.0, 0.0), (12.0, 50.0)),
            seg(2, (9.0, 1.0), (9.0, 80.0)),
        ];

        let mut first = EndpointSnapper::new(10.0, SnapPolicy::FirstMatch);
        let snapped = first.snap(segments.clone());
        assert_eq!(snapped[2].start(), Point2D::new(0.0, 0.0));

        let mut nearest = EndpointSnapper::new(10.0, SnapPolicy::Nearest);
        let snapped = nearest.snap(segments);
        assert_eq!(snapped[2].start(), Point2D::new(12.0, 0.0));
    }

    #[test]
    fn test_snapping_is_idempotent() {
        let segments = vec![
            seg(0, (0.0, 0.0), (100.0, 0.3)),
            seg(1, (100.4, 0.0), (100.0, 99.0)),
            seg(2, (99.0, 100.0), (0.5, 100.0)),
            seg(3, (0.0, 100.2), (0.2, 0.1)),
        ];

        let once = EndpointSnapper::new(10.0, SnapPolicy::FirstMatch).snap(segments);
        let twice = EndpointSnapper::new(10.0, SnapPolicy::FirstMatch).snap(once.clone());
        assert_eq!(once, twice);
    }
}
