// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall and room reconstruction from vector floor plan primitives
//!
//! This crate turns the disconnected line, edge, rectangle and curve
//! primitives of a vector drawing into:
//! 1. Normalized, deduplicated wall segments
//! 2. Shared connection points (endpoint snapping)
//! 3. A connectivity graph over those points
//! 4. Ordered wall paths (angle-guided traversal)
//! 5. Room polygons from closed paths
//! 6. One merged wall polyline per path
//!
//! # Usage
//!
//! ```rust,ignore
//! use ifc_lite_wall_topology::{PrimitiveSet, TopologyConfig, WallTopologyAnalyzer};
//!
//! let primitives: PrimitiveSet = serde_json::from_str(&json)?;
//! let analyzer = WallTopologyAnalyzer::new(TopologyConfig::default())?;
//! let result = analyzer.analyze(&primitives);
//!
//! for room in &result.rooms {
//!     println!("{}: area {:.1}", room.id, room.data.area);
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod normalizer;
pub mod path_extractor;
pub mod path_merger;
pub mod primitives;
pub mod room_detector;
pub mod snapper;
pub mod types;

// Re-export commonly used types and functions
pub use config::{NormalizerConfig, SnapPolicy, TopologyConfig};
pub use error::{Error, Result};
pub use graph::ConnectivityGraph;
pub use normalizer::{NormalizedSegments, PrimitiveNormalizer};
pub use path_extractor::PathExtractor;
pub use path_merger::{MergeOutcome, PathMerger};
pub use primitives::{PrimitiveKind, PrimitiveSet, RawPrimitive};
pub use room_detector::{RoomDetection, RoomDetector};
pub use snapper::{EndpointSnapper, SpatialIndex};
pub use types::{
    ConfidenceScore, Geometry, MergedWall, Point2D, Room, TopologyResult, TopologyStats,
    WallPath, WallSegment,
};

use rayon::prelude::*;

/// Runs the full reconstruction pipeline with one validated configuration.
///
/// Every call to [`analyze`](Self::analyze) owns its working set, so one
/// analyzer can serve many pages concurrently.
#[derive(Debug, Clone)]
pub struct WallTopologyAnalyzer {
    config: TopologyConfig,
}

impl WallTopologyAnalyzer {
    /// Fails with [`Error::InvalidConfig`] on unusable settings.
    pub fn new(config: TopologyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Reconstruct walls and rooms from one drawing.
    ///
    /// Steps:
    /// 1. Normalize and deduplicate primitives
    /// 2. Snap endpoints onto connection points
    /// 3. Build the connectivity graph
    /// 4. Extract paths
    /// 5. Detect rooms from closed paths
    /// 6. Merge every path into a wall
    pub fn analyze(&self, primitives: &PrimitiveSet) -> TopologyResult {
        let span = tracing::debug_span!("wall_topology", primitives = primitives.len());
        let _guard = span.enter();

        let mut stats = TopologyStats {
            primitives_in: primitives.len(),
            ..Default::default()
        };

        // Step 1: Normalize
        let normalizer = PrimitiveNormalizer::new(self.config.normalizer.clone());
        let normalized = normalizer.normalize(primitives);
        stats.malformed_skipped = normalized.malformed;
        stats.too_short_skipped = normalized.too_short;
        stats.duplicates_removed = normalized.duplicates;
        stats.segments = normalized.segments.len();

        // Step 2: Snap
        let mut snapper = EndpointSnapper::new(self.config.snap_distance, self.config.snap_policy);
        let segments = snapper.snap(normalized.segments);
        stats.connection_points = snapper.connection_points().len();
        stats.snapped_endpoints = snapper.snapped_count();

        // Step 3: Graph
        let graph = ConnectivityGraph::build(&segments);
        stats.dangling_endpoints = graph.dangling_count();

        // Step 4: Paths
        let paths = PathExtractor::new(self.config.angle_tolerance).extract(&segments, &graph);
        stats.paths = paths.len();

        // Step 5: Rooms
        let detection = RoomDetector::new(self.config.snap_distance).detect(&paths);
        stats.closed_paths = detection.closed_paths;
        stats.rooms = detection.rooms.len();
        stats.degenerate_rooms = detection.degenerate;

        // Step 6: Merged walls
        let merger = if self.config.enforce_min_wall_length {
            PathMerger::with_min_wall_length(self.config.min_wall_length)
        } else {
            PathMerger::new()
        };
        let merged = merger.merge(&paths);
        stats.merged_walls = merged.walls.len();
        stats.degenerate_walls = merged.degenerate;
        stats.short_walls_removed = merged.short_removed;

        tracing::debug!(
            walls = stats.merged_walls,
            rooms = stats.rooms,
            "wall topology complete"
        );

        TopologyResult {
            merged_walls: merged.walls,
            rooms: detection.rooms,
            stats,
        }
    }

    /// Analyze independent pages in parallel; results keep page order.
    pub fn analyze_pages(&self, pages: &[PrimitiveSet]) -> Vec<TopologyResult> {
        pages.par_iter().map(|page| self.analyze(page)).collect()
    }
}

/// High-level function to reconstruct walls and rooms from one drawing
///
/// # Arguments
///
/// * `primitives` - Raw drawing primitives of a single page
/// * `config` - Pipeline configuration; validated before use
pub fn analyze_primitives(
    primitives: &PrimitiveSet,
    config: &TopologyConfig,
) -> Result<TopologyResult> {
    let analyzer = WallTopologyAnalyzer::new(config.clone())?;
    Ok(analyzer.analyze(primitives))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_config() -> TopologyConfig {
        let mut config = TopologyConfig::new(1.0, 5.0).unwrap();
        config.normalizer.min_length = 1.0;
        config
    }

    fn square(set: &mut PrimitiveSet, x: f64, y: f64, size: f64) {
        set.push_line(x, y, x + size, y)
            .push_line(x + size, y, x + size, y + size)
            .push_line(x + size, y + size, x, y + size)
            .push_line(x, y + size, x, y);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TopologyConfig {
            snap_distance: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            WallTopologyAnalyzer::new(config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_analyze_square_room() {
        let mut set = PrimitiveSet::new();
        square(&mut set, 0.0, 0.0, 10.0);

        let result = analyze_primitives(&set, &small_config()).unwrap();
        assert_eq!(result.rooms.len(), 1);
        assert_eq!(result.merged_walls.len(), 1);
        assert_relative_eq!(result.rooms[0].data.area, 100.0);
        assert_eq!(result.stats.segments, 4);
        assert_eq!(result.stats.connection_points, 4);
        assert_eq!(result.stats.dangling_endpoints, 0);
        assert_eq!(result.stats.closed_paths, 1);
    }

    #[test]
    fn test_stats_count_skipped_records() {
        let mut set = PrimitiveSet::new();
        set.push_line(0.0, 0.0, 10.0, 0.0)
            .push_line(10.0, 0.0, 0.0, 0.0)
            .push_line(0.0, 0.0, 0.5, 0.0);
        set.lines.push(serde_json::json!({"x0": 1.0}));

        let result = analyze_primitives(&set, &small_config()).unwrap();
        assert_eq!(result.stats.primitives_in, 4);
        assert_eq!(result.stats.malformed_skipped, 1);
        assert_eq!(result.stats.too_short_skipped, 1);
        assert_eq!(result.stats.duplicates_removed, 1);
        assert_eq!(result.stats.segments, 1);
    }

    #[test]
    fn test_min_wall_length_only_when_enforced() {
        let mut set = PrimitiveSet::new();
        set.push_line(0.0, 0.0, 10.0, 0.0);
        set.push_line(0.0, 50.0, 100.0, 50.0);

        let mut config = small_config();
        config.min_wall_length = 50.0;
        let lenient = analyze_primitives(&set, &config).unwrap();
        assert_eq!(lenient.merged_walls.len(), 2);

        config.enforce_min_wall_length = true;
        let strict = analyze_primitives(&set, &config).unwrap();
        assert_eq!(strict.merged_walls.len(), 1);
        assert_eq!(strict.merged_walls[0].id, "wall_1");
        assert_eq!(strict.stats.short_walls_removed, 1);
    }

    #[test]
    fn test_analyze_pages_keeps_order() {
        let mut first = PrimitiveSet::new();
        square(&mut first, 0.0, 0.0, 10.0);
        let mut second = PrimitiveSet::new();
        second.push_line(0.0, 0.0, 30.0, 0.0);

        let analyzer = WallTopologyAnalyzer::new(small_config()).unwrap();
        let results = analyzer.analyze_pages(&[first, second, PrimitiveSet::new()]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].rooms.len(), 1);
        assert!(results[1].rooms.is_empty());
        assert_eq!(results[1].merged_walls.len(), 1);
        assert_eq!(results[1].stats.dangling_endpoints, 2);
        assert!(results[2].merged_walls.is_empty());
        assert_eq!(results[2].stats, TopologyStats::default());
    }
}
