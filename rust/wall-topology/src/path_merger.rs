// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Path merging: every extracted path becomes one wall polyline.

use crate::error::{Error, Result};
use crate::types::{
    polyline_length, ConfidenceScore, ElementType, Geometry, MergedWall, MergedWallData,
    MergedWallMetadata, Point2D, WallPath,
};

const MERGE_SOURCE: &str = "topology_analysis";
const MERGE_TYPE: &str = "path_merge";

/// Walls produced from one path set
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub walls: Vec<MergedWall>,
    /// Paths whose polyline had fewer than 2 points
    pub degenerate: usize,
    /// Walls dropped by the minimum length filter
    pub short_removed: usize,
}

/// Merges paths into single wall objects
#[derive(Debug, Clone, Default)]
pub struct PathMerger {
    min_wall_length: Option<f64>,
}

impl PathMerger {
    /// A merger that keeps every non-degenerate path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop merged walls whose polyline is shorter than `min_wall_length`.
    pub fn with_min_wall_length(min_wall_length: f64) -> Self {
        Self {
            min_wall_length: Some(min_wall_length),
        }
    }

    /// Merge every path, in path order.
    pub fn merge(&self, paths: &[WallPath]) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for path in paths {
            let wall = match merge_path(path) {
                Ok(wall) => wall,
                Err(e) => {
                    tracing::debug!(path = path.index, error = %e, "dropping merged wall");
                    outcome.degenerate += 1;
                    continue;
                }
            };

            if let Some(min) = self.min_wall_length {
                if wall.data.length < min {
                    outcome.short_removed += 1;
                    continue;
                }
            }
            outcome.walls.push(wall);
        }

        tracing::debug!(
            paths = paths.len(),
            walls = outcome.walls.len(),
            degenerate = outcome.degenerate,
            short_removed = outcome.short_removed,
            "merged wall paths"
        );
        outcome
    }
}

/// Merge one path into a single wall.
pub fn merge_path(path: &WallPath) -> Result<MergedWall> {
    let points = merged_points(path);
    if points.len() < 2 {
        return Err(Error::DegenerateGeometry(format!(
            "path {} merges to {} point(s), a wall needs 2",
            path.index,
            points.len()
        )));
    }

    Ok(MergedWall {
        id: format!("wall_{}", path.index),
        element_type: ElementType::Wall,
        confidence: mean_confidence(path),
        data: MergedWallData {
            merged_from: path.segment_ids(),
            length: polyline_length(&points),
            segments: path.len(),
        },
        geometry: Geometry::line_string(&points),
        metadata: MergedWallMetadata {
            source: MERGE_SOURCE.to_string(),
            merge_type: MERGE_TYPE.to_string(),
        },
    })
}

/// Concatenated path points. A segment's first point is skipped when it is
/// exactly the last accumulated point.
pub fn merged_points(path: &WallPath) -> Vec<Point2D> {
    if let [only] = path.segments.as_slice() {
        return only.geometry.clone();
    }

    let mut points: Vec<Point2D> = Vec::new();
    for segment in &path.segments {
        let skip_first = match (points.last(), segment.geometry.first()) {
            (Some(last), Some(first)) => last == first,
            _ => false,
        };
        let from = usize::from(skip_first);
        points.extend_from_slice(&segment.geometry[from..]);
    }
    points
}

/// Per-component mean of the segment confidences, clamped to [0, 1].
pub fn mean_confidence(path: &WallPath) -> ConfidenceScore {
    if path.is_empty() {
        return ConfidenceScore::default();
    }

    let n = path.len() as f64;
    let sum = path
        .segments
        .iter()
        .map(|s| s.confidence)
        .fold(ConfidenceScore::new(0.0, 0.0, 0.0, 0.0), |acc, c| {
            ConfidenceScore::new(
                acc.overall + c.overall,
                acc.classification + c.classification,
                acc.position + c.position,
                acc.properties + c.properties,
            )
        });

    ConfidenceScore::new(
        sum.overall / n,
        sum.classification / n,
        sum.position / n,
        sum.properties / n,
    )
    .clamped()
}
