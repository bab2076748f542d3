// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Path extraction by directed breadth-first traversal of the connectivity
//! graph.

use std::collections::VecDeque;

use crate::graph::ConnectivityGraph;
use crate::types::{WallPath, WallSegment};

/// Grows ordered segment chains from the connectivity graph
#[derive(Debug, Clone)]
pub struct PathExtractor {
    angle_tolerance: f64,
}

impl PathExtractor {
    /// `angle_tolerance` is in degrees.
    pub fn new(angle_tolerance: f64) -> Self {
        Self { angle_tolerance }
    }

    /// Extract paths covering every segment exactly once.
    ///
    /// Seeds are taken in segment order. Each path is grown breadth-first:
    /// a dequeued segment is marked visited and appended, then every
    /// unvisited segment incident on its end point that is a reasonable
    /// continuation is enqueued. The path is the dequeue order.
    ///
    /// `segments[i].id` must equal `i`, as produced by normalization.
    pub fn extract(&self, segments: &[WallSegment], graph: &ConnectivityGraph) -> Vec<WallPath> {
        let mut visited = vec![false; segments.len()];
        let mut paths = Vec::new();

        for seed in 0..segments.len() {
            if visited[seed] {
                continue;
            }

            let mut path = Vec::new();
            let mut queue = VecDeque::from([seed]);

            while let Some(current) = queue.pop_front() {
                if visited[current] {
                    continue;
                }
                visited[current] = true;
                path.push(segments[current].clone());

                for &candidate in graph.continuations(current) {
                    if candidate < segments.len()
                        && !visited[candidate]
                        && self.is_reasonable_continuation(&segments[current], &segments[candidate])
                    {
                        queue.push_back(candidate);
                    }
                }
            }

            paths.push(WallPath {
                index: paths.len(),
                segments: path,
            });
        }

        tracing::debug!(
            segments = segments.len(),
            paths = paths.len(),
            "extracted wall paths"
        );
        paths
    }

    /// Near-colinear or near-perpendicular (wall corner) continuation.
    ///
    /// Directions are whole-segment, first to last point, so a colinear
    /// segment drawn in the opposite direction (180°) is rejected.
    pub fn is_reasonable_continuation(&self, current: &WallSegment, candidate: &WallSegment) -> bool {
        let diff = angle_difference(current.direction_degrees(), candidate.direction_degrees());
        diff < self.angle_tolerance || (diff - 90.0).abs() < self.angle_tolerance
    }
}

/// Absolute difference of two directions in degrees, folded into [0, 180].
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::segment_between as seg;
    use approx::assert_relative_eq;

    fn ids(path: &WallPath) -> Vec<usize> {
        path.segment_ids()
    }

    #[test]
    fn test_angle_difference() {
        assert_relative_eq!(angle_difference(0.0, 90.0), 90.0);
        assert_relative_eq!(angle_difference(170.0, -170.0), 20.0);
        assert_relative_eq!(angle_difference(0.0, 180.0), 180.0);
        assert_relative_eq!(angle_difference(-90.0, 180.0), 90.0);
    }

    #[test]
    fn test_reasonable_continuation() {
        let extractor = PathExtractor::new(5.0);
        let east = seg(0, (0.0, 0.0), (10.0, 0.0));

        assert!(extractor.is_reasonable_continuation(&east, &seg(1, (10.0, 0.0), (20.0, 0.3))));
        assert!(extractor.is_reasonable_continuation(&east, &seg(1, (10.0, 0.0), (10.0, 10.0))));
        assert!(extractor.is_reasonable_continuation(&east, &seg(1, (10.0, 10.0), (10.0, 0.0))));
        // reversed colinear
        assert!(!extractor.is_reasonable_continuation(&east, &seg(1, (20.0, 0.0), (10.0, 0.0))));
        // 45 degrees
        assert!(!extractor.is_reasonable_continuation(&east, &seg(1, (10.0, 0.0), (20.0, 10.0))));
    }

    #[test]
    fn test_colinear_chain_forms_one_path() {
        let segments = vec![
            seg(0, (0.0, 0.0), (10.0, 0.0)),
            seg(1, (10.0, 0.0), (20.0, 0.0)),
            seg(2, (20.0, 0.0), (30.0, 0.0)),
        ];
        let graph = ConnectivityGraph::build(&segments);
        let paths = PathExtractor::new(5.0).extract(&segments, &graph);

        assert_eq!(paths.len(), 1);
        assert_eq!(ids(&paths[0]), vec![0, 1, 2]);
        assert_eq!(paths[0].index, 0);
    }

    #[test]
    fn test_growth_never_leaves_through_start() {
        // Segment 1 ends where segment 0 starts; it can't extend path 0.
        let segments = vec![
            seg(0, (10.0, 0.0), (20.0, 0.0)),
            seg(1, (0.0, 0.0), (10.0, 0.0)),
        ];
        let graph = ConnectivityGraph::build(&segments);
        let paths = PathExtractor::new(5.0).extract(&segments, &graph);

        assert_eq!(paths.len(), 2);
        assert_eq!(ids(&paths[0]), vec![0]);
        assert_eq!(ids(&paths[1]), vec![1]);
        assert_eq!(paths[1].index, 1);
    }

    #[test]
    fn test_branches_flatten_in_dequeue_order() {
        // T junction at (10,0): both the colinear and the perpendicular
        // branch are enqueued from segment 0.
        let segments = vec![
            seg(0, (0.0, 0.0), (10.0, 0.0)),
            seg(1, (10.0, 0.0), (10.0, 10.0)),
            seg(2, (10.0, 0.0), (20.0, 0.0)),
            seg(3, (20.0, 0.0), (30.0, 0.0)),
        ];
        let graph = ConnectivityGraph::build(&segments);
        let paths = PathExtractor::new(5.0).extract(&segments, &graph);

        assert_eq!(paths.len(), 1);
        assert_eq!(ids(&paths[0]), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_sharp_turn_splits_paths() {
        let segments = vec![
            seg(0, (0.0, 0.0), (10.0, 0.0)),
            seg(1, (10.0, 0.0), (20.0, 10.0)),
        ];
        let graph = ConnectivityGraph::build(&segments);
        let paths = PathExtractor::new(5.0).extract(&segments, &graph);

        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_square_loop_is_one_closed_path() {
        let segments = vec![
            seg(0, (0.0, 0.0), (10.0, 0.0)),
            seg(1, (10.0, 0.0), (10.0, 10.0)),
            seg(2, (10.0, 10.0), (0.0, 10.0)),
            seg(3, (0.0, 10.0), (0.0, 0.0)),
        ];
        let graph = ConnectivityGraph::build(&segments);
        let paths = PathExtractor::new(5.0).extract(&segments, &graph);

        assert_eq!(paths.len(), 1);
        assert_eq!(ids(&paths[0]), vec![0, 1, 2, 3]);
        assert!(paths[0].is_closed(1.0));
    }
}
