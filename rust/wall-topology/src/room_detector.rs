// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room detection from closed wall paths

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::types::{
    polyline_length, ConfidenceScore, ElementType, Geometry, Point2D, Room, RoomData,
    RoomMetadata, WallPath,
};

/// Rooms get fixed confidence; it is not derived from the wall segments.
pub const ROOM_CONFIDENCE: ConfidenceScore = ConfidenceScore {
    overall: 0.85,
    classification: 0.9,
    position: 0.85,
    properties: 0.8,
};

const ROOM_SOURCE: &str = "topology_analysis";
const DETECTION_METHOD: &str = "closed_path";

/// Rooms found in one path set
#[derive(Debug, Clone, Default)]
pub struct RoomDetection {
    pub rooms: Vec<Room>,
    /// Paths that passed the closure test
    pub closed_paths: usize,
    /// Closed paths dropped for having fewer than 3 distinct points
    pub degenerate: usize,
}

/// Turns closed paths into room polygons
#[derive(Debug, Clone)]
pub struct RoomDetector {
    snap_distance: f64,
}

impl RoomDetector {
    pub fn new(snap_distance: f64) -> Self {
        Self { snap_distance }
    }

    /// Detect rooms from every closed path, in path order.
    pub fn detect(&self, paths: &[WallPath]) -> RoomDetection {
        let mut detection = RoomDetection::default();

        for path in paths.iter().filter(|p| p.is_closed(self.snap_distance)) {
            detection.closed_paths += 1;
            match room_from_path(path) {
                Ok(room) => detection.rooms.push(room),
                Err(e) => {
                    tracing::debug!(path = path.index, error = %e, "dropping room");
                    detection.degenerate += 1;
                }
            }
        }

        tracing::debug!(
            paths = paths.len(),
            closed = detection.closed_paths,
            rooms = detection.rooms.len(),
            "detected rooms"
        );
        detection
    }
}

/// Build the room polygon of a closed path.
///
/// The closure test is the caller's responsibility.
pub fn room_from_path(path: &WallPath) -> Result<Room> {
    let ring = closed_ring(path)?;
    let area = Room::calculate_area(&ring);
    let perimeter = polyline_length(&ring);

    Ok(Room {
        id: format!("room_{}", path.index),
        element_type: ElementType::Room,
        geometry: Geometry::polygon(&ring),
        confidence: ROOM_CONFIDENCE,
        data: RoomData {
            wall_count: path.len(),
            area,
            perimeter,
        },
        metadata: RoomMetadata {
            source: ROOM_SOURCE.to_string(),
            detection_method: DETECTION_METHOD.to_string(),
        },
    })
}

/// All path points, globally deduplicated in first-seen order, with the
/// first point repeated at the end.
pub fn closed_ring(path: &WallPath) -> Result<Vec<Point2D>> {
    let mut seen = FxHashSet::default();
    let mut ring: Vec<Point2D> = path
        .segments
        .iter()
        .flat_map(|s| s.geometry.iter().copied())
        .filter(|p| seen.insert(p.key()))
        .collect();

    if ring.len() < 3 {
        return Err(Error::DegenerateGeometry(format!(
            "path {} has {} distinct points, a room needs 3",
            path.index,
            ring.len()
        )));
    }

    if ring.first() != ring.last() {
        ring.push(ring[0]);
    }
    Ok(ring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::segment_between as seg;
    use approx::assert_relative_eq;

    fn square_path() -> WallPath {
        WallPath {
            index: 2,
            segments: vec![
                seg(0, (0.0, 0.0), (10.0, 0.0)),
                seg(1, (10.0, 0.0), (10.0, 10.0)),
                seg(2, (10.0, 10.0), (0.0, 10.0)),
                seg(3, (0.0, 10.0), (0.0, 0.0)),
            ],
        }
    }

    #[test]
    fn test_square_room() {
        let detection = RoomDetector::new(1.0).detect(&[square_path()]);
        assert_eq!(detection.rooms.len(), 1);
        assert_eq!(detection.closed_paths, 1);

        let room = &detection.rooms[0];
        assert_eq!(room.id, "room_2");
        assert_eq!(room.element_type, ElementType::Room);
        assert_relative_eq!(room.data.area, 100.0);
        assert_relative_eq!(room.data.perimeter, 40.0);
        assert_eq!(room.data.wall_count, 4);
        assert_eq!(room.confidence, ROOM_CONFIDENCE);

        let ring = room.ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_open_and_short_paths_are_not_rooms() {
        let open = WallPath {
            index: 0,
            segments: vec![
                seg(0, (0.0, 0.0), (10.0, 0.0)),
                seg(1, (10.0, 0.0), (10.0, 10.0)),
                seg(2, (10.0, 10.0), (0.0, 10.0)),
            ],
        };
        let two = WallPath {
            index: 1,
            segments: vec![
                seg(0, (0.0, 0.0), (10.0, 0.0)),
                seg(1, (10.0, 0.0), (0.0, 0.0)),
            ],
        };

        let detection = RoomDetector::new(1.0).detect(&[open, two]);
        assert!(detection.rooms.is_empty());
        assert_eq!(detection.closed_paths, 0);
    }

    #[test]
    fn test_near_closure_within_twice_snap_distance() {
        let mut path = square_path();
        path.segments[3] = seg(3, (0.0, 10.0), (0.0, 1.5));

        assert!(RoomDetector::new(1.0).detect(&[path.clone()]).rooms.len() == 1);
        assert!(RoomDetector::new(0.5).detect(&[path]).rooms.is_empty());
    }

    #[test]
    fn test_global_dedup_keeps_first_seen_order() {
        let path = WallPath {
            index: 0,
            segments: vec![
                seg(0, (0.0, 0.0), (10.0, 0.0)),
                seg(1, (10.0, 0.0), (0.0, 0.0)),
                seg(2, (0.0, 0.0), (0.0, 10.0)),
                seg(3, (0.0, 10.0), (0.0, 0.0)),
            ],
        };

        let ring = closed_ring(&path).unwrap();
        assert_eq!(
            ring,
            vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(10.0, 0.0),
                Point2D::new(0.0, 10.0),
                Point2D::new(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_degenerate_room_is_dropped() {
        // Three segments bouncing between two points.
        let path = WallPath {
            index: 0,
            segments: vec![
                seg(0, (0.0, 0.0), (10.0, 0.0)),
                seg(1, (10.0, 0.0), (0.0, 0.0)),
                seg(2, (0.0, 0.0), (10.0, 0.0)),
            ],
        };
        // Closed only with a generous snap distance.
        let detection = RoomDetector::new(10.0).detect(&[path]);
        assert_eq!(detection.closed_paths, 1);
        assert_eq!(detection.degenerate, 1);
        assert!(detection.rooms.is_empty());
    }
}
