// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connectivity graph over snapped segment endpoints.
//!
//! - **Nodes** = connection points (exact coordinates after snapping)
//! - **Edges** = wall segments linking their start and end node
//!
//! Path growth only ever leaves a segment through its end point, so the
//! graph exposes that arrival-side adjacency directly via
//! [`ConnectivityGraph::continuations`].

use rustc_hash::FxHashMap;

use crate::types::{Point2D, PointKey, WallSegment};

/// An edge of the connectivity graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub start: Point2D,
    pub end: Point2D,
    /// Id of the segment this edge represents
    pub segment: usize,
}

/// Node → incident segments and segment → endpoints maps.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityGraph {
    edges: FxHashMap<usize, GraphEdge>,
    nodes: FxHashMap<PointKey, Vec<usize>>,
}

impl ConnectivityGraph {
    /// Build the graph from snapped segments.
    ///
    /// Each segment is listed at both its start and end node, in segment
    /// order. A segment whose endpoints coincide is listed once. Segments
    /// with fewer than two points are left out of the graph.
    pub fn build(segments: &[WallSegment]) -> Self {
        let mut graph = Self::default();

        for segment in segments {
            if !segment.is_well_formed() {
                tracing::debug!(segment = segment.id, "skipping segment without endpoints");
                continue;
            }
            let start = segment.start();
            let end = segment.end();
            graph.edges.insert(
                segment.id,
                GraphEdge {
                    start,
                    end,
                    segment: segment.id,
                },
            );

            graph.nodes.entry(start.key()).or_default().push(segment.id);
            if end.key() != start.key() {
                graph.nodes.entry(end.key()).or_default().push(segment.id);
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dangling = graph.dangling_count(),
            "built connectivity graph"
        );
        graph
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, segment: usize) -> Option<&GraphEdge> {
        self.edges.get(&segment)
    }

    /// Segment ids incident on a connection point.
    pub fn incident(&self, point: &Point2D) -> &[usize] {
        self.nodes
            .get(&point.key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Segments incident on the end point of `segment`, including
    /// `segment` itself.
    pub fn continuations(&self, segment: usize) -> &[usize] {
        match self.edges.get(&segment) {
            Some(edge) => self.incident(&edge.end),
            None => &[],
        }
    }

    /// Number of connection points touched by exactly one segment.
    pub fn dangling_count(&self) -> usize {
        self.nodes.values().filter(|ids| ids.len() == 1).count()
    }

    /// Connection points touched by exactly one segment, sorted for stable
    /// output.
    pub fn dangling_points(&self) -> Vec<Point2D> {
        let mut keys: Vec<PointKey> = self
            .nodes
            .iter()
            .filter(|(_, ids)| ids.len() == 1)
            .map(|(key, _)| *key)
            .collect();
        keys.sort_unstable();
        keys.iter().map(PointKey::point).collect()
    }
}
