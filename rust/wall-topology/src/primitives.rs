// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw drawing primitives as delivered by the drawing-source reader.
//!
//! The reader hands over loosely typed records (one JSON object per line,
//! edge, rectangle or curve). They are resolved into [`RawPrimitive`] at the
//! normalization boundary; a record missing required fields becomes
//! [`Error::MalformedPrimitive`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::types::Point2D;

/// Primitive record kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Line,
    Edge,
    Rect,
    Curve,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Line => "line",
            PrimitiveKind::Edge => "edge",
            PrimitiveKind::Rect => "rect",
            PrimitiveKind::Curve => "curve",
        }
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All primitive records of one drawing page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrimitiveSet {
    pub lines: Vec<Value>,
    pub edges: Vec<Value>,
    pub rects: Vec<Value>,
    pub curves: Vec<Value>,
}

impl PrimitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all kinds.
    pub fn len(&self) -> usize {
        self.lines.len() + self.edges.len() + self.rects.len() + self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records in processing order: lines, edges, rects, curves.
    pub fn records(&self) -> impl Iterator<Item = (PrimitiveKind, &Value)> {
        self.lines
            .iter()
            .map(|r| (PrimitiveKind::Line, r))
            .chain(self.edges.iter().map(|r| (PrimitiveKind::Edge, r)))
            .chain(self.rects.iter().map(|r| (PrimitiveKind::Rect, r)))
            .chain(self.curves.iter().map(|r| (PrimitiveKind::Curve, r)))
    }

    pub fn push_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> &mut Self {
        self.lines
            .push(json!({ "x0": x0, "y0": y0, "x1": x1, "y1": y1 }));
        self
    }

    pub fn push_edge(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> &mut Self {
        self.edges
            .push(json!({ "x0": x0, "y0": y0, "x1": x1, "y1": y1 }));
        self
    }

    pub fn push_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> &mut Self {
        self.rects
            .push(json!({ "x0": x0, "y0": y0, "x1": x1, "y1": y1 }));
        self
    }

    pub fn push_curve(&mut self, points: &[[f64; 2]]) -> &mut Self {
        self.curves.push(json!({ "pts": points }));
        self
    }
}

/// A straight line or path edge
#[derive(Debug, Clone, PartialEq)]
pub struct LinePrimitive {
    pub start: Point2D,
    pub end: Point2D,
    pub stroke_width: Option<f64>,
}

/// An axis-aligned rectangle, corners normalized so `x0 <= x1`, `y0 <= y1`
#[derive(Debug, Clone, PartialEq)]
pub struct RectPrimitive {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub width: f64,
    pub height: f64,
    pub stroke_width: Option<f64>,
}

/// A curve given by its control points
#[derive(Debug, Clone, PartialEq)]
pub struct CurvePrimitive {
    pub points: Vec<Point2D>,
    pub stroke_width: Option<f64>,
}

/// A resolved primitive record
#[derive(Debug, Clone, PartialEq)]
pub enum RawPrimitive {
    Line(LinePrimitive),
    Edge(LinePrimitive),
    Rect(RectPrimitive),
    Curve(CurvePrimitive),
}

impl RawPrimitive {
    /// Resolve a loosely typed record of the given kind.
    pub fn from_record(kind: PrimitiveKind, record: &Value) -> Result<Self> {
        let obj = record
            .as_object()
            .ok_or_else(|| Error::malformed(kind, "record is not an object"))?;
        let stroke_width = optional_f64(obj, &["linewidth", "stroke_width"]);

        match kind {
            PrimitiveKind::Line | PrimitiveKind::Edge => {
                let line = LinePrimitive {
                    start: Point2D::new(
                        required_f64(kind, obj, "x0")?,
                        required_f64(kind, obj, "y0")?,
                    ),
                    end: Point2D::new(
                        required_f64(kind, obj, "x1")?,
                        required_f64(kind, obj, "y1")?,
                    ),
                    stroke_width,
                };
                Ok(if kind == PrimitiveKind::Line {
                    RawPrimitive::Line(line)
                } else {
                    RawPrimitive::Edge(line)
                })
            }
            PrimitiveKind::Rect => {
                let ax = required_f64(kind, obj, "x0")?;
                let ay = required_f64(kind, obj, "y0")?;
                let bx = required_f64(kind, obj, "x1")?;
                let by = required_f64(kind, obj, "y1")?;
                let (x0, x1) = (ax.min(bx), ax.max(bx));
                let (y0, y1) = (ay.min(by), ay.max(by));
                Ok(RawPrimitive::Rect(RectPrimitive {
                    x0,
                    y0,
                    x1,
                    y1,
                    width: optional_f64(obj, &["width"]).map_or(x1 - x0, f64::abs),
                    height: optional_f64(obj, &["height"]).map_or(y1 - y0, f64::abs),
                    stroke_width,
                }))
            }
            PrimitiveKind::Curve => {
                let pts = obj
                    .get("pts")
                    .and_then(Value::as_array)
                    .ok_or_else(|| Error::malformed(kind, "missing point list `pts`"))?;
                let points = pts
                    .iter()
                    .map(|p| parse_point(kind, p))
                    .collect::<Result<Vec<_>>>()?;
                if points.len() < 2 {
                    return Err(Error::malformed(
                        kind,
                        format!("curve needs at least 2 points, got {}", points.len()),
                    ));
                }
                Ok(RawPrimitive::Curve(CurvePrimitive {
                    points,
                    stroke_width,
                }))
            }
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            RawPrimitive::Line(_) => PrimitiveKind::Line,
            RawPrimitive::Edge(_) => PrimitiveKind::Edge,
            RawPrimitive::Rect(_) => PrimitiveKind::Rect,
            RawPrimitive::Curve(_) => PrimitiveKind::Curve,
        }
    }
}

fn required_f64(kind: PrimitiveKind, obj: &Map<String, Value>, key: &str) -> Result<f64> {
    let value = obj
        .get(key)
        .ok_or_else(|| Error::malformed(kind, format!("missing field `{key}`")))?;
    finite(value).ok_or_else(|| Error::malformed(kind, format!("field `{key}` is not a number")))
}

fn optional_f64(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(Value::as_f64)
        .filter(|v| v.is_finite())
}

fn finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// Accepts `[x, y]` or `{"x": .., "y": ..}`.
fn parse_point(kind: PrimitiveKind, value: &Value) -> Result<Point2D> {
    let (x, y) = match value {
        Value::Array(items) if items.len() >= 2 => (finite(&items[0]), finite(&items[1])),
        Value::Object(obj) => (
            obj.get("x").and_then(finite),
            obj.get("y").and_then(finite),
        ),
        _ => (None, None),
    };
    match (x, y) {
        (Some(x), Some(y)) => Ok(Point2D::new(x, y)),
        _ => Err(Error::malformed(kind, format!("invalid point {value}"))),
    }
}
