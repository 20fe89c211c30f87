//! Core data structures for the interactive graph

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use petgraph::stable_graph::EdgeIndex;
use serde::{Deserialize, Serialize};

/// User-chosen vertex identity. Unique within a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct VertexId(pub i64);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for VertexId {
    fn from(id: i64) -> Self {
        VertexId(id)
    }
}

/// A 2D world-space vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len > 1e-5 { self / len } else { Vec2::ZERO }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// A single vertex in the graph.
///
/// The relation lists hold arena indices into the owning [`GraphStore`](crate::GraphStore)
/// and are kept in edge insertion order. `incoming`/`outgoing` are only
/// populated while the graph is directed.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Vec2,
    pub dragging: bool,
    pub(crate) incident: Vec<EdgeIndex>,
    pub(crate) incoming: Vec<EdgeIndex>,
    pub(crate) outgoing: Vec<EdgeIndex>,
}

impl Vertex {
    pub(crate) fn new(id: VertexId, position: Vec2) -> Self {
        Vertex {
            id,
            position,
            dragging: false,
            incident: Vec::new(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn in_degree(&self) -> usize {
        self.incoming.len()
    }

    pub fn out_degree(&self) -> usize {
        self.outgoing.len()
    }
}

/// A weighted relation between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    pub weight: f32,
    /// Mirrors the graph mode; refreshed whenever the mode toggles.
    pub directed: bool,
}

impl Edge {
    /// The endpoint that is not `id`. For a self-loop this is `id` itself.
    pub fn other(&self, id: VertexId) -> VertexId {
        if self.from == id { self.to } else { self.from }
    }

    pub fn touches(&self, id: VertexId) -> bool {
        self.from == id || self.to == id
    }

    pub fn is_loop(&self) -> bool {
        self.from == self.to
    }

    /// Whether this edge connects `a` to `b` under the given directedness rule.
    pub fn connects(&self, a: VertexId, b: VertexId, directed: bool) -> bool {
        (self.from == a && self.to == b) || (!directed && self.from == b && self.to == a)
    }
}

/// Degree summary of a vertex. Undirected graphs report zero in/out degree;
/// directed graphs report `degree == in_degree + out_degree`. A self-loop
/// contributes two to `degree` in either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degree {
    pub degree: usize,
    pub in_degree: usize,
    pub out_degree: usize,
}
