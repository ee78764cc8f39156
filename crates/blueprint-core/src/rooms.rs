//! Room detection from wall graphs.
//!
//! Walls are turned into a planar graph:
//! 1. Vertices are all wall endpoints plus every pairwise intersection
//! 2. Each wall is split at the vertices lying on it
//! 3. Dangling walls are pruned, then each vertex orders its neighbours by angle
//! 4. Every directed edge is walked once, always turning to the next neighbour
//!    around the vertex, which traces the faces of the plan
//!
//! Bounded faces are the minimal rooms. The unbounded outline of each
//! connected group of walls winds the other way and is dropped.

use crate::geometry::{
    point_in_polygon, point_to_segment_dist, points_bounds, polygon_area, segment_intersection,
    signed_polygon_area,
};
use kurbo::{Point, Rect};
use std::collections::BTreeSet;

/// Distance under which two graph vertices are considered the same point.
pub const VERTEX_EPSILON: f64 = 1e-3;

/// Faces with less area than this are degenerate and never become rooms.
const MIN_ROOM_AREA: f64 = 1e-6;

/// A closed room polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub vertices: Vec<Point>,
}

impl Room {
    pub fn area(&self) -> f64 {
        polygon_area(&self.vertices)
    }

    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.vertices)
    }

    pub fn bounds(&self) -> Option<Rect> {
        points_bounds(&self.vertices)
    }
}

/// Undirected graph of wall vertices.
#[derive(Debug, Clone, Default)]
pub struct WallGraph {
    vertices: Vec<Point>,
    adjacency: Vec<Vec<usize>>,
}

impl WallGraph {
    /// Build the graph from wall segments.
    pub fn build(segments: &[(Point, Point)]) -> Self {
        let mut graph = Self::default();

        for (a, b) in segments {
            graph.vertex_index(*a);
            graph.vertex_index(*b);
        }
        for (i, (a, b)) in segments.iter().enumerate() {
            for (c, d) in &segments[i + 1..] {
                if let Some(p) = segment_intersection(*a, *b, *c, *d) {
                    graph.vertex_index(p);
                }
            }
        }

        for (a, b) in segments {
            graph.connect_along(*a, *b);
        }
        for neighbors in &mut graph.adjacency {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        graph
    }

    fn find_vertex(&self, point: Point) -> Option<usize> {
        self.vertices
            .iter()
            .position(|v| (*v - point).hypot() < VERTEX_EPSILON)
    }

    fn vertex_index(&mut self, point: Point) -> usize {
        if let Some(index) = self.find_vertex(point) {
            return index;
        }
        self.vertices.push(point);
        self.adjacency.push(Vec::new());
        self.vertices.len() - 1
    }

    /// Link consecutive vertices lying on the segment a→b.
    fn connect_along(&mut self, a: Point, b: Point) {
        let dir = b - a;
        let len_sq = dir.hypot2();
        if len_sq < f64::EPSILON {
            return;
        }
        let mut on_segment: Vec<(f64, usize)> = self
            .vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| point_to_segment_dist(**v, a, b) < VERTEX_EPSILON)
            .map(|(i, v)| ((*v - a).dot(dir) / len_sq, i))
            .collect();
        on_segment.sort_by(|x, y| x.0.total_cmp(&y.0));

        for pair in on_segment.windows(2) {
            let (u, w) = (pair[0].1, pair[1].1);
            if u != w {
                self.adjacency[u].push(w);
                self.adjacency[w].push(u);
            }
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Adjacency with dangling walls removed: a vertex with one neighbour
    /// can never close a room, and removing it may expose another.
    fn pruned_adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = self.adjacency.clone();
        let mut stack: Vec<usize> = (0..adjacency.len())
            .filter(|&v| adjacency[v].len() == 1)
            .collect();

        while let Some(v) = stack.pop() {
            let &[w] = adjacency[v].as_slice() else {
                continue;
            };
            adjacency[v].clear();
            adjacency[w].retain(|&u| u != v);
            if adjacency[w].len() == 1 {
                stack.push(w);
            }
        }
        adjacency
    }

    fn angle(&self, from: usize, to: usize) -> f64 {
        let d = self.vertices[to] - self.vertices[from];
        d.y.atan2(d.x)
    }

    /// Find the minimal rooms enclosed by the walls.
    ///
    /// Each directed edge `(from, to)` is visited once. Arriving at `to`,
    /// the walk leaves along the neighbour that follows `from` in angular
    /// order, so it keeps hugging the same face until it is back on the
    /// starting edge.
    pub fn find_rooms(&self) -> Vec<Room> {
        let mut around = self.pruned_adjacency();
        for (v, neighbors) in around.iter_mut().enumerate() {
            neighbors.sort_by(|a, b| {
                self.angle(v, *a)
                    .total_cmp(&self.angle(v, *b))
                    .then(a.cmp(b))
            });
        }

        let mut walked: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut rooms = Vec::new();
        let mut faces = 0usize;

        for (start, neighbors) in around.iter().enumerate() {
            for &first in neighbors {
                if walked.contains(&(start, first)) {
                    continue;
                }

                let mut path = Vec::new();
                let (mut from, mut to) = (start, first);
                while walked.insert((from, to)) {
                    path.push(from);
                    let Some(next) = next_around(&around[to], from) else {
                        break;
                    };
                    (from, to) = (to, next);
                }
                if (from, to) != (start, first) || path.len() < 3 {
                    continue;
                }
                faces += 1;

                let vertices: Vec<Point> = path.iter().map(|&i| self.vertices[i]).collect();
                if signed_polygon_area(&vertices) > MIN_ROOM_AREA {
                    rooms.push(Room { vertices });
                }
            }
        }

        log::debug!("Traced {faces} faces, {} rooms", rooms.len());
        rooms
    }
}

/// Neighbour after `from` in the angular order of a vertex, wrapping around.
fn next_around(sorted: &[usize], from: usize) -> Option<usize> {
    let pos = sorted.iter().position(|&v| v == from)?;
    sorted.get((pos + 1) % sorted.len()).copied()
}

/// Detect every room formed by the given wall segments.
pub fn detect_rooms(segments: &[(Point, Point)]) -> Vec<Room> {
    WallGraph::build(segments).find_rooms()
}

/// Smallest room containing `point`.
pub fn room_at(rooms: &[Room], point: Point) -> Option<&Room> {
    rooms
        .iter()
        .filter(|room| room.contains(point))
        .min_by(|a, b| a.area().total_cmp(&b.area()))
}
