//! Serde adapters storing point lists as flat `[x0, y0, x1, y1, ...]` arrays.

use kurbo::Point;
use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serializer};

/// Convert a flat coordinate list into points, `None` if the length is odd.
pub fn points_from_coords(coords: &[f64]) -> Option<Vec<Point>> {
    if coords.len() % 2 != 0 {
        return None;
    }
    Some(
        coords
            .chunks_exact(2)
            .map(|c| Point::new(c[0], c[1]))
            .collect(),
    )
}

/// Flatten points into a coordinate list.
pub fn coords_from_points(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

fn serialize_points<S: Serializer>(points: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(points.len() * 2))?;
    for p in points {
        seq.serialize_element(&p.x)?;
        seq.serialize_element(&p.y)?;
    }
    seq.end()
}

/// `Vec<Point>` as a flat coordinate array.
pub mod flat {
    use super::*;

    pub fn serialize<S: Serializer>(points: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
        serialize_points(points, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Point>, D::Error> {
        let coords = Vec::<f64>::deserialize(deserializer)?;
        points_from_coords(&coords)
            .ok_or_else(|| D::Error::custom(format!("odd coordinate count {}", coords.len())))
    }
}

/// `[Point; 3]` as a flat array of exactly six numbers.
pub mod triple {
    use super::*;

    pub fn serialize<S: Serializer>(points: &[Point; 3], serializer: S) -> Result<S::Ok, S::Error> {
        serialize_points(points, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[Point; 3], D::Error> {
        let coords = Vec::<f64>::deserialize(deserializer)?;
        match coords.as_slice() {
            [x0, y0, x1, y1, x2, y2] => Ok([
                Point::new(*x0, *y0),
                Point::new(*x1, *y1),
                Point::new(*x2, *y2),
            ]),
            _ => Err(D::Error::custom(format!(
                "triangle needs 6 coordinates, got {}",
                coords.len()
            ))),
        }
    }
}
