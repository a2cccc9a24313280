use crate::Vector2;

/// Tests whether `point` lies inside the polygon described by `vertices`.
///
/// Uses even-odd ray casting, so any simple polygon works regardless of winding.
/// Points exactly on an edge may land on either side.
pub fn polygon_contains(vertices: &[Vector2], point: Vector2) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed area of a polygon, positive for counter-clockwise winding.
pub fn polygon_signed_area(vertices: &[Vector2]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area / 2.0
}

/// Sign of `value`, with zero mapping to zero.
pub fn signum(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
