use geo::{Area, ConvexHull, MinimumRotatedRect};
use geo_types::{MultiPoint, Point as GeoPoint, Polygon};
use serde::{Deserialize, Serialize};

use crate::types::{OrientedRect, Point};

/// Near-zero hull area.
const EPS: f64 = 1e-9;
/// Degrees; absorbs rotation round-off from the rectangle fit.
const ANGLE_EPS: f64 = 1e-6;

/// Area and first-order moments of a closed polygon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Moments of the polygon bounded by `contour` (implicitly closed).
    ///
    /// Signs are normalised so `m00 >= 0` whatever the winding.
    pub fn of_contour(contour: &[Point]) -> Self {
        if contour.len() < 3 {
            return Self::default();
        }

        let mut m00 = 0.0;
        let mut m10 = 0.0;
        let mut m01 = 0.0;

        for (i, p) in contour.iter().enumerate() {
            let q = contour[(i + 1) % contour.len()];
            let (xi, yi) = (p.x as f64, p.y as f64);
            let (xj, yj) = (q.x as f64, q.y as f64);
            let cross = xi * yj - xj * yi;
            m00 += cross;
            m10 += cross * (xi + xj);
            m01 += cross * (yi + yj);
        }

        let sign = if m00 < 0.0 { -1.0 } else { 1.0 };
        Self {
            m00: sign * m00 / 2.0,
            m10: sign * m10 / 6.0,
            m01: sign * m01 / 6.0,
        }
    }

    /// `(m10/m00, m01/m00)`, or `None` for a zero-area polygon
    pub fn centroid(&self) -> Option<[f64; 2]> {
        if self.m00.abs() <= f64::EPSILON {
            return None;
        }
        Some([self.m10 / self.m00, self.m01 / self.m00])
    }
}

/// Minimum-area rectangle enclosing `contour`.
///
/// The angle is normalised to `[0, 90)` degrees and `size[0]` is the side
/// along that direction. Fewer than three distinct points, or collinear
/// points, give a zero-size rectangle at the mean of the points.
pub fn fit_oriented_rectangle(contour: &[Point]) -> OrientedRect {
    if contour.len() < 3 {
        return degenerate_rect(contour);
    }
    let points: MultiPoint<f64> = contour
        .iter()
        .map(|p| GeoPoint::new(p.x as f64, p.y as f64))
        .collect();
    if points.convex_hull().unsigned_area() <= EPS {
        return degenerate_rect(contour);
    }

    points
        .minimum_rotated_rect()
        .and_then(|rect| normalize_rect(&rect))
        .unwrap_or_else(|| degenerate_rect(contour))
}

/// Centre, sides and angle of a rectangle polygon, with the angle folded
/// into `[0, 90)`.
fn normalize_rect(rect: &Polygon<f64>) -> Option<OrientedRect> {
    let corners: Vec<[f64; 2]> = rect.exterior().coords().take(4).map(|c| [c.x, c.y]).collect();
    if corners.len() < 4 {
        return None;
    }

    let center = [
        corners.iter().map(|c| c[0]).sum::<f64>() / 4.0,
        corners.iter().map(|c| c[1]).sum::<f64>() / 4.0,
    ];
    let edge = [corners[1][0] - corners[0][0], corners[1][1] - corners[0][1]];
    let mut width = edge[0].hypot(edge[1]);
    let mut height = (corners[2][0] - corners[1][0]).hypot(corners[2][1] - corners[1][1]);
    let mut angle = edge[1].atan2(edge[0]).to_degrees().rem_euclid(180.0);

    // A quarter turn swaps the sides.
    while angle >= 90.0 - ANGLE_EPS {
        angle -= 90.0;
        std::mem::swap(&mut width, &mut height);
    }
    if angle.abs() < ANGLE_EPS {
        angle = 0.0;
    }

    Some(OrientedRect {
        center,
        size: [width, height],
        angle,
        corners: rect_corners(center, [width, height], angle),
    })
}

fn degenerate_rect(contour: &[Point]) -> OrientedRect {
    let center = if contour.is_empty() {
        [0.0, 0.0]
    } else {
        let n = contour.len() as f64;
        let (sx, sy) = contour
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
        [sx / n, sy / n]
    };
    OrientedRect {
        center,
        size: [0.0, 0.0],
        angle: 0.0,
        corners: [center; 4],
    }
}

/// Corners of a rectangle given centre, `[width, height]` and angle in degrees.
pub fn rect_corners(center: [f64; 2], size: [f64; 2], angle: f64) -> [[f64; 2]; 4] {
    let (sin, cos) = angle.to_radians().sin_cos();
    let u = [cos * size[0] / 2.0, sin * size[0] / 2.0];
    let v = [-sin * size[1] / 2.0, cos * size[1] / 2.0];
    let at = |su: f64, sv: f64| [center[0] + su * u[0] + sv * v[0], center[1] + su * u[1] + sv * v[1]];
    [at(-1.0, -1.0), at(1.0, -1.0), at(1.0, 1.0), at(-1.0, 1.0)]
}
