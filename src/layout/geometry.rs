// Shape geometry shared by sizing, both solvers and label placement.
// Sizes are radii for circles and side lengths for squares and (equilateral,
// apex-up) triangles. Positions are bounding-box centres.

use crate::ir::{Point, ShapeKind};
use std::f32::consts::PI;

const SQRT3: f32 = 1.732_050_8;
const EPS: f32 = 1e-6;

pub trait ShapeGeometry: Sync {
    fn area_from_size(&self, size: f32) -> f32;

    fn size_from_area(&self, area: f32) -> f32;

    /// Bounding box (width, height) of a shape of the given size.
    fn extents(&self, size: f32) -> (f32, f32);

    /// Horizontal chord available at `offset` below the bounding-box centre
    /// (negative offsets are above). Zero outside the shape.
    fn max_width_at_offset(&self, size: f32, offset: f32) -> f32;

    /// Area shared by two shapes of this kind.
    fn overlap_area(&self, a: Point, a_size: f32, b: Point, b_size: f32) -> f32;

    /// Centre distance at which `b` touches `a` from direction `angle`.
    fn contact_distance(&self, a_size: f32, b_size: f32, angle: f32) -> f32;

    /// Displacement that moves `b` clear of `a` (plus `padding`), if they collide.
    fn separation(
        &self,
        a: Point,
        a_size: f32,
        b: Point,
        b_size: f32,
        padding: f32,
    ) -> Option<(f32, f32)> {
        box_separation(a, self.extents(a_size), b, self.extents(b_size), padding)
    }

    /// Vertical offset from the box centre to the visual centre used for text.
    fn text_center_offset(&self, _size: f32) -> f32 {
        0.0
    }

    fn half_extents(&self, size: f32) -> (f32, f32) {
        let (w, h) = self.extents(size);
        (w / 2.0, h / 2.0)
    }

    /// Largest size whose bounding box fits within `width` x `height`.
    fn size_for_box(&self, width: f32, height: f32) -> f32;
}

#[derive(Debug, Clone, Copy)]
pub struct Circle;

#[derive(Debug, Clone, Copy)]
pub struct Square;

#[derive(Debug, Clone, Copy)]
pub struct Triangle;

static CIRCLE: Circle = Circle;
static SQUARE: Square = Square;
static TRIANGLE: Triangle = Triangle;

impl ShapeKind {
    pub fn geometry(self) -> &'static dyn ShapeGeometry {
        match self {
            ShapeKind::Circle => &CIRCLE,
            ShapeKind::Square => &SQUARE,
            ShapeKind::Triangle => &TRIANGLE,
        }
    }
}

impl ShapeGeometry for Circle {
    fn area_from_size(&self, size: f32) -> f32 {
        PI * size.max(0.0).powi(2)
    }

    fn size_from_area(&self, area: f32) -> f32 {
        (area.max(0.0) / PI).sqrt()
    }

    fn extents(&self, size: f32) -> (f32, f32) {
        let d = size.max(0.0) * 2.0;
        (d, d)
    }

    fn max_width_at_offset(&self, size: f32, offset: f32) -> f32 {
        let r = size.max(0.0);
        if offset.abs() >= r {
            return 0.0;
        }
        2.0 * (r * r - offset * offset).sqrt()
    }

    fn overlap_area(&self, a: Point, a_size: f32, b: Point, b_size: f32) -> f32 {
        circle_intersection_area(a, a_size, b, b_size)
    }

    fn contact_distance(&self, a_size: f32, b_size: f32, _angle: f32) -> f32 {
        a_size.max(0.0) + b_size.max(0.0)
    }

    fn separation(
        &self,
        a: Point,
        a_size: f32,
        b: Point,
        b_size: f32,
        padding: f32,
    ) -> Option<(f32, f32)> {
        let min_dist = a_size + b_size + padding;
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let dist = dx.hypot(dy);
        if dist >= min_dist {
            return None;
        }
        let push = min_dist - dist;
        if dist < EPS {
            return Some((push, 0.0));
        }
        Some((dx / dist * push, dy / dist * push))
    }

    fn size_for_box(&self, width: f32, height: f32) -> f32 {
        (width.min(height) / 2.0).max(0.0)
    }
}

impl ShapeGeometry for Square {
    fn area_from_size(&self, size: f32) -> f32 {
        size.max(0.0).powi(2)
    }

    fn size_from_area(&self, area: f32) -> f32 {
        area.max(0.0).sqrt()
    }

    fn extents(&self, size: f32) -> (f32, f32) {
        let s = size.max(0.0);
        (s, s)
    }

    fn max_width_at_offset(&self, size: f32, offset: f32) -> f32 {
        let s = size.max(0.0);
        if offset.abs() > s / 2.0 {
            return 0.0;
        }
        s
    }

    fn overlap_area(&self, a: Point, a_size: f32, b: Point, b_size: f32) -> f32 {
        box_overlap_area(a, self.extents(a_size), b, self.extents(b_size))
    }

    fn contact_distance(&self, a_size: f32, b_size: f32, angle: f32) -> f32 {
        box_contact_distance(self.extents(a_size), self.extents(b_size), angle)
    }

    fn size_for_box(&self, width: f32, height: f32) -> f32 {
        width.min(height).max(0.0)
    }
}

impl Triangle {
    fn height(size: f32) -> f32 {
        size.max(0.0) * SQRT3 / 2.0
    }
}

impl ShapeGeometry for Triangle {
    fn area_from_size(&self, size: f32) -> f32 {
        SQRT3 / 4.0 * size.max(0.0).powi(2)
    }

    fn size_from_area(&self, area: f32) -> f32 {
        (area.max(0.0) * 4.0 / SQRT3).sqrt()
    }

    fn extents(&self, size: f32) -> (f32, f32) {
        (size.max(0.0), Self::height(size))
    }

    fn max_width_at_offset(&self, size: f32, offset: f32) -> f32 {
        let h = Self::height(size);
        if h <= 0.0 {
            return 0.0;
        }
        let from_apex = offset + h / 2.0;
        if !(0.0..=h).contains(&from_apex) {
            return 0.0;
        }
        size * from_apex / h
    }

    // Bounding-box approximation: triangles pack loosely enough that the
    // corner slivers never matter for the overlap threshold.
    fn overlap_area(&self, a: Point, a_size: f32, b: Point, b_size: f32) -> f32 {
        box_overlap_area(a, self.extents(a_size), b, self.extents(b_size))
    }

    fn contact_distance(&self, a_size: f32, b_size: f32, angle: f32) -> f32 {
        box_contact_distance(self.extents(a_size), self.extents(b_size), angle)
    }

    fn text_center_offset(&self, size: f32) -> f32 {
        // Centroid sits a third of the way up from the base.
        Self::height(size) / 6.0
    }

    fn size_for_box(&self, width: f32, height: f32) -> f32 {
        width.min(height * 2.0 / SQRT3).max(0.0)
    }
}

/// Lens area of two overlapping circles. Zero when disjoint, the smaller disc
/// when one contains the other.
pub fn circle_intersection_area(a: Point, ra: f32, b: Point, rb: f32) -> f32 {
    let ra = ra.max(0.0);
    let rb = rb.max(0.0);
    if ra <= 0.0 || rb <= 0.0 {
        return 0.0;
    }
    let d = a.distance(b);
    if d >= ra + rb {
        return 0.0;
    }
    if d <= (ra - rb).abs() {
        let r = ra.min(rb);
        return PI * r * r;
    }
    let cos_a = ((d * d + ra * ra - rb * rb) / (2.0 * d * ra)).clamp(-1.0, 1.0);
    let cos_b = ((d * d + rb * rb - ra * ra) / (2.0 * d * rb)).clamp(-1.0, 1.0);
    let kite = (-d + ra + rb) * (d + ra - rb) * (d - ra + rb) * (d + ra + rb);
    let area = ra * ra * cos_a.acos() + rb * rb * cos_b.acos() - 0.5 * kite.max(0.0).sqrt();
    area.max(0.0)
}

pub fn box_overlap_area(a: Point, a_ext: (f32, f32), b: Point, b_ext: (f32, f32)) -> f32 {
    let ox = (a_ext.0 + b_ext.0) / 2.0 - (a.x - b.x).abs();
    let oy = (a_ext.1 + b_ext.1) / 2.0 - (a.y - b.y).abs();
    if ox <= 0.0 || oy <= 0.0 {
        return 0.0;
    }
    ox.min(a_ext.0).min(b_ext.0) * oy.min(a_ext.1).min(b_ext.1)
}

fn box_contact_distance(a_ext: (f32, f32), b_ext: (f32, f32), angle: f32) -> f32 {
    let sx = (a_ext.0 + b_ext.0) / 2.0;
    let sy = (a_ext.1 + b_ext.1) / 2.0;
    let c = angle.cos().abs();
    let s = angle.sin().abs();
    let tx = if c > EPS { sx / c } else { f32::INFINITY };
    let ty = if s > EPS { sy / s } else { f32::INFINITY };
    tx.min(ty)
}

fn box_separation(
    a: Point,
    a_ext: (f32, f32),
    b: Point,
    b_ext: (f32, f32),
    padding: f32,
) -> Option<(f32, f32)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let ox = (a_ext.0 + b_ext.0) / 2.0 + padding - dx.abs();
    let oy = (a_ext.1 + b_ext.1) / 2.0 + padding - dy.abs();
    if ox <= 0.0 || oy <= 0.0 {
        return None;
    }
    let sign = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
    if ox < oy {
        Some((sign(dx) * ox, 0.0))
    } else {
        Some((0.0, sign(dy) * oy))
    }
}
