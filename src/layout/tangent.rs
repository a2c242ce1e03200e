// Backtracking tangency search. Items are placed largest first, each one
// touching an already placed item; candidates whose overlap with any placed
// item exceeds the threshold are rejected. The recursion is an explicit frame
// stack bounded by a step budget.

use super::geometry::ShapeGeometry;
use super::relax::size_order;
use crate::config::{TangentAnchor, TangentConfig};
use crate::ir::{Canvas, Item, Point, ShapeKind};
use std::cmp::Ordering;
use std::f32::consts::PI;

const BOUNDS_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Default)]
pub struct TangentPlacement {
    /// Indexed like the input items; `None` for dropped items.
    pub positions: Vec<Option<Point>>,
    pub dropped: Vec<usize>,
}

impl TangentPlacement {
    pub fn is_empty(&self) -> bool {
        self.positions.iter().all(Option::is_none)
    }
}

struct Frame {
    item: usize,
    candidates: Vec<Point>,
    cursor: usize,
}

struct Search<'a> {
    items: &'a [Item],
    geom: &'static dyn ShapeGeometry,
    canvas: &'a Canvas,
    config: &'a TangentConfig,
    target: Point,
}

impl Search<'_> {
    fn fits(&self, item: usize, p: Point) -> bool {
        let (hw, hh) = self.geom.half_extents(self.items[item].size);
        p.x - hw >= -BOUNDS_EPS
            && p.x + hw <= self.canvas.width + BOUNDS_EPS
            && p.y - hh >= self.canvas.top_margin - BOUNDS_EPS
            && p.y + hh <= self.canvas.height + BOUNDS_EPS
    }

    fn anchor(&self, item: usize) -> Point {
        match self.config.anchor {
            TangentAnchor::Center => self.canvas.center(),
            TangentAnchor::TopLeft => {
                let (hw, hh) = self.geom.half_extents(self.items[item].size);
                Point::new(hw, self.canvas.top_margin + hh)
            }
        }
    }

    fn candidates(&self, item: usize, active: &[usize], placed: &[Point]) -> Vec<Point> {
        let steps = self.config.angle_steps.max(1);
        let size = self.items[item].size;
        let mut out = Vec::with_capacity(placed.len() * steps);
        for (slot, &origin) in placed.iter().enumerate() {
            let other = self.items[active[slot]].size;
            for step in 0..steps {
                let angle = 2.0 * PI * step as f32 / steps as f32;
                let distance = self.geom.contact_distance(other, size, angle);
                let p = Point::new(
                    origin.x + distance * angle.cos(),
                    origin.y + distance * angle.sin(),
                );
                if self.fits(item, p) {
                    out.push(p);
                }
            }
        }
        let target = self.target;
        out.sort_by(|a, b| {
            a.distance(target)
                .partial_cmp(&b.distance(target))
                .unwrap_or(Ordering::Equal)
        });
        out
    }

    fn acceptable(&self, item: usize, p: Point, active: &[usize], placed: &[Point]) -> bool {
        let size = self.items[item].size;
        let area = self.geom.area_from_size(size);
        placed.iter().enumerate().all(|(slot, &q)| {
            let other = self.items[active[slot]].size;
            let smaller = area.min(self.geom.area_from_size(other));
            if smaller <= 0.0 {
                return true;
            }
            let overlap = self.geom.overlap_area(q, other, p, size);
            overlap / smaller <= self.config.overlap_threshold
        })
    }

    /// Positions for `active` (in order), or `None` once backtracking is
    /// exhausted or the step budget runs out.
    fn run(&self, active: &[usize]) -> Option<Vec<Point>> {
        let first = *active.first()?;
        let anchor = self.anchor(first);
        if !self.fits(first, anchor) {
            return None;
        }
        let mut placed = vec![anchor];
        if active.len() == 1 {
            return Some(placed);
        }

        let mut stack = vec![Frame {
            item: active[1],
            candidates: self.candidates(active[1], active, &placed),
            cursor: 0,
        }];
        let mut steps = 0usize;
        loop {
            let frame = stack.last_mut()?;
            if frame.cursor >= frame.candidates.len() {
                stack.pop();
                if stack.is_empty() {
                    return None;
                }
                // Undo the placement made by the frame we return to.
                placed.pop();
                continue;
            }
            let candidate = frame.candidates[frame.cursor];
            frame.cursor += 1;
            let item = frame.item;

            steps += 1;
            if steps > self.config.step_budget {
                tracing::debug!(steps, "tangent search hit its step budget");
                return None;
            }
            if !self.acceptable(item, candidate, active, &placed) {
                continue;
            }
            placed.push(candidate);
            if placed.len() == active.len() {
                return Some(placed);
            }
            let next = active[placed.len()];
            stack.push(Frame {
                item: next,
                candidates: self.candidates(next, active, &placed),
                cursor: 0,
            });
        }
    }
}

/// Place items by tangency search, dropping the smallest items (up to
/// `max_drops`) when no full placement exists. Gives up with an empty
/// placement rather than returning overlapping shapes.
pub fn tangent_layout(
    items: &[Item],
    shape: ShapeKind,
    canvas: &Canvas,
    config: &TangentConfig,
) -> TangentPlacement {
    let mut placement = TangentPlacement {
        positions: vec![None; items.len()],
        dropped: Vec::new(),
    };
    if items.is_empty() {
        return placement;
    }

    let geom = shape.geometry();
    let target = match config.anchor {
        TangentAnchor::Center => canvas.center(),
        TangentAnchor::TopLeft => Point::new(0.0, canvas.top_margin),
    };
    let search = Search {
        items,
        geom,
        canvas,
        config,
        target,
    };

    let mut active = size_order(items);
    let mut dropped: Vec<usize> = Vec::new();
    loop {
        if let Some(points) = search.run(&active) {
            for (&idx, point) in active.iter().zip(points) {
                placement.positions[idx] = Some(point);
            }
            dropped.sort_unstable();
            if !dropped.is_empty() {
                tracing::warn!(dropped = dropped.len(), "tangent search dropped items to fit");
            }
            placement.dropped = dropped;
            return placement;
        }
        if dropped.len() >= config.max_drops || active.len() <= 1 {
            break;
        }
        if let Some(smallest) = active.pop() {
            dropped.push(smallest);
        }
    }

    tracing::warn!(
        items = items.len(),
        "tangent search found no placement; rendering nothing"
    );
    placement.dropped = (0..items.len()).collect();
    placement
}
