// Force relaxation: centre attraction, pairwise collision, optional group
// anchors and a boundary clamp, run for a fixed number of steps.

use crate::config::RelaxConfig;
use crate::ir::{Canvas, Item, Point, ShapeKind};
use std::cmp::Ordering;
use std::f32::consts::PI;

const GOLDEN_ANGLE: f32 = 2.399_963;

/// Solver-owned per-item state, indexed like the item slice.
#[derive(Debug, Clone, Copy)]
pub struct LayoutState {
    pub position: Point,
    pub velocity: (f32, f32),
    pub pinned: bool,
}

/// Largest first, ties broken by input order.
pub(crate) fn size_order(items: &[Item]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        items[b]
            .size
            .partial_cmp(&items[a].size)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });
    order
}

pub(crate) fn clamp_to_canvas(p: Point, half: (f32, f32), canvas: &Canvas) -> Point {
    fn clamp_axis(v: f32, lo: f32, hi: f32) -> f32 {
        if lo > hi { (lo + hi) / 2.0 } else { v.max(lo).min(hi) }
    }
    Point::new(
        clamp_axis(p.x, half.0, canvas.width - half.0),
        clamp_axis(p.y, canvas.top_margin + half.1, canvas.height - half.1),
    )
}

fn group_anchors(groups: &[String], canvas: &Canvas, config: &RelaxConfig) -> Vec<Point> {
    let center = canvas.center();
    let radius = config.group_radius_ratio * canvas.width.min(canvas.usable_height());
    let count = groups.len().max(1) as f32;
    (0..groups.len())
        .map(|idx| {
            let angle = 2.0 * PI * idx as f32 / count - PI / 2.0;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Place `items` by relaxation, writing `position` in place. `groups` lists
/// the distinct group keys; clustering only applies when there are at least
/// two of them.
pub fn relax_layout(
    items: &mut [Item],
    groups: &[String],
    shape: ShapeKind,
    canvas: &Canvas,
    config: &RelaxConfig,
) {
    if items.is_empty() {
        return;
    }
    let geom = shape.geometry();
    let center = canvas.center();
    let halves: Vec<(f32, f32)> = items.iter().map(|item| geom.half_extents(item.size)).collect();

    let clustering = config.cluster_groups && groups.len() > 1;
    let anchors = if clustering {
        group_anchors(groups, canvas, config)
    } else {
        Vec::new()
    };
    let slots: Vec<Option<usize>> = items
        .iter()
        .map(|item| {
            if !clustering {
                return None;
            }
            item.group
                .as_deref()
                .and_then(|g| groups.iter().position(|known| known == g))
        })
        .collect();

    let order = size_order(items);
    let spacing = halves.iter().map(|h| h.0.max(h.1)).sum::<f32>() / items.len() as f32;
    let mut state: Vec<LayoutState> = vec![
        LayoutState {
            position: center,
            velocity: (0.0, 0.0),
            pinned: false,
        };
        items.len()
    ];
    for (rank, &idx) in order.iter().enumerate() {
        let radius = spacing * (rank as f32).sqrt() * 1.5;
        let angle = rank as f32 * GOLDEN_ANGLE;
        let p = Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin());
        state[idx].position = clamp_to_canvas(p, halves[idx], canvas);
    }
    // A centred anchor would fight the group anchors, so pinning is skipped
    // while clustering.
    if config.pin_largest && !clustering {
        let largest = order[0];
        state[largest].position = clamp_to_canvas(center, halves[largest], canvas);
        state[largest].pinned = true;
    }
    for (item, s) in items.iter_mut().zip(&state) {
        item.pinned = s.pinned;
    }

    let iterations = config.iterations.max(1);
    let keep = (1.0 - config.velocity_decay).clamp(0.0, 1.0);
    let mut deltas = vec![(0.0f32, 0.0f32); items.len()];
    for step in 0..iterations {
        let alpha = 1.0 - step as f32 / iterations as f32;

        for (idx, s) in state.iter_mut().enumerate() {
            if s.pinned {
                continue;
            }
            let mut fx = (center.x - s.position.x) * config.center_strength;
            let mut fy = (center.y - s.position.y) * config.center_strength;
            if let Some(slot) = slots[idx] {
                let anchor = anchors[slot];
                fx += (anchor.x - s.position.x) * config.group_strength;
                fy += (anchor.y - s.position.y) * config.group_strength;
            }
            s.velocity.0 = (s.velocity.0 + fx * alpha) * keep;
            s.velocity.1 = (s.velocity.1 + fy * alpha) * keep;
            s.position.x += s.velocity.0;
            s.position.y += s.velocity.1;
        }

        deltas.iter_mut().for_each(|d| *d = (0.0, 0.0));
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let Some((px, py)) = geom.separation(
                    state[i].position,
                    items[i].size,
                    state[j].position,
                    items[j].size,
                    config.collide_padding,
                ) else {
                    continue;
                };
                let (px, py) = (px * config.collide_strength, py * config.collide_strength);
                match (state[i].pinned, state[j].pinned) {
                    (true, true) => {}
                    (true, false) => {
                        deltas[j].0 += px;
                        deltas[j].1 += py;
                    }
                    (false, true) => {
                        deltas[i].0 -= px;
                        deltas[i].1 -= py;
                    }
                    (false, false) => {
                        deltas[i].0 -= px / 2.0;
                        deltas[i].1 -= py / 2.0;
                        deltas[j].0 += px / 2.0;
                        deltas[j].1 += py / 2.0;
                    }
                }
            }
        }

        for (idx, s) in state.iter_mut().enumerate() {
            if !s.pinned {
                s.position.x += deltas[idx].0;
                s.position.y += deltas[idx].1;
            }
            s.position = clamp_to_canvas(s.position, halves[idx], canvas);
        }
    }

    for (item, s) in items.iter_mut().zip(&state) {
        item.position = s.position;
        item.pinned = false;
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        let mut residual = 0usize;
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let (a, b) = (&items[i], &items[j]);
                if geom
                    .separation(a.position, a.size, b.position, b.size, 0.0)
                    .is_some()
                {
                    residual += 1;
                }
            }
        }
        tracing::debug!(
            items = items.len(),
            iterations,
            clustering,
            residual_overlaps = residual,
            "relaxation finished"
        );
    }
}
