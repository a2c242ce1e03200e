use crate::config::SizingConfig;
use crate::ir::{Canvas, Item, ShapeKind};

/// Square-root mapping from value to linear size. Area is linear in value:
/// `domain_max` maps to `max_size`, and `min_size` is a floor applied by
/// [`SizeScale::clamp`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeScale {
    pub domain_max: f32,
    pub min_size: f32,
    pub max_size: f32,
}

impl SizeScale {
    pub fn new(domain_max: f32, min_size: f32, max_size: f32) -> Self {
        let max_size = max_size.max(0.0);
        Self {
            domain_max,
            min_size: min_size.clamp(0.0, max_size),
            max_size,
        }
    }

    pub fn scale(&self, value: f32) -> f32 {
        if self.domain_max <= 0.0 || !self.domain_max.is_finite() {
            return self.min_size;
        }
        let ratio = (value / self.domain_max).max(0.0);
        if !ratio.is_finite() {
            return self.max_size;
        }
        self.max_size * ratio.sqrt()
    }

    pub fn clamp(&self, size: f32) -> f32 {
        size.max(self.min_size).min(self.max_size)
    }
}

/// Size bounds in force after normalisation. `min` is lowered below the
/// configured minimum only when even minimum-size shapes overflow the budget,
/// so it is the effective floor: check sizes against `min`, not
/// `SizingConfig::min_size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBounds {
    pub min: f32,
    pub max: f32,
    pub budget: f32,
}

pub fn size_bounds(shape: ShapeKind, canvas: &Canvas, config: &SizingConfig) -> (f32, f32) {
    let geom = shape.geometry();
    let mut max = config.max_size.max(0.0);
    if config.max_height_ratio > 0.0 {
        max = max.min(canvas.height / config.max_height_ratio);
    }
    max = max.min(geom.size_for_box(canvas.width, canvas.usable_height()));
    let min = config.min_size.clamp(0.0, max);
    (min, max)
}

/// Assign every item a size whose area is proportional to its value, clamped
/// to the size bounds, then shrink uniformly until the total area fits
/// `fill_ratio` of the canvas.
pub fn normalize_sizes(
    items: &mut [Item],
    shape: ShapeKind,
    canvas: &Canvas,
    config: &SizingConfig,
) -> SizeBounds {
    let geom = shape.geometry();
    let (min_size, max_size) = size_bounds(shape, canvas, config);
    let budget = canvas.area() * config.fill_ratio.clamp(0.0, 1.0);
    let mut bounds = SizeBounds {
        min: min_size,
        max: max_size,
        budget,
    };
    if items.is_empty() {
        return bounds;
    }

    let max_value = items.iter().map(|item| item.value).fold(f32::MIN, f32::max);
    let min_value = items.iter().map(|item| item.value).fold(f32::MAX, f32::min);
    let scale = SizeScale::new(max_value, min_size, max_size);
    let boost = if max_value - min_value < config.spread_threshold * max_value {
        config.spread_factor
    } else {
        1.0
    };

    for item in items.iter_mut() {
        let size = scale.clamp(scale.scale(item.value) * boost);
        item.set_size(shape, size);
    }

    let count = items.len() as f32;
    if geom.area_from_size(min_size) * count > budget {
        let forced = geom.size_from_area(budget / count);
        tracing::warn!(
            items = items.len(),
            forced_size = forced,
            "minimum-size shapes exceed the area budget; shrinking all items uniformly"
        );
        for item in items.iter_mut() {
            item.set_size(shape, forced);
        }
        bounds.min = forced.min(min_size);
        return bounds;
    }

    // Items that drop below the floor are pinned there and the remaining
    // budget is shared by the rest, so free items keep exact area ratios.
    let mut at_floor = vec![false; items.len()];
    let mut overall = 1.0f32;
    for _ in 0..=items.len() {
        let total: f32 = items.iter().map(|item| item.area).sum();
        if total <= budget {
            break;
        }
        let free_area: f32 = items
            .iter()
            .zip(&at_floor)
            .filter(|(_, fixed)| !**fixed)
            .map(|(item, _)| item.area)
            .sum();
        if free_area <= 0.0 {
            break;
        }
        let factor = ((budget - (total - free_area)).max(0.0) / free_area).sqrt();
        overall *= factor;
        for (item, fixed) in items.iter_mut().zip(at_floor.iter_mut()) {
            if *fixed {
                continue;
            }
            let mut size = item.size * factor;
            if size < min_size {
                size = min_size;
                *fixed = true;
            }
            item.set_size(shape, size);
        }
    }

    tracing::debug!(
        items = items.len(),
        max_value,
        boosted = boost < 1.0,
        rescale = overall,
        "normalized item sizes"
    );
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(values: &[f32]) -> Vec<Item> {
        values
            .iter()
            .enumerate()
            .map(|(idx, value)| Item::new(format!("item-{idx}"), *value))
            .collect()
    }

    fn config(min_size: f32, max_size: f32) -> SizingConfig {
        SizingConfig {
            min_size,
            max_size,
            ..SizingConfig::default()
        }
    }

    #[test]
    fn scale_is_area_proportional() {
        let scale = SizeScale::new(100.0, 0.0, 200.0);
        assert_eq!(scale.scale(100.0), 200.0);
        assert!((scale.scale(25.0) - 100.0).abs() < 1e-4);
        assert_eq!(scale.scale(0.0), 0.0);
    }

    #[test]
    fn example_scenario_fits_budget() {
        let canvas = Canvas::new(600.0, 600.0, 0.0);
        let mut list = items(&[10.0, 20.0, 30.0, 40.0, 100.0]);
        let bounds = normalize_sizes(&mut list, ShapeKind::Circle, &canvas, &config(20.0, 200.0));
        let total: f32 = list.iter().map(|item| item.area).sum();
        assert!(total <= 180_000.0 * 1.0001, "total {total}");
        let largest = list
            .iter()
            .max_by(|a, b| a.size.total_cmp(&b.size))
            .expect("items");
        assert_eq!(largest.value, 100.0);
        assert!(list[0].size < list[1].size);
        for item in &list {
            assert!(item.size >= bounds.min - 1e-3 && item.size <= bounds.max + 1e-3);
        }
    }

    #[test]
    fn rescale_preserves_area_ratios() {
        let canvas = Canvas::new(600.0, 600.0, 0.0);
        let mut list = items(&[25.0, 50.0, 100.0]);
        normalize_sizes(&mut list, ShapeKind::Square, &canvas, &config(1.0, 400.0));
        let ratio = list[0].area / list[2].area;
        assert!((ratio - 0.25).abs() < 1e-3, "ratio {ratio}");
        let ratio = list[1].area / list[2].area;
        assert!((ratio - 0.5).abs() < 1e-3, "ratio {ratio}");
    }

    #[test]
    fn clustered_values_get_spread_boost() {
        let canvas = Canvas::new(2000.0, 2000.0, 0.0);
        let mut list = items(&[90.0, 100.0]);
        normalize_sizes(&mut list, ShapeKind::Circle, &canvas, &config(10.0, 100.0));
        assert!((list[1].size - 70.0).abs() < 1e-3, "size {}", list[1].size);
    }

    #[test]
    fn all_equal_values_share_one_size() {
        let canvas = Canvas::new(400.0, 300.0, 20.0);
        let mut list = items(&[5.0; 12]);
        let bounds = normalize_sizes(&mut list, ShapeKind::Triangle, &canvas, &config(20.0, 200.0));
        let first = list[0].size;
        assert!(list.iter().all(|item| (item.size - first).abs() < 1e-4));
        let total: f32 = list.iter().map(|item| item.area).sum();
        assert!(total <= bounds.budget * 1.0001);
    }

    #[test]
    fn outlier_keeps_small_items_on_the_floor() {
        let canvas = Canvas::new(600.0, 600.0, 0.0);
        let mut list = items(&[1e-6, 1e-3, 1e12]);
        let bounds = normalize_sizes(&mut list, ShapeKind::Circle, &canvas, &config(20.0, 200.0));
        assert!((list[0].size - bounds.min).abs() < 1e-4);
        assert!((list[1].size - bounds.min).abs() < 1e-4);
        assert!(list[2].size <= bounds.max);
        let total: f32 = list.iter().map(|item| item.area).sum();
        assert!(total <= bounds.budget * 1.0001);
    }

    #[test]
    fn crowded_canvas_lowers_the_floor() {
        let canvas = Canvas::new(200.0, 200.0, 0.0);
        let mut list = items(&[1.0; 400]);
        let bounds = normalize_sizes(&mut list, ShapeKind::Square, &canvas, &config(20.0, 200.0));
        assert!(bounds.min < 20.0);
        assert!(list.iter().all(|item| (item.size - bounds.min).abs() < 1e-4));
        let total: f32 = list.iter().map(|item| item.area).sum();
        assert!(total <= bounds.budget * 1.0001);
    }

    #[test]
    fn max_size_respects_canvas_height() {
        let canvas = Canvas::new(1000.0, 250.0, 0.0);
        let (_, max) = size_bounds(ShapeKind::Square, &canvas, &config(20.0, 200.0));
        assert!((max - 100.0).abs() < 1e-4);
    }
}
