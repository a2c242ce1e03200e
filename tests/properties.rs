//! Property tests for sizing, text fitting and both layout solvers.

use area_pack_renderer::config::{RelaxConfig, SizingConfig, TangentConfig};
use area_pack_renderer::ir::{Canvas, Item, ShapeKind};
use area_pack_renderer::layout::relax::relax_layout;
use area_pack_renderer::layout::sizing::normalize_sizes;
use area_pack_renderer::layout::tangent::tangent_layout;
use area_pack_renderer::layout::text::{FitRequest, HeuristicMetrics, fit_text};
use proptest::prelude::*;

fn shape_strategy() -> impl Strategy<Value = ShapeKind> {
    prop_oneof![
        Just(ShapeKind::Circle),
        Just(ShapeKind::Square),
        Just(ShapeKind::Triangle),
    ]
}

fn items_from(values: &[f32]) -> Vec<Item> {
    values
        .iter()
        .enumerate()
        .map(|(idx, v)| Item::new(format!("n{idx}"), *v))
        .collect()
}

fn sized(sizes: &[f32], shape: ShapeKind) -> Vec<Item> {
    sizes
        .iter()
        .enumerate()
        .map(|(idx, size)| {
            let mut item = Item::new(format!("n{idx}"), *size);
            item.set_size(shape, *size);
            item
        })
        .collect()
}

fn request(text: &str, max_width: f32, max_lines: usize) -> FitRequest<'_> {
    FitRequest {
        text,
        max_width,
        font_family: "sans-serif",
        font_weight: 400,
        base_size: 12.0,
        min_size: 8.0,
        max_lines,
    }
}

proptest! {
    #[test]
    fn sizing_respects_budget_and_bounds(
        values in prop::collection::vec(1e-3f32..1e7, 1..60),
        shape in shape_strategy(),
        width in 200.0f32..1200.0,
        height in 200.0f32..1200.0,
    ) {
        let canvas = Canvas::new(width, height, 30.0);
        let config = SizingConfig::default();
        let mut items = items_from(&values);
        let bounds = normalize_sizes(&mut items, shape, &canvas, &config);

        let total: f32 = items.iter().map(|i| i.area).sum();
        prop_assert!(total <= bounds.budget * 1.001, "total {} > budget {}", total, bounds.budget);
        for item in &items {
            prop_assert!(item.size >= bounds.min - 1e-3, "{} below {}", item.size, bounds.min);
            prop_assert!(item.size <= bounds.max + 1e-3, "{} above {}", item.size, bounds.max);
        }
    }

    #[test]
    fn unclamped_areas_are_proportional(
        values in prop::collection::vec(1.0f32..1e5, 2..30),
        shape in shape_strategy(),
    ) {
        let canvas = Canvas::new(900.0, 900.0, 0.0);
        let mut items = items_from(&values);
        let bounds = normalize_sizes(&mut items, shape, &canvas, &SizingConfig::default());
        let free: Vec<&Item> = items.iter().filter(|i| i.size > bounds.min + 1e-2).collect();
        for pair in free.windows(2) {
            let area_ratio = pair[0].area / pair[1].area;
            let value_ratio = pair[0].value / pair[1].value;
            prop_assert!(
                (area_ratio / value_ratio - 1.0).abs() < 2e-3,
                "area ratio {} vs value ratio {}", area_ratio, value_ratio
            );
        }
    }

    #[test]
    fn text_fit_is_idempotent_and_unconstrained_text_stays_whole(
        text in "[A-Za-z]{1,10}( [A-Za-z]{1,10}){0,4}",
        max_width in 1.0f32..300.0,
        max_lines in 1usize..4,
    ) {
        let measure = HeuristicMetrics::default();
        let req = request(&text, max_width, max_lines);
        prop_assert_eq!(fit_text(&measure, &req), fit_text(&measure, &req));

        let natural = text.chars().count() as f32 * 12.0 * 0.6;
        let wide = fit_text(&measure, &request(&text, natural + 1.0, max_lines));
        prop_assert_eq!(wide.lines.len(), 1);
        prop_assert_eq!(wide.font_size, 12.0);
        prop_assert!(!wide.truncated);
    }

    #[test]
    fn narrower_width_never_grows_font_or_drops_lines(
        text in "[A-Za-z]{1,10}( [A-Za-z]{1,10}){0,4}",
        wide in 20.0f32..300.0,
        shrink in 0.05f32..1.0,
        max_lines in 1usize..4,
    ) {
        let measure = HeuristicMetrics::default();
        let narrow = wide * shrink;
        let a = fit_text(&measure, &request(&text, wide, max_lines));
        let b = fit_text(&measure, &request(&text, narrow, max_lines));
        prop_assert!(b.font_size <= a.font_size, "{} > {}", b.font_size, a.font_size);
        if a.font_size == b.font_size && !a.truncated && !b.truncated {
            prop_assert!(b.lines.len() >= a.lines.len());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn relaxation_keeps_shapes_inside(
        sizes in prop::collection::vec(5.0f32..60.0, 1..100),
        shape in shape_strategy(),
    ) {
        let canvas = Canvas::new(800.0, 700.0, 40.0);
        let mut items = sized(&sizes, shape);
        relax_layout(&mut items, &[], shape, &canvas, &RelaxConfig::default());
        let geom = shape.geometry();
        for item in &items {
            let (hw, hh) = geom.half_extents(item.size);
            let p = item.position;
            prop_assert!(p.x - hw >= -1e-2 && p.x + hw <= canvas.width + 1e-2);
            prop_assert!(p.y - hh >= canvas.top_margin - 1e-2 && p.y + hh <= canvas.height + 1e-2);
        }
    }

    #[test]
    fn single_group_adds_no_displacement(
        sizes in prop::collection::vec(5.0f32..50.0, 1..25),
    ) {
        let canvas = Canvas::new(600.0, 600.0, 20.0);
        let config = RelaxConfig::default();
        let shape = ShapeKind::Circle;
        let mut plain = sized(&sizes, shape);
        let mut grouped: Vec<Item> = plain.iter().cloned().map(|i| i.with_group("only")).collect();
        relax_layout(&mut plain, &[], shape, &canvas, &config);
        relax_layout(&mut grouped, &["only".to_string()], shape, &canvas, &config);
        for (a, b) in plain.iter().zip(&grouped) {
            prop_assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn tangent_placements_respect_overlap_threshold(
        sizes in prop::collection::vec(10.0f32..80.0, 1..12),
        shape in shape_strategy(),
    ) {
        let canvas = Canvas::new(600.0, 600.0, 0.0);
        let config = TangentConfig::default();
        let items = sized(&sizes, shape);
        let placement = tangent_layout(&items, shape, &canvas, &config);
        let geom = shape.geometry();
        let placed: Vec<(usize, _)> = placement
            .positions
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| p.map(|p| (idx, p)))
            .collect();
        prop_assert_eq!(placed.len() + placement.dropped.len(), items.len());
        for (n, &(i, pi)) in placed.iter().enumerate() {
            for &(j, pj) in &placed[n + 1..] {
                let overlap = geom.overlap_area(pi, items[i].size, pj, items[j].size);
                let smaller = items[i].area.min(items[j].area);
                prop_assert!(overlap / smaller <= config.overlap_threshold + 1e-3);
            }
        }
    }
}
