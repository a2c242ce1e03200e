mod error;
pub mod geometry;
pub mod labels;
pub mod relax;
pub mod sizing;
pub mod tangent;
pub mod text;
pub(crate) mod types;
pub use error::compute_error_layout;
pub use types::*;

use crate::config::{LayoutConfig, SolverKind};
use crate::ir::{Dataset, Item};
use crate::theme::Theme;
use labels::{LabelContext, format_value, place_label};
use text::{TextMeasure, text_measurer};

/// Size, place and label every item of `dataset`.
pub fn compute_layout(dataset: &Dataset, theme: &Theme, config: &LayoutConfig) -> Layout {
    let measure = text_measurer(config);
    compute_layout_with(dataset, theme, config, measure.as_ref())
}

/// [`compute_layout`] with an explicit text measurement backend.
pub fn compute_layout_with(
    dataset: &Dataset,
    theme: &Theme,
    config: &LayoutConfig,
    measure: &dyn TextMeasure,
) -> Layout {
    let span = tracing::debug_span!("compute_layout", items = dataset.items.len());
    let _guard = span.enter();

    let shape = dataset.shape;
    let canvas = dataset.canvas;
    let mut items: Vec<Item> = dataset.items.clone();
    let bounds = sizing::normalize_sizes(&mut items, shape, &canvas, &config.sizing);
    tracing::debug!(
        min = bounds.min,
        max = bounds.max,
        budget = bounds.budget,
        "sizes normalised"
    );

    let solver = effective_solver(config, items.len());
    let mut dropped: Vec<String> = Vec::new();
    match solver {
        SolverKind::Tangent => {
            let placement = tangent::tangent_layout(&items, shape, &canvas, &config.tangent);
            dropped = placement
                .dropped
                .iter()
                .map(|&idx| items[idx].id.clone())
                .collect();
            let mut kept = Vec::with_capacity(items.len());
            for (item, position) in items.into_iter().zip(placement.positions) {
                if let Some(position) = position {
                    kept.push(Item { position, ..item });
                }
            }
            items = kept;
        }
        _ => relax::relax_layout(&mut items, &dataset.groups, shape, &canvas, &config.relax),
    }

    let ctx = LabelContext {
        shape,
        canvas: &canvas,
        theme,
        config: &config.labels,
        measure,
    };
    let unit = dataset.value_unit.as_deref();
    let packed: Vec<PackedItem> = items
        .into_iter()
        .map(|item| {
            let mut packed = PackedItem {
                value_text: format_value(item.value, unit, config.labels.compact_numbers),
                id: item.id,
                value: item.value,
                group: item.group,
                color: item.color,
                icon: item.icon,
                size: item.size,
                area: item.area,
                position: item.position,
                label: ItemLabel::Hidden,
            };
            packed.label = place_label(&ctx, &packed);
            packed
        })
        .collect();

    let external = packed
        .iter()
        .filter(|item| matches!(item.label, ItemLabel::External(_)))
        .count();
    tracing::debug!(
        solver = ?solver,
        placed = packed.len(),
        dropped = dropped.len(),
        external_labels = external,
        "layout complete"
    );

    Layout {
        width: canvas.width,
        height: canvas.height,
        diagram: LayoutData::Packed(PackedData {
            shape,
            shading: config.shading,
            solver,
            canvas,
            items: packed,
            dropped,
        }),
    }
}

fn effective_solver(config: &LayoutConfig, count: usize) -> SolverKind {
    match config.solver {
        SolverKind::Auto if count <= config.tangent.max_items => SolverKind::Tangent,
        SolverKind::Auto => SolverKind::Relax,
        other => other,
    }
}
