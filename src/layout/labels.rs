// Label and icon placement. Shapes below the per-shape size threshold get an
// external label next to them; larger shapes host the category and value text
// inside, falling back to an external label when nothing fits.

use super::geometry::ShapeGeometry;
use super::text::{FitRequest, FitResult, TextMeasure, fit_text, text_width};
use super::{
    ExternalLabel, IconPlacement, InternalLabel, ItemLabel, LabelSide, PackedItem, PlacedText,
    Rect, TextBlock,
};
use crate::config::LabelConfig;
use crate::ir::{Canvas, Point, ShapeKind};
use crate::theme::{Theme, contrast_text_color};

const COMPACT_SUFFIXES: [(f32, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
const TRIANGLE_ROOM_RATIO: f32 = 0.55;

/// Format a value for display, with compact suffixes above a thousand and
/// the unit placed the way it is conventionally written.
pub fn format_value(value: f32, unit: Option<&str>, compact: bool) -> String {
    let number = if compact && value.abs() >= 1000.0 {
        compact_number(value)
    } else {
        trim_decimals(value, 2)
    };
    let unit = unit.map(str::trim).filter(|u| !u.is_empty());
    match unit {
        None => number,
        Some(u) if is_prefix_unit(u) => format!("{u}{number}"),
        Some("%") => format!("{number}%"),
        Some(u) => format!("{number} {u}"),
    }
}

fn compact_number(value: f32) -> String {
    let magnitude = value.abs();
    for (idx, (scale, suffix)) in COMPACT_SUFFIXES.iter().enumerate() {
        if magnitude < *scale {
            continue;
        }
        let scaled = (value / scale * 10.0).round() / 10.0;
        // 999_950 rounds to 1000.0K; promote to the next suffix.
        if scaled.abs() >= 1000.0 && idx > 0 {
            let (up_scale, up_suffix) = COMPACT_SUFFIXES[idx - 1];
            return format!("{}{up_suffix}", trim_decimals(value / up_scale, 1));
        }
        return format!("{}{suffix}", trim_decimals(scaled, 1));
    }
    trim_decimals(value, 2)
}

fn trim_decimals(value: f32, decimals: usize) -> String {
    let text = format!("{value:.decimals$}");
    if !text.contains('.') {
        return text;
    }
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_prefix_unit(unit: &str) -> bool {
    unit.chars().any(|c| matches!(c, '$' | '€' | '£' | '¥'))
}

/// Everything label placement reads besides the item itself.
pub struct LabelContext<'a> {
    pub shape: ShapeKind,
    pub canvas: &'a Canvas,
    pub theme: &'a Theme,
    pub config: &'a LabelConfig,
    pub measure: &'a dyn TextMeasure,
}

impl LabelContext<'_> {
    fn geom(&self) -> &'static dyn ShapeGeometry {
        self.shape.geometry()
    }

    fn category<'i>(&self, item: &'i PackedItem) -> Option<&'i str> {
        if !self.config.show_category {
            return None;
        }
        Some(item.id.trim()).filter(|id| !id.is_empty())
    }

    fn placed(&self, x: f32, y: f32, fit: &FitResult, weight: u16, color: &str) -> PlacedText {
        PlacedText {
            x,
            y,
            block: fit.to_block(self.theme.line_height),
            font_weight: weight,
            color: color.to_string(),
        }
    }
}

pub fn place_label(ctx: &LabelContext<'_>, item: &PackedItem) -> ItemLabel {
    let threshold = ctx.config.small.for_shape(ctx.shape);
    if item.size < threshold {
        return ItemLabel::External(external_label(ctx, item));
    }
    match internal_label(ctx, item) {
        Some(label) => ItemLabel::Internal(label),
        None => {
            tracing::debug!(id = %item.id, size = item.size, "internal label did not fit; placing outside");
            ItemLabel::External(external_label(ctx, item))
        }
    }
}

/// Vertical space inside a shape usable for text.
fn text_room(shape: ShapeKind, size: f32, padding: f32) -> f32 {
    let (_, h) = shape.geometry().extents(size);
    match shape {
        ShapeKind::Circle | ShapeKind::Square => h * padding,
        ShapeKind::Triangle => h * TRIANGLE_ROOM_RATIO,
    }
}

/// Narrowest padded chord across a vertical span (offsets from the shape's
/// box centre). Chords are concave or linear in the offset, so the ends bound it.
fn span_width(geom: &dyn ShapeGeometry, size: f32, top: f32, bottom: f32, padding: f32) -> f32 {
    let top_w = geom.max_width_at_offset(size, top);
    let bottom_w = geom.max_width_at_offset(size, bottom);
    top_w.min(bottom_w) * padding
}

struct BlockPlan {
    icon: f32,
    category: f32,
    value: f32,
    gap: f32,
}

impl BlockPlan {
    fn total(&self) -> f32 {
        let mut total = self.value;
        if self.icon > 0.0 {
            total += self.icon + self.gap;
        }
        if self.category > 0.0 {
            total += self.category + self.gap;
        }
        total
    }

    /// Offsets (top, bottom) of the icon, category and value bands when the
    /// block is centred on `center`.
    fn bands(&self, center: f32) -> [(f32, f32); 3] {
        let mut cursor = center - self.total() / 2.0;
        let mut band = |height: f32| {
            if height <= 0.0 {
                return (cursor, cursor);
            }
            let out = (cursor, cursor + height);
            cursor += height + self.gap;
            out
        };
        let icon = band(self.icon);
        let category = band(self.category);
        let value = band(self.value);
        [icon, category, value]
    }
}

fn internal_label(ctx: &LabelContext<'_>, item: &PackedItem) -> Option<InternalLabel> {
    let geom = ctx.geom();
    let theme = ctx.theme;
    let config = ctx.config;
    let size = item.size;
    let pad = config.inner_padding;
    let room = text_room(ctx.shape, size, pad);
    let center = geom.text_center_offset(size);
    let line_height = theme.line_height;
    let min_size = theme.min_font_size;
    let category = ctx.category(item);
    let text_color = contrast_text_color(&item.color, theme);

    let icon_href = item
        .icon
        .as_deref()
        .filter(|_| size >= config.icon.for_shape(ctx.shape));
    let icon_size = if icon_href.is_some() {
        (config.icon_fraction * room).max(0.0)
    } else {
        0.0
    };

    let mut value_base = theme.value_font_size.max(min_size);
    let mut label_base = theme.label_font_size.max(min_size);
    loop {
        let mut plan = BlockPlan {
            icon: icon_size,
            category: 0.0,
            value: value_base * line_height,
            gap: config.line_gap,
        };

        // Category lines change the block height, which moves the category
        // band; refit until the line count settles.
        let mut category_fit: Option<FitResult> = None;
        if let Some(text) = category {
            let mut lines = 1usize;
            for _ in 0..=config.max_category_lines.max(1) {
                plan.category = lines as f32 * label_base * line_height;
                let [_, band, _] = plan.bands(center);
                let width = span_width(geom, size, band.0, band.1, pad);
                let fit = fit_text(
                    ctx.measure,
                    &FitRequest {
                        text,
                        max_width: width,
                        font_family: &theme.font_family,
                        font_weight: theme.label_font_weight,
                        base_size: label_base,
                        min_size,
                        max_lines: config.max_category_lines.max(1),
                    },
                );
                let settled = fit.lines.len() <= lines;
                lines = fit.lines.len().max(1);
                category_fit = Some(fit);
                if settled {
                    break;
                }
            }
            if let Some(fit) = &category_fit {
                plan.category = fit.to_block(line_height).height;
            }
        }

        let [_, _, value_band] = plan.bands(center);
        let value_width = span_width(geom, size, value_band.0, value_band.1, pad);
        let value_fit = fit_text(
            ctx.measure,
            &FitRequest {
                text: &item.value_text,
                max_width: value_width,
                font_family: &theme.font_family,
                font_weight: theme.value_font_weight,
                base_size: value_base,
                min_size,
                max_lines: 1,
            },
        );
        plan.value = value_fit.to_block(line_height).height;

        if !value_fit.truncated && !value_fit.is_empty() && plan.total() <= room {
            if let Some(label) = assemble_internal(
                ctx,
                item,
                &plan,
                center,
                category_fit.as_ref(),
                &value_fit,
                icon_href,
                text_color,
            ) {
                return Some(label);
            }
        }

        if value_base <= min_size && label_base <= min_size {
            return None;
        }
        value_base = (value_base - 1.0).max(min_size);
        label_base = (label_base - 1.0).max(min_size);
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble_internal(
    ctx: &LabelContext<'_>,
    item: &PackedItem,
    plan: &BlockPlan,
    center: f32,
    category_fit: Option<&FitResult>,
    value_fit: &FitResult,
    icon_href: Option<&str>,
    text_color: &str,
) -> Option<InternalLabel> {
    let geom = ctx.geom();
    let theme = ctx.theme;
    let size = item.size;
    let pad = ctx.config.inner_padding;
    let [icon_band, category_band, value_band] = plan.bands(center);

    let fits_lines = |fit: &FitResult, band: (f32, f32), weight: u16| {
        let line = fit.font_size * theme.line_height;
        fit.lines.iter().enumerate().all(|(idx, text)| {
            let top = band.0 + idx as f32 * line;
            let allowed = span_width(geom, size, top, top + line, pad);
            text_width(ctx.measure, text, &theme.font_family, fit.font_size, weight) <= allowed + 0.01
        })
    };
    if !fits_lines(value_fit, value_band, theme.value_font_weight) {
        return None;
    }
    let category = match category_fit {
        Some(fit) if !fit.is_empty() => {
            if !fits_lines(fit, category_band, theme.label_font_weight) {
                return None;
            }
            let y = item.position.y + (category_band.0 + category_band.1) / 2.0;
            Some(ctx.placed(item.position.x, y, fit, theme.label_font_weight, text_color))
        }
        _ => None,
    };

    let icon = match icon_href {
        Some(href) if plan.icon > 0.0 => {
            let chord = span_width(geom, size, icon_band.0, icon_band.1, pad);
            let side = plan.icon.min(chord);
            (side > 0.0).then(|| IconPlacement {
                href: href.to_string(),
                x: item.position.x - side / 2.0,
                y: item.position.y + icon_band.0 + (plan.icon - side) / 2.0,
                size: side,
            })
        }
        _ => None,
    };

    let value_y = item.position.y + (value_band.0 + value_band.1) / 2.0;
    Some(InternalLabel {
        category,
        value: ctx.placed(
            item.position.x,
            value_y,
            value_fit,
            theme.value_font_weight,
            text_color,
        ),
        icon,
    })
}

fn external_label(ctx: &LabelContext<'_>, item: &PackedItem) -> ExternalLabel {
    let theme = ctx.theme;
    let config = ctx.config;
    let canvas = ctx.canvas;
    let geom = ctx.geom();
    let (_, half_h) = geom.half_extents(item.size);
    let Point { x, y } = item.position;

    let text = match ctx.category(item) {
        Some(category) => format!("{category}: {}", item.value_text),
        None => item.value_text.clone(),
    };
    let chip_pad = config.chip_padding;
    // The chip is clamped into the canvas afterwards; width is not tied to `x`.
    let budget = (canvas.width - 2.0 * chip_pad).min(config.external_max_width);
    let fit = fit_text(
        ctx.measure,
        &FitRequest {
            text: &text,
            max_width: budget,
            font_family: &theme.font_family,
            font_weight: theme.label_font_weight,
            base_size: theme.external_font_size.max(theme.min_font_size),
            min_size: theme.min_font_size,
            max_lines: config.external_max_lines.max(1),
        },
    );
    let block = fit.to_block(theme.line_height);
    let chip_h = block.height + 2.0 * chip_pad;

    let shape_bottom = y + half_h;
    let shape_top = y - half_h;
    let below_top = shape_bottom + config.external_gap;
    let above_bottom = shape_top - config.external_gap;

    let (side, block, label_y) = if below_top + chip_h <= canvas.height {
        (LabelSide::Below, block, below_top + chip_h / 2.0)
    } else if above_bottom - chip_h >= canvas.top_margin {
        (LabelSide::Above, block, above_bottom - chip_h / 2.0)
    } else {
        let inside = inside_fallback(ctx, item, &text);
        (
            LabelSide::Inside,
            inside,
            y + geom.text_center_offset(item.size),
        )
    };

    let chip_w = block.width + 2.0 * chip_pad;
    let chip_h = block.height + 2.0 * chip_pad;
    let label_x = if chip_w >= canvas.width {
        canvas.width / 2.0
    } else {
        x.clamp(chip_w / 2.0, canvas.width - chip_w / 2.0)
    };
    let chip = Rect::centered(label_x, label_y, chip_w, chip_h);

    let connector = match side {
        LabelSide::Below if config.connectors => {
            Some((Point::new(x, shape_bottom), Point::new(label_x, chip.y)))
        }
        LabelSide::Above if config.connectors => Some((
            Point::new(x, shape_top),
            Point::new(label_x, chip.y + chip.height),
        )),
        _ => None,
    };

    ExternalLabel {
        text: PlacedText {
            x: label_x,
            y: label_y,
            block,
            font_weight: theme.label_font_weight,
            color: theme.text_color.clone(),
        },
        side,
        chip,
        connector,
    }
}

/// Last resort: the label squeezed into the shape at the minimum font size.
fn inside_fallback(ctx: &LabelContext<'_>, item: &PackedItem, text: &str) -> TextBlock {
    let theme = ctx.theme;
    let geom = ctx.geom();
    let offset = geom.text_center_offset(item.size);
    let width = geom.max_width_at_offset(item.size, offset) * ctx.config.inner_padding;
    let fit = fit_text(
        ctx.measure,
        &FitRequest {
            text,
            max_width: width,
            font_family: &theme.font_family,
            font_weight: theme.label_font_weight,
            base_size: theme.min_font_size,
            min_size: theme.min_font_size,
            max_lines: 1,
        },
    );
    fit.to_block(theme.line_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::text::HeuristicMetrics;

    fn item(id: &str, value_text: &str, size: f32, at: Point) -> PackedItem {
        PackedItem {
            id: id.to_string(),
            value: 1.0,
            value_text: value_text.to_string(),
            group: None,
            color: "#EDC948".to_string(),
            icon: None,
            size,
            area: ShapeKind::Circle.geometry().area_from_size(size),
            position: at,
            label: ItemLabel::Hidden,
        }
    }

    fn place(item: &PackedItem, shape: ShapeKind, canvas: &Canvas) -> ItemLabel {
        let theme = Theme::classic();
        let config = LabelConfig::default();
        let measure = HeuristicMetrics::default();
        let ctx = LabelContext {
            shape,
            canvas,
            theme: &theme,
            config: &config,
            measure: &measure,
        };
        place_label(&ctx, item)
    }

    #[test]
    fn formats_compact_and_units() {
        assert_eq!(format_value(1500.0, None, true), "1.5K");
        assert_eq!(format_value(2_000_000.0, Some("$"), true), "$2M");
        assert_eq!(format_value(999_960.0, None, true), "1M");
        assert_eq!(format_value(45.0, Some("%"), true), "45%");
        assert_eq!(format_value(12.5, Some("kg"), true), "12.5 kg");
        assert_eq!(format_value(1234.567, None, false), "1234.57");
        assert_eq!(format_value(0.1, None, true), "0.1");
    }

    #[test]
    fn small_shape_gets_label_below() {
        let canvas = Canvas::new(600.0, 600.0, 40.0);
        let it = item("Chad", "12", 20.0, Point::new(300.0, 300.0));
        let ItemLabel::External(label) = place(&it, ShapeKind::Circle, &canvas) else {
            panic!("expected external label");
        };
        assert_eq!(label.side, LabelSide::Below);
        assert_eq!(label.text.block.lines, vec!["Chad: 12"]);
        assert!(label.text.y > it.position.y + it.size);
        let (from, to) = label.connector.expect("connector");
        assert_eq!(from, Point::new(300.0, 320.0));
        assert!(to.y > from.y);
    }

    #[test]
    fn label_goes_above_at_canvas_bottom() {
        let canvas = Canvas::new(600.0, 600.0, 40.0);
        let it = item("Chad", "12", 20.0, Point::new(300.0, 580.0));
        let ItemLabel::External(label) = place(&it, ShapeKind::Circle, &canvas) else {
            panic!("expected external label");
        };
        assert_eq!(label.side, LabelSide::Above);
        assert!(label.chip.y + label.chip.height <= 560.0);
    }

    #[test]
    fn cramped_small_shape_labels_inside() {
        let canvas = Canvas::new(200.0, 100.0, 40.0);
        let it = item("Chad", "12", 25.0, Point::new(100.0, 70.0));
        let ItemLabel::External(label) = place(&it, ShapeKind::Square, &canvas) else {
            panic!("expected external label");
        };
        assert_eq!(label.side, LabelSide::Inside);
        assert_eq!(label.text.block.font_size, Theme::classic().min_font_size);
        assert!(label.connector.is_none());
    }

    #[test]
    fn chip_stays_inside_canvas_near_edges() {
        let canvas = Canvas::new(600.0, 600.0, 40.0);
        let it = item("Bosnia and Herzegovina", "3.2M", 10.0, Point::new(12.0, 200.0));
        let ItemLabel::External(label) = place(&it, ShapeKind::Circle, &canvas) else {
            panic!("expected external label");
        };
        assert!(label.chip.x >= -1e-3);
        assert!(label.chip.x + label.chip.width <= canvas.width + 1e-3);
    }

    #[test]
    fn edge_label_keeps_its_value() {
        let canvas = Canvas::new(600.0, 600.0, 40.0);
        let text = |x: f32| {
            let it = item("Bosnia and Herzegovina", "3.2M", 10.0, Point::new(x, 200.0));
            let ItemLabel::External(label) = place(&it, ShapeKind::Circle, &canvas) else {
                panic!("expected external label");
            };
            label.text
        };
        let edge = text(12.0);
        let centre = text(300.0);
        assert_eq!(edge.block.lines, vec!["Bosnia and Herzegovina:", "3.2M"]);
        assert!(!edge.block.truncated);
        assert_eq!(edge.block.lines, centre.block.lines);
        assert!(edge.x > 12.0);
    }

    #[test]
    fn large_circle_hosts_both_texts() {
        let canvas = Canvas::new(600.0, 600.0, 40.0);
        let it = item("Peru", "1.5K", 60.0, Point::new(300.0, 300.0));
        let ItemLabel::Internal(label) = place(&it, ShapeKind::Circle, &canvas) else {
            panic!("expected internal label");
        };
        let category = label.category.expect("category text");
        assert_eq!(category.block.lines, vec!["Peru"]);
        assert_eq!(label.value.block.lines, vec!["1.5K"]);
        assert!(category.y < label.value.y);
        assert!(!label.value.block.truncated);
    }

    #[test]
    fn unfittable_value_falls_back_outside() {
        let canvas = Canvas::new(600.0, 600.0, 40.0);
        let it = item("Peru", "123456.78 kg", 35.0, Point::new(300.0, 300.0));
        let label = place(&it, ShapeKind::Circle, &canvas);
        assert_eq!(label.mode(), "external");
    }

    #[test]
    fn icon_only_on_large_shapes() {
        let canvas = Canvas::new(600.0, 600.0, 40.0);
        let mut big = item("Peru", "12", 70.0, Point::new(300.0, 300.0));
        big.icon = Some("flag.svg".to_string());
        let ItemLabel::Internal(label) = place(&big, ShapeKind::Circle, &canvas) else {
            panic!("expected internal label");
        };
        let icon = label.icon.expect("icon");
        let category = label.category.expect("category");
        assert!(icon.y + icon.size <= category.y);

        let mut mid = item("Peru", "12", 45.0, Point::new(300.0, 300.0));
        mid.icon = Some("flag.svg".to_string());
        let ItemLabel::Internal(label) = place(&mid, ShapeKind::Circle, &canvas) else {
            panic!("expected internal label");
        };
        assert!(label.icon.is_none());
    }

    #[test]
    fn text_colour_contrasts_with_fill() {
        let canvas = Canvas::new(600.0, 600.0, 40.0);
        let mut dark = item("Peru", "12", 60.0, Point::new(300.0, 300.0));
        dark.color = "#111111".to_string();
        let ItemLabel::Internal(label) = place(&dark, ShapeKind::Circle, &canvas) else {
            panic!("expected internal label");
        };
        assert_eq!(label.value.color, Theme::classic().light_text_color);
    }
}
