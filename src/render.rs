use crate::config::{Config, RenderConfig, Shading};
use crate::ir::{Point, ShapeKind};
use crate::layout::{
    ErrorLayout, ItemLabel, Layout, LayoutData, PackedData, PackedItem, PlacedText,
    compute_error_layout, compute_layout,
};
use crate::parser::{Payload, build_dataset};
use crate::scene::{NodeId, NodeKind, Paint, Scene, TextNode};
use crate::theme::{Theme, lighten};
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

const GRADIENT_HIGHLIGHT: f32 = 0.45;
const CHIP_RADIUS: f32 = 3.0;
const CONNECTOR_WIDTH: f32 = 0.8;

/// Lay out `payload` and append the drawing to `scene`.
///
/// Returns the root group, or `None` when the payload is unusable; in that
/// case only an error placeholder is appended.
pub fn render(scene: &mut Scene, payload: &Payload, config: &Config) -> Option<NodeId> {
    let mut config = config.clone();
    payload.style.apply(&mut config);
    match build_dataset(payload, &config) {
        Ok(dataset) => {
            let layout = compute_layout(&dataset, &config.theme, &config.layout);
            Some(draw_layout(scene, &layout, &config.theme))
        }
        Err(err) => {
            let layout = compute_error_layout(&err, &config.layout);
            draw_layout(scene, &layout, &config.theme);
            None
        }
    }
}

pub fn render_svg(layout: &Layout, theme: &Theme) -> String {
    let mut scene = Scene::new();
    draw_layout(&mut scene, layout, theme);
    scene.to_svg(layout.width, layout.height, Some(&theme.background))
}

pub fn draw_layout(scene: &mut Scene, layout: &Layout, theme: &Theme) -> NodeId {
    match &layout.diagram {
        LayoutData::Packed(data) => draw_packed(scene, data, theme),
        LayoutData::Error(err) => draw_error(scene, layout, err, theme),
    }
}

fn draw_packed(scene: &mut Scene, data: &PackedData, theme: &Theme) -> NodeId {
    let root = scene.group(None, "pack");
    let mut gradients: HashMap<String, String> = HashMap::new();
    if data.shading == Shading::Gradient {
        for item in &data.items {
            if gradients.contains_key(&item.color) {
                continue;
            }
            let id = format!("pack-shade-{}", gradients.len());
            scene.define(NodeKind::RadialGradient {
                id: id.clone(),
                stops: vec![
                    (0.0, lighten(&item.color, GRADIENT_HIGHLIGHT)),
                    (1.0, item.color.clone()),
                ],
            });
            gradients.insert(item.color.clone(), format!("url(#{id})"));
        }
    }

    for item in &data.items {
        let group = scene.group(Some(root), "pack-item");
        let fill = gradients
            .get(&item.color)
            .cloned()
            .unwrap_or_else(|| item.color.clone());
        let paint = Paint::fill(fill).with_stroke(theme.stroke_color.clone(), theme.stroke_width);
        scene.append(Some(group), shape_node(data.shape, item, paint));
        draw_label(scene, group, item, theme);
    }
    root
}

fn shape_node(shape: ShapeKind, item: &PackedItem, paint: Paint) -> NodeKind {
    let Point { x, y } = item.position;
    let (w, h) = shape.geometry().extents(item.size);
    match shape {
        ShapeKind::Circle => NodeKind::Circle {
            center: item.position,
            r: item.size,
            paint,
        },
        ShapeKind::Square => NodeKind::Rect {
            x: x - w / 2.0,
            y: y - h / 2.0,
            width: w,
            height: h,
            rx: 0.0,
            paint,
        },
        ShapeKind::Triangle => NodeKind::Polygon {
            points: vec![
                Point::new(x, y - h / 2.0),
                Point::new(x + w / 2.0, y + h / 2.0),
                Point::new(x - w / 2.0, y + h / 2.0),
            ],
            paint,
        },
    }
}

fn text_node(text: &PlacedText, theme: &Theme) -> NodeKind {
    NodeKind::Text(TextNode {
        x: text.x,
        y: text.y,
        lines: text.block.lines.clone(),
        line_height: theme.line_height,
        font_family: theme.font_family.clone(),
        font_size: text.block.font_size,
        font_weight: text.font_weight,
        fill: text.color.clone(),
    })
}

fn draw_label(scene: &mut Scene, group: NodeId, item: &PackedItem, theme: &Theme) {
    match &item.label {
        ItemLabel::Internal(label) => {
            if let Some(icon) = &label.icon {
                scene.append(
                    Some(group),
                    NodeKind::Image {
                        x: icon.x,
                        y: icon.y,
                        width: icon.size,
                        height: icon.size,
                        href: icon.href.clone(),
                    },
                );
            }
            if let Some(category) = &label.category {
                scene.append(Some(group), text_node(category, theme));
            }
            scene.append(Some(group), text_node(&label.value, theme));
        }
        ItemLabel::External(label) => {
            if let Some((from, to)) = label.connector {
                scene.append(
                    Some(group),
                    NodeKind::Line {
                        from,
                        to,
                        stroke: theme.connector_color.clone(),
                        width: CONNECTOR_WIDTH,
                    },
                );
            }
            scene.append(
                Some(group),
                NodeKind::Rect {
                    x: label.chip.x,
                    y: label.chip.y,
                    width: label.chip.width,
                    height: label.chip.height,
                    rx: CHIP_RADIUS,
                    paint: Paint::fill(theme.chip_background.clone()).with_opacity(theme.chip_opacity),
                },
            );
            scene.append(Some(group), text_node(&label.text, theme));
        }
        ItemLabel::Hidden => {}
    }
}

fn draw_error(scene: &mut Scene, layout: &Layout, err: &ErrorLayout, theme: &Theme) -> NodeId {
    let root = scene.group(None, "pack-error");
    scene.append(
        Some(root),
        NodeKind::Rect {
            x: 1.0,
            y: 1.0,
            width: (layout.width - 2.0).max(1.0),
            height: (layout.height - 2.0).max(1.0),
            rx: 6.0,
            paint: Paint::fill(theme.error_background.clone())
                .with_stroke(theme.error_color.clone(), 1.5),
        },
    );
    scene.append(
        Some(root),
        NodeKind::Text(TextNode {
            x: layout.width / 2.0,
            y: layout.height / 2.0,
            lines: vec![err.message.clone()],
            line_height: theme.line_height,
                font_family: theme.font_family.clone(),
            font_size: err.text_size,
            font_weight: 600,
            fill: theme.error_color.clone(),
        }),
    );
    root
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;
    if let Some(color) = crate::theme::parse_hex_color(&render_cfg.background) {
        pixmap.fill(resvg::tiny_skia::Color::from_rgba8(color.0, color.1, color.2, 255));
    }

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}
