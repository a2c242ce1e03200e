// Append-only drawing surface. Nodes are never removed or edited once
// written; `to_svg` serialises the tree in insertion order.

use crate::ir::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub fill: String,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub opacity: f32,
}

impl Paint {
    pub fn fill(color: impl Into<String>) -> Self {
        Self {
            fill: color.into(),
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
        }
    }

    pub fn with_stroke(mut self, color: impl Into<String>, width: f32) -> Self {
        self.stroke = Some(color.into());
        self.stroke_width = width;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    fn attrs(&self) -> String {
        let mut out = format!(" fill=\"{}\"", escape_xml(&self.fill));
        if let Some(stroke) = &self.stroke {
            out.push_str(&format!(
                " stroke=\"{}\" stroke-width=\"{:.2}\"",
                escape_xml(stroke),
                self.stroke_width
            ));
        }
        if self.opacity < 1.0 {
            out.push_str(&format!(" fill-opacity=\"{:.2}\"", self.opacity));
        }
        out
    }
}

/// Multi-line text; `y` is the vertical centre of the whole block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub x: f32,
    pub y: f32,
    pub lines: Vec<String>,
    pub line_height: f32,
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group {
        class: Option<String>,
    },
    Circle {
        center: Point,
        r: f32,
        paint: Paint,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rx: f32,
        paint: Paint,
    },
    Polygon {
        points: Vec<Point>,
        paint: Paint,
    },
    Line {
        from: Point,
        to: Point,
        stroke: String,
        width: f32,
    },
    Text(TextNode),
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        href: String,
    },
    RadialGradient {
        id: String,
        stops: Vec<(f32, String)>,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    defs: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `kind` under `parent` (or at the top level). A parent id that
    /// does not belong to this scene appends at the top level.
    pub fn append(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = parent.filter(|p| p.0 < self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Register a paint server emitted inside `<defs>`.
    pub fn define(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.defs.push(id);
        id
    }

    pub fn group(&mut self, parent: Option<NodeId>, class: &str) -> NodeId {
        self.append(
            parent,
            NodeKind::Group {
                class: Some(class.to_string()),
            },
        )
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Every node below `id`, depth first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .node(id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(node) = self.node(next) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn to_svg(&self, width: f32, height: f32, background: Option<&str>) -> String {
        let mut svg = String::new();
        let width = width.max(1.0);
        let height = height.max(1.0);
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        ));
        if !self.defs.is_empty() {
            svg.push_str("<defs>");
            for id in &self.defs {
                self.write_node(&mut svg, *id);
            }
            svg.push_str("</defs>");
        }
        if let Some(background) = background {
            svg.push_str(&format!(
                "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
                escape_xml(background)
            ));
        }
        for id in &self.roots {
            self.write_node(&mut svg, *id);
        }
        svg.push_str("</svg>");
        svg
    }

    fn write_node(&self, svg: &mut String, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Group { class } => {
                match class {
                    Some(class) => svg.push_str(&format!("<g class=\"{}\">", escape_xml(class))),
                    None => svg.push_str("<g>"),
                }
                for child in &node.children {
                    self.write_node(svg, *child);
                }
                svg.push_str("</g>");
            }
            NodeKind::Circle { center, r, paint } => {
                svg.push_str(&format!(
                    "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\"{}/>",
                    center.x,
                    center.y,
                    r,
                    paint.attrs()
                ));
            }
            NodeKind::Rect {
                x,
                y,
                width,
                height,
                rx,
                paint,
            } => {
                svg.push_str(&format!(
                    "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"{rx:.2}\" ry=\"{rx:.2}\"{}/>",
                    paint.attrs()
                ));
            }
            NodeKind::Polygon { points, paint } => {
                let points = points
                    .iter()
                    .map(|p| format!("{:.2},{:.2}", p.x, p.y))
                    .collect::<Vec<_>>()
                    .join(" ");
                svg.push_str(&format!("<polygon points=\"{points}\"{}/>", paint.attrs()));
            }
            NodeKind::Line {
                from,
                to,
                stroke,
                width,
            } => {
                svg.push_str(&format!(
                    "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{width:.2}\"/>",
                    from.x,
                    from.y,
                    to.x,
                    to.y,
                    escape_xml(stroke)
                ));
            }
            NodeKind::Text(text) => write_text(svg, text),
            NodeKind::Image {
                x,
                y,
                width,
                height,
                href,
            } => {
                let href = escape_xml(href);
                svg.push_str(&format!(
                    "<image x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" href=\"{href}\" xlink:href=\"{href}\" preserveAspectRatio=\"xMidYMid meet\"/>",
                ));
            }
            NodeKind::RadialGradient { id, stops } => {
                svg.push_str(&format!(
                    "<radialGradient id=\"{}\" cx=\"35%\" cy=\"30%\" r=\"75%\">",
                    escape_xml(id)
                ));
                for (offset, color) in stops {
                    svg.push_str(&format!(
                        "<stop offset=\"{:.0}%\" stop-color=\"{}\"/>",
                        offset.clamp(0.0, 1.0) * 100.0,
                        escape_xml(color)
                    ));
                }
                svg.push_str("</radialGradient>");
            }
        }
    }
}

fn write_text(svg: &mut String, text: &TextNode) {
    if text.lines.is_empty() {
        return;
    }
    let step = text.font_size * text.line_height;
    let first = text.y - step * (text.lines.len() as f32 - 1.0) / 2.0;
    let x = text.x;
    svg.push_str(&format!(
        "<text x=\"{x:.2}\" y=\"{first:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{:.2}\" font-weight=\"{}\" fill=\"{}\">",
        escape_xml(&text.font_family),
        text.font_size,
        text.font_weight,
        escape_xml(&text.fill)
    ));
    for (idx, line) in text.lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { step };
        svg.push_str(&format!(
            "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        ));
    }
    svg.push_str("</text>");
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_serialise_inside_their_group() {
        let mut scene = Scene::new();
        let root = scene.group(None, "pack");
        scene.append(
            Some(root),
            NodeKind::Circle {
                center: Point::new(10.0, 10.0),
                r: 5.0,
                paint: Paint::fill("#FF0000"),
            },
        );
        let svg = scene.to_svg(100.0, 100.0, None);
        let group = svg.find("<g class=\"pack\">").expect("group");
        let circle = svg.find("<circle").expect("circle");
        let close = svg.find("</g>").expect("close");
        assert!(group < circle && circle < close);
        assert_eq!(scene.descendants(root).len(), 1);
    }

    #[test]
    fn gradients_go_into_defs() {
        let mut scene = Scene::new();
        scene.define(NodeKind::RadialGradient {
            id: "g0".to_string(),
            stops: vec![(0.0, "#FFFFFF".to_string()), (1.0, "#000000".to_string())],
        });
        let svg = scene.to_svg(10.0, 10.0, Some("#FFFFFF"));
        assert!(svg.contains("<defs><radialGradient id=\"g0\""));
        assert!(svg.contains("offset=\"100%\""));
        assert!(scene.roots().is_empty());
    }

    #[test]
    fn text_is_escaped_and_split_into_tspans() {
        let mut scene = Scene::new();
        scene.append(
            None,
            NodeKind::Text(TextNode {
                x: 50.0,
                y: 50.0,
                lines: vec!["Bosnia &".to_string(), "<Herzegovina>".to_string()],
                line_height: 1.2,
                font_family: "sans-serif".to_string(),
                font_size: 10.0,
                font_weight: 400,
                fill: "#333333".to_string(),
            }),
        );
        let svg = scene.to_svg(100.0, 100.0, None);
        assert!(svg.contains("Bosnia &amp;"));
        assert!(svg.contains("&lt;Herzegovina&gt;"));
        assert_eq!(svg.matches("<tspan").count(), 2);
        assert!(svg.contains("y=\"44.00\""));
    }

    #[test]
    fn unknown_parent_appends_at_top_level() {
        let mut scene = Scene::new();
        let id = scene.append(Some(NodeId(42)), NodeKind::Group { class: None });
        assert_eq!(scene.roots(), &[id]);
        assert_eq!(scene.node(id).and_then(|n| n.parent), None);
    }
}
