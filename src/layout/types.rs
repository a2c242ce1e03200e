use crate::config::{Shading, SolverKind};
use crate::ir::{Canvas, Point, ShapeKind};

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }
}

/// A text block anchored at its centre.
#[derive(Debug, Clone)]
pub struct PlacedText {
    pub x: f32,
    pub y: f32,
    pub block: TextBlock,
    pub font_weight: u16,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct IconPlacement {
    pub href: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

#[derive(Debug, Clone)]
pub struct InternalLabel {
    pub category: Option<PlacedText>,
    pub value: PlacedText,
    pub icon: Option<IconPlacement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    Below,
    Above,
    Inside,
}

#[derive(Debug, Clone)]
pub struct ExternalLabel {
    pub text: PlacedText,
    pub side: LabelSide,
    pub chip: Rect,
    pub connector: Option<(Point, Point)>,
}

#[derive(Debug, Clone)]
pub enum ItemLabel {
    Internal(InternalLabel),
    External(ExternalLabel),
    Hidden,
}

impl ItemLabel {
    pub fn mode(&self) -> &'static str {
        match self {
            ItemLabel::Internal(_) => "internal",
            ItemLabel::External(_) => "external",
            ItemLabel::Hidden => "hidden",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackedItem {
    pub id: String,
    pub value: f32,
    pub value_text: String,
    pub group: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub size: f32,
    pub area: f32,
    pub position: Point,
    pub label: ItemLabel,
}

#[derive(Debug, Clone)]
pub struct PackedData {
    pub shape: ShapeKind,
    pub shading: Shading,
    pub solver: SolverKind,
    pub canvas: Canvas,
    pub items: Vec<PackedItem>,
    /// Ids the tangent search discarded to reach a valid placement.
    pub dropped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ErrorLayout {
    pub message: String,
    pub text_size: f32,
}

#[derive(Debug, Clone)]
pub enum LayoutData {
    Packed(PackedData),
    Error(ErrorLayout),
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub diagram: LayoutData,
}

impl Layout {
    pub fn packed(&self) -> Option<&PackedData> {
        match &self.diagram {
            LayoutData::Packed(data) => Some(data),
            LayoutData::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.diagram, LayoutData::Error(_))
    }
}
