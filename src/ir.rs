use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Circle,
    Square,
    Triangle,
}

impl ShapeKind {
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Triangle => "triangle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One data row rendered as a shape.
///
/// `size` is the radius for circles and the side length for squares and
/// triangles. `area` always mirrors `size`; call [`Item::set_size`] rather than
/// writing `size` directly.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: String,
    pub value: f32,
    pub group: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub size: f32,
    pub area: f32,
    pub position: Point,
    pub pinned: bool,
}

impl Item {
    pub fn new(id: impl Into<String>, value: f32) -> Self {
        Self {
            id: id.into(),
            value,
            group: None,
            color: String::new(),
            icon: None,
            size: 0.0,
            area: 0.0,
            position: Point::default(),
            pinned: false,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn set_size(&mut self, shape: ShapeKind, size: f32) {
        self.size = size.max(0.0);
        self.area = shape.geometry().area_from_size(self.size);
    }
}

/// Bounded drawing region. Shapes must stay inside
/// `[0, width] x [top_margin, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
    pub top_margin: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32, top_margin: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            top_margin: top_margin.clamp(0.0, height.max(1.0)),
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn usable_height(&self) -> f32 {
        (self.height - self.top_margin).max(0.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.top_margin + self.usable_height() / 2.0)
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub items: Vec<Item>,
    pub canvas: Canvas,
    pub shape: ShapeKind,
    pub value_unit: Option<String>,
    /// Distinct group keys in order of first appearance.
    pub groups: Vec<String>,
}

impl Dataset {
    pub fn group_index(&self, group: &str) -> Option<usize> {
        self.groups.iter().position(|g| g == group)
    }
}
