use crate::config::{Config, Shading, SolverKind};
use crate::ir::{Canvas, Dataset, Item, ShapeKind};
use crate::theme::resolve_color;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:[$€£¥]\s*)?(?P<num>[-+]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?(?:[eE][-+]?\d+)?|[-+]?\.\d+)\s*(?:%|[A-Za-z]+)?\s*$",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PayloadError {
    #[error("missing required column role `{0}`")]
    MissingRole(&'static str),
    #[error("no rows left to draw ({total} rows had no positive numeric value)")]
    NoRows { total: usize },
    #[error("malformed payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Display key of a row.
    X,
    /// Value mapped to shape area.
    Y,
    Group,
    Icon,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnRole {
    pub role: Role,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FontToken {
    pub family: Option<String>,
    pub size: Option<f32>,
    pub weight: Option<u16>,
}

/// Style overrides carried by the payload itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleTokens {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub top_margin: Option<f32>,
    pub shape: Option<ShapeKind>,
    pub solver: Option<SolverKind>,
    pub shading: Option<Shading>,
    pub value_font: Option<FontToken>,
    pub label_font: Option<FontToken>,
    pub palette: Option<Vec<String>>,
    pub group_colors: Option<BTreeMap<String, String>>,
    pub background: Option<String>,
}

impl StyleTokens {
    pub fn apply(&self, config: &mut Config) {
        if let Some(width) = self.width.filter(|w| *w > 0.0) {
            config.layout.canvas.width = width;
            config.render.width = width;
        }
        if let Some(height) = self.height.filter(|h| *h > 0.0) {
            config.layout.canvas.height = height;
            config.render.height = height;
        }
        if let Some(top) = self.top_margin {
            config.layout.canvas.top_margin = top.max(0.0);
        }
        if let Some(shape) = self.shape {
            config.layout.shape = shape;
        }
        if let Some(solver) = self.solver {
            config.layout.solver = solver;
        }
        if let Some(shading) = self.shading {
            config.layout.shading = shading;
        }
        let theme = &mut config.theme;
        if let Some(font) = &self.value_font {
            if let Some(family) = &font.family {
                theme.font_family = family.clone();
            }
            if let Some(size) = font.size {
                theme.value_font_size = size;
            }
            if let Some(weight) = font.weight {
                theme.value_font_weight = weight;
            }
        }
        if let Some(font) = &self.label_font {
            if let Some(family) = &font.family {
                theme.font_family = family.clone();
            }
            if let Some(size) = font.size {
                theme.label_font_size = size;
                theme.external_font_size = theme.external_font_size.min(size);
            }
            if let Some(weight) = font.weight {
                theme.label_font_weight = weight;
            }
        }
        if let Some(palette) = self.palette.as_ref().filter(|p| !p.is_empty()) {
            theme.palette = palette.clone();
        }
        if let Some(colors) = &self.group_colors {
            theme
                .group_colors
                .extend(colors.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(background) = &self.background {
            theme.background = background.clone();
            config.render.background = background.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Payload {
    pub columns: Vec<ColumnRole>,
    pub rows: Vec<serde_json::Map<String, Value>>,
    pub style: StyleTokens,
    /// Icon URLs keyed by item id; an icon column takes precedence.
    pub icons: BTreeMap<String, String>,
}

impl Payload {
    pub fn column(&self, role: Role) -> Option<&ColumnRole> {
        self.columns.iter().find(|c| c.role == role)
    }
}

/// Strict JSON first, then JSON5 for hand-written payloads.
pub fn parse_payload(input: &str) -> Result<Payload, PayloadError> {
    match serde_json::from_str::<Payload>(input) {
        Ok(payload) => Ok(payload),
        Err(strict) => json5::from_str::<Payload>(input).map_err(|lenient| {
            tracing::debug!(error = %lenient, "JSON5 fallback failed");
            PayloadError::Malformed(strict.to_string())
        }),
    }
}

/// Numeric reading of a cell: JSON numbers, or strings such as `"$1,234.5"`,
/// `"45%"` and `"1e3"`.
pub fn parse_number(cell: &Value) -> Option<f32> {
    match cell {
        Value::Number(n) => n.as_f64().and_then(narrow),
        Value::String(s) => {
            let caps = NUMBER_RE.captures(s)?;
            let digits = caps.name("num")?.as_str().replace(',', "");
            digits.parse::<f64>().ok().and_then(narrow)
        }
        _ => None,
    }
}

// Finite values beyond the f32 range saturate instead of becoming infinite.
fn narrow(value: f64) -> Option<f32> {
    value
        .is_finite()
        .then(|| value.clamp(f32::MIN as f64, f32::MAX as f64) as f32)
}

fn cell_text(cell: Option<&Value>) -> Option<String> {
    match cell? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Turn payload rows into drawable items. Rows without a positive, finite
/// value are dropped; an empty result is a configuration error.
pub fn build_dataset(payload: &Payload, config: &Config) -> Result<Dataset, PayloadError> {
    let value_col = payload.column(Role::Y).ok_or(PayloadError::MissingRole("y"))?;
    let key_col = payload.column(Role::X);
    let group_col = payload.column(Role::Group);
    let icon_col = payload.column(Role::Icon);

    let mut items: Vec<Item> = Vec::new();
    let mut groups: Vec<String> = Vec::new();
    for (row_idx, row) in payload.rows.iter().enumerate() {
        let Some(value) = row.get(&value_col.name).and_then(parse_number) else {
            continue;
        };
        if !value.is_finite() || value <= 0.0 {
            continue;
        }
        let id = key_col
            .and_then(|col| cell_text(row.get(&col.name)))
            .unwrap_or_else(|| format!("Item {}", row_idx + 1));
        let mut item = Item::new(id, value);
        item.group = group_col.and_then(|col| cell_text(row.get(&col.name)));
        if let Some(group) = &item.group
            && !groups.contains(group)
        {
            groups.push(group.clone());
        }
        item.icon = icon_col
            .and_then(|col| cell_text(row.get(&col.name)))
            .or_else(|| payload.icons.get(&item.id).cloned());
        items.push(item);
    }

    let total = payload.rows.len();
    if items.is_empty() {
        return Err(PayloadError::NoRows { total });
    }
    if items.len() < total {
        tracing::debug!(
            kept = items.len(),
            dropped = total - items.len(),
            "filtered rows without a positive value"
        );
    }

    let canvas_cfg = &config.layout.canvas;
    let mut dataset = Dataset {
        items,
        canvas: Canvas::new(canvas_cfg.width, canvas_cfg.height, canvas_cfg.top_margin),
        shape: config.layout.shape,
        value_unit: value_col.unit.clone().filter(|u| !u.trim().is_empty()),
        groups,
    };
    for idx in 0..dataset.items.len() {
        let group_index = dataset.items[idx]
            .group
            .as_deref()
            .and_then(|g| dataset.group_index(g));
        let color = resolve_color(
            dataset.items[idx].group.as_deref(),
            group_index,
            idx,
            &config.theme,
        );
        dataset.items[idx].color = color;
    }
    Ok(dataset)
}
