use crate::ir::ShapeKind;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Force relaxation with a fixed iteration budget.
    #[default]
    Relax,
    /// Backtracking search over tangent positions.
    Tangent,
    /// Tangent search for small inputs, relaxation otherwise.
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TangentAnchor {
    #[default]
    Center,
    TopLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Shading {
    #[default]
    Flat,
    /// Radial highlight that gives shapes a lit, three-dimensional look.
    Gradient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
    /// Strip reserved at the top for a title or legend.
    pub top_margin: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
            top_margin: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizingConfig {
    pub min_size: f32,
    pub max_size: f32,
    /// `max_size` is additionally capped at `canvas.height / max_height_ratio`.
    pub max_height_ratio: f32,
    pub fill_ratio: f32,
    /// Values whose range is below this fraction of the maximum get boosted.
    pub spread_threshold: f32,
    pub spread_factor: f32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            min_size: 20.0,
            max_size: 200.0,
            max_height_ratio: 2.5,
            fill_ratio: 0.5,
            spread_threshold: 0.3,
            spread_factor: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelaxConfig {
    pub iterations: usize,
    pub center_strength: f32,
    pub group_strength: f32,
    /// Group anchors sit on a circle of this fraction of the shorter canvas side.
    pub group_radius_ratio: f32,
    pub collide_strength: f32,
    pub collide_padding: f32,
    pub velocity_decay: f32,
    pub pin_largest: bool,
    pub cluster_groups: bool,
}

impl Default for RelaxConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            center_strength: 0.02,
            group_strength: 0.08,
            group_radius_ratio: 0.28,
            collide_strength: 0.8,
            collide_padding: 2.0,
            velocity_decay: 0.4,
            pin_largest: true,
            cluster_groups: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TangentConfig {
    /// `SolverKind::Auto` switches to relaxation above this many items.
    pub max_items: usize,
    pub angle_steps: usize,
    /// Largest accepted overlap as a fraction of the smaller shape's area.
    pub overlap_threshold: f32,
    pub anchor: TangentAnchor,
    pub max_drops: usize,
    /// Candidate evaluations allowed per attempt before giving up.
    pub step_budget: usize,
}

impl Default for TangentConfig {
    fn default() -> Self {
        Self {
            max_items: 20,
            angle_steps: 24,
            overlap_threshold: 0.12,
            anchor: TangentAnchor::Center,
            max_drops: 3,
            step_budget: 20_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeThresholds {
    pub circle: f32,
    pub square: f32,
    pub triangle: f32,
}

impl ShapeThresholds {
    pub fn for_shape(&self, shape: ShapeKind) -> f32 {
        match shape {
            ShapeKind::Circle => self.circle,
            ShapeKind::Square => self.square,
            ShapeKind::Triangle => self.triangle,
        }
    }
}

impl Default for ShapeThresholds {
    fn default() -> Self {
        Self {
            circle: 30.0,
            square: 30.0,
            triangle: 70.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelConfig {
    /// Below these sizes labels go outside the shape.
    pub small: ShapeThresholds,
    /// Icons are drawn only at or above these sizes.
    pub icon: ShapeThresholds,
    pub icon_fraction: f32,
    pub inner_padding: f32,
    pub line_gap: f32,
    pub max_category_lines: usize,
    pub external_max_width: f32,
    pub external_max_lines: usize,
    pub external_gap: f32,
    pub connectors: bool,
    pub chip_padding: f32,
    pub compact_numbers: bool,
    pub show_category: bool,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            small: ShapeThresholds::default(),
            icon: ShapeThresholds {
                circle: 60.0,
                square: 60.0,
                triangle: 110.0,
            },
            icon_fraction: 0.3,
            inner_padding: 0.85,
            line_gap: 2.0,
            max_category_lines: 3,
            external_max_width: 160.0,
            external_max_lines: 2,
            external_gap: 6.0,
            connectors: true,
            chip_padding: 3.0,
            compact_numbers: true,
            show_category: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorConfig {
    pub width: f32,
    pub height: f32,
    pub text_size: f32,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 120.0,
            text_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub shape: ShapeKind,
    pub canvas: CanvasConfig,
    pub solver: SolverKind,
    pub shading: Shading,
    /// Skip font lookup and use the character-count heuristic.
    pub fast_text_metrics: bool,
    pub sizing: SizingConfig,
    pub relax: RelaxConfig,
    pub tangent: TangentConfig,
    pub labels: LabelConfig,
    pub error: ErrorConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Circle,
            canvas: CanvasConfig::default(),
            solver: SolverKind::Relax,
            shading: Shading::Flat,
            fast_text_metrics: false,
            sizing: SizingConfig::default(),
            relax: RelaxConfig::default(),
            tangent: TangentConfig::default(),
            labels: LabelConfig::default(),
            error: ErrorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    value_font_size: Option<f32>,
    value_font_weight: Option<u16>,
    label_font_size: Option<f32>,
    label_font_weight: Option<u16>,
    external_font_size: Option<f32>,
    min_font_size: Option<f32>,
    text_color: Option<String>,
    light_text_color: Option<String>,
    stroke_color: Option<String>,
    background: Option<String>,
    palette: Option<Vec<String>>,
    group_colors: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfig>,
    render: Option<RenderConfig>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => tracing::warn!(theme = other, "unknown theme name; keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        apply_theme_variables(&mut config.theme, vars);
    }
    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }
    if let Some(render) = parsed.render {
        config.render = render;
    } else {
        config.render.background = config.theme.background.clone();
    }

    Ok(config)
}

fn apply_theme_variables(theme: &mut Theme, vars: ThemeVariables) {
    if let Some(v) = vars.font_family {
        theme.font_family = v;
    }
    if let Some(v) = vars.value_font_size {
        theme.value_font_size = v;
    }
    if let Some(v) = vars.value_font_weight {
        theme.value_font_weight = v;
    }
    if let Some(v) = vars.label_font_size {
        theme.label_font_size = v;
    }
    if let Some(v) = vars.label_font_weight {
        theme.label_font_weight = v;
    }
    if let Some(v) = vars.external_font_size {
        theme.external_font_size = v;
    }
    if let Some(v) = vars.min_font_size {
        theme.min_font_size = v;
    }
    if let Some(v) = vars.text_color {
        theme.text_color = v;
    }
    if let Some(v) = vars.light_text_color {
        theme.light_text_color = v;
    }
    if let Some(v) = vars.stroke_color {
        theme.stroke_color = v;
    }
    if let Some(v) = vars.background {
        theme.background = v;
    }
    if let Some(v) = vars.palette
        && !v.is_empty()
    {
        theme.palette = v;
    }
    if let Some(v) = vars.group_colors {
        theme.group_colors.extend(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config.layout.solver, SolverKind::Relax);
        assert_eq!(config.layout.sizing.fill_ratio, 0.5);
        assert_eq!(config.render.background, config.theme.background);
    }

    #[test]
    fn partial_sections_merge_onto_defaults() {
        let dir = std::env::temp_dir().join(format!("apack-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("config.json");
        let mut file = std::fs::File::create(&path).expect("create");
        write!(
            file,
            r##"{{
                "theme": "modern",
                "themeVariables": {{"valueFontSize": 18, "groupColors": {{"Asia": "#FF0000"}}}},
                "layout": {{"shape": "triangle", "solver": "auto", "sizing": {{"fillRatio": 0.4}}}}
            }}"##
        )
        .expect("write");

        let config = load_config(Some(&path)).expect("config");
        assert_eq!(config.layout.shape, ShapeKind::Triangle);
        assert_eq!(config.layout.solver, SolverKind::Auto);
        assert_eq!(config.layout.sizing.fill_ratio, 0.4);
        assert_eq!(config.layout.sizing.min_size, 20.0);
        assert_eq!(config.theme.value_font_size, 18.0);
        assert_eq!(config.theme.group_colors.get("Asia").map(String::as_str), Some("#FF0000"));
        assert_eq!(config.theme.font_family, Theme::modern().font_family);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn thresholds_follow_shape() {
        let labels = LabelConfig::default();
        assert_eq!(labels.small.for_shape(ShapeKind::Triangle), 70.0);
        assert_eq!(labels.small.for_shape(ShapeKind::Circle), 30.0);
    }
}
