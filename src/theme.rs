use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CLASSIC_PALETTE: [&str; 10] = [
    "#4E79A7", "#F28E2B", "#E15759", "#76B7B2", "#59A14F", "#EDC948", "#B07AA1", "#FF9DA7",
    "#9C755F", "#BAB0AC",
];

const MODERN_PALETTE: [&str; 10] = [
    "#3B82F6", "#F59E0B", "#10B981", "#EF4444", "#8B5CF6", "#14B8A6", "#EC4899", "#84CC16",
    "#F97316", "#64748B",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub value_font_size: f32,
    pub value_font_weight: u16,
    pub label_font_size: f32,
    pub label_font_weight: u16,
    pub external_font_size: f32,
    pub min_font_size: f32,
    pub line_height: f32,
    pub text_color: String,
    pub light_text_color: String,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub background: String,
    pub chip_background: String,
    pub chip_opacity: f32,
    pub connector_color: String,
    pub error_color: String,
    pub error_background: String,
    pub palette: Vec<String>,
    /// Explicit colours per group key; palette order is used for the rest.
    pub group_colors: BTreeMap<String, String>,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            value_font_size: 14.0,
            value_font_weight: 700,
            label_font_size: 12.0,
            label_font_weight: 400,
            external_font_size: 11.0,
            min_font_size: 8.0,
            line_height: 1.2,
            text_color: "#333333".to_string(),
            light_text_color: "#FFFFFF".to_string(),
            stroke_color: "#FFFFFF".to_string(),
            stroke_width: 1.5,
            background: "#FFFFFF".to_string(),
            chip_background: "#FFFFFF".to_string(),
            chip_opacity: 0.85,
            connector_color: "#888888".to_string(),
            error_color: "#B3261E".to_string(),
            error_background: "#FDECEA".to_string(),
            palette: CLASSIC_PALETTE.iter().map(|c| c.to_string()).collect(),
            group_colors: BTreeMap::new(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            value_font_size: 13.0,
            value_font_weight: 600,
            label_font_size: 11.0,
            text_color: "#1C2430".to_string(),
            connector_color: "#7A8AA6".to_string(),
            chip_background: "#F8FAFF".to_string(),
            palette: MODERN_PALETTE.iter().map(|c| c.to_string()).collect(),
            ..Self::classic()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

/// Fill colour for an item. Explicit group colours win; grouped items
/// otherwise take the palette slot of their group, ungrouped items the slot
/// of their row index.
pub fn resolve_color(
    group: Option<&str>,
    group_index: Option<usize>,
    index: usize,
    theme: &Theme,
) -> String {
    if let Some(color) = group.and_then(|g| theme.group_colors.get(g)) {
        return color.clone();
    }
    if theme.palette.is_empty() {
        return "#4E79A7".to_string();
    }
    let slot = group_index.unwrap_or(index);
    theme.palette[slot % theme.palette.len()].clone()
}

pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        8 => hex[..6].to_string(),
        _ => return None,
    };
    let r = u8::from_str_radix(&expanded[0..2], 16).ok()?;
    let g = u8::from_str_radix(&expanded[2..4], 16).ok()?;
    let b = u8::from_str_radix(&expanded[4..6], 16).ok()?;
    Some((r, g, b))
}

pub fn to_hex(rgb: (u8, u8, u8)) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb.0, rgb.1, rgb.2)
}

/// Blend `color` towards white by `amount` in `[0, 1]`. Unparseable colours
/// are returned unchanged.
pub fn lighten(color: &str, amount: f32) -> String {
    let Some((r, g, b)) = parse_hex_color(color) else {
        return color.to_string();
    };
    let t = amount.clamp(0.0, 1.0);
    let mix = |c: u8| (c as f32 + (255.0 - c as f32) * t).round() as u8;
    to_hex((mix(r), mix(g), mix(b)))
}

pub fn relative_luminance(color: &str) -> Option<f32> {
    let (r, g, b) = parse_hex_color(color)?;
    let channel = |c: u8| {
        let v = c as f32 / 255.0;
        if v <= 0.03928 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    };
    Some(0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b))
}

/// Dark or light text, whichever reads better on `fill`.
pub fn contrast_text_color<'a>(fill: &str, theme: &'a Theme) -> &'a str {
    match relative_luminance(fill) {
        Some(lum) if lum < 0.4 => theme.light_text_color.as_str(),
        _ => theme.text_color.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_group_color_wins() {
        let mut theme = Theme::classic();
        theme
            .group_colors
            .insert("Asia".to_string(), "#123456".to_string());
        assert_eq!(resolve_color(Some("Asia"), Some(3), 0, &theme), "#123456");
        assert_eq!(resolve_color(Some("Europe"), Some(1), 7, &theme), CLASSIC_PALETTE[1]);
        assert_eq!(resolve_color(None, None, 12, &theme), CLASSIC_PALETTE[2]);
    }

    #[test]
    fn resolve_color_is_pure() {
        let theme = Theme::modern();
        let first = resolve_color(Some("x"), Some(4), 9, &theme);
        let second = resolve_color(Some("x"), Some(4), 9, &theme);
        assert_eq!(first, second);
    }

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#4E79A7"), Some((0x4E, 0x79, 0xA7)));
        assert_eq!(parse_hex_color("steelblue"), None);
    }

    #[test]
    fn non_ascii_hex_is_rejected_not_sliced() {
        let theme = Theme::classic();
        assert_eq!(parse_hex_color("#a\u{e9}bcd"), None);
        assert_eq!(parse_hex_color("#\u{e9}\u{e9}\u{e9}"), None);
        assert_eq!(lighten("#a\u{e9}bcd", 0.4), "#a\u{e9}bcd");
        assert_eq!(contrast_text_color("#a\u{e9}bcd", &theme), theme.text_color);
    }

    #[test]
    fn lighten_moves_towards_white() {
        assert_eq!(lighten("#000000", 0.5), "#808080");
        assert_eq!(lighten("#FFFFFF", 0.3), "#FFFFFF");
        assert_eq!(lighten("red", 0.3), "red");
    }

    #[test]
    fn contrast_picks_light_text_on_dark_fill() {
        let theme = Theme::classic();
        assert_eq!(contrast_text_color("#111111", &theme), theme.light_text_color);
        assert_eq!(contrast_text_color("#EDC948", &theme), theme.text_color);
    }
}
