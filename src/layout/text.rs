use crate::config::LayoutConfig;
use crate::text_metrics;

use super::TextBlock;

pub const ELLIPSIS: char = '\u{2026}';

/// Average advance of a glyph relative to the font size, used whenever real
/// metrics are unavailable.
pub(crate) const HEURISTIC_CHAR_WIDTH: f32 = 0.6;

/// Synchronous width query against whatever font backend the host has.
/// `None` (or a zero width for non-empty text) means the backend could not
/// answer and the caller falls back to the heuristic estimate.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_family: &str, font_size: f32, font_weight: u16)
    -> Option<f32>;
}

/// System fonts resolved through `fontdb`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontMetrics;

impl TextMeasure for FontMetrics {
    fn measure(
        &self,
        text: &str,
        font_family: &str,
        font_size: f32,
        font_weight: u16,
    ) -> Option<f32> {
        text_metrics::measure_text_width(text, font_size, font_family, font_weight)
    }
}

/// `chars x font_size x char_width`. Deterministic and font-independent.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicMetrics {
    pub char_width: f32,
}

impl Default for HeuristicMetrics {
    fn default() -> Self {
        Self {
            char_width: HEURISTIC_CHAR_WIDTH,
        }
    }
}

impl TextMeasure for HeuristicMetrics {
    fn measure(&self, text: &str, _font_family: &str, font_size: f32, font_weight: u16) -> Option<f32> {
        let bold = if font_weight >= 600 { 1.05 } else { 1.0 };
        Some(text.chars().count() as f32 * font_size * self.char_width * bold)
    }
}

pub fn text_measurer(config: &LayoutConfig) -> Box<dyn TextMeasure> {
    if config.fast_text_metrics {
        Box::new(HeuristicMetrics::default())
    } else {
        Box::new(FontMetrics)
    }
}

pub(crate) fn text_width(
    measure: &dyn TextMeasure,
    text: &str,
    font_family: &str,
    font_size: f32,
    font_weight: u16,
) -> f32 {
    if text.is_empty() || font_size <= 0.0 {
        return 0.0;
    }
    match measure.measure(text, font_family, font_size, font_weight) {
        Some(width) if width > 0.0 && width.is_finite() => width,
        _ => fallback_text_width(text, font_size),
    }
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * HEURISTIC_CHAR_WIDTH
}

#[derive(Debug, Clone, Copy)]
pub struct FitRequest<'a> {
    pub text: &'a str,
    pub max_width: f32,
    pub font_family: &'a str,
    pub font_weight: u16,
    pub base_size: f32,
    pub min_size: f32,
    /// 1 disables wrapping.
    pub max_lines: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub lines: Vec<String>,
    pub font_size: f32,
    pub truncated: bool,
    /// Widest line at `font_size`.
    pub width: f32,
}

impl FitResult {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_block(&self, line_height: f32) -> TextBlock {
        TextBlock {
            lines: self.lines.clone(),
            width: self.width,
            height: self.lines.len() as f32 * self.font_size * line_height,
            font_size: self.font_size,
            truncated: self.truncated,
        }
    }
}

/// Shrink, then wrap, then truncate until `text` fits `max_width`.
///
/// Font sizes are tried from `base_size` down to `min_size` in unit steps; at
/// each size a single line is preferred, then greedy word wrapping when the
/// caller allows more than one line. Unbroken tokens get character wrapping
/// at the minimum size. Anything left is truncated with an ellipsis.
pub fn fit_text(measure: &dyn TextMeasure, req: &FitRequest<'_>) -> FitResult {
    let text = collapse_whitespace(req.text);
    let min_size = req.min_size.max(1.0);
    let base_size = req.base_size.max(min_size);
    if text.is_empty() {
        return FitResult {
            lines: Vec::new(),
            font_size: base_size,
            truncated: false,
            width: 0.0,
        };
    }
    if req.max_width <= 0.0 || !req.max_width.is_finite() {
        return ellipsis_only(measure, req, min_size);
    }

    let width_at = |s: &str, size: f32| text_width(measure, s, req.font_family, size, req.font_weight);
    let max_lines = req.max_lines.max(1);
    let has_whitespace = text.contains(' ');

    let mut size = base_size;
    loop {
        let width = width_at(&text, size);
        if width <= req.max_width {
            return FitResult {
                lines: vec![text],
                font_size: size,
                truncated: false,
                width,
            };
        }
        if max_lines > 1 && has_whitespace {
            let words: Vec<&str> = text.split(' ').collect();
            if let Some(result) = wrap_units(&words, " ", size, max_lines, req.max_width, &width_at) {
                return result;
            }
        }
        if size <= min_size {
            break;
        }
        size = (size - 1.0).max(min_size);
    }

    if max_lines > 1 && !has_whitespace {
        let chars: Vec<String> = text.chars().map(String::from).collect();
        let units: Vec<&str> = chars.iter().map(String::as_str).collect();
        if let Some(result) = wrap_units(&units, "", min_size, max_lines, req.max_width, &width_at) {
            return result;
        }
    }

    truncate(&text, min_size, req.max_width, &width_at)
}

// Greedy accumulate/overflow wrapping shared by word and character modes.
fn wrap_units(
    units: &[&str],
    joiner: &str,
    size: f32,
    max_lines: usize,
    max_width: f32,
    width_at: &dyn Fn(&str, f32) -> f32,
) -> Option<FitResult> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for unit in units {
        if current.is_empty() {
            current.push_str(unit);
            continue;
        }
        let candidate = format!("{current}{joiner}{unit}");
        if width_at(&candidate, size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(unit);
            if lines.len() >= max_lines {
                return None;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.len() > max_lines {
        return None;
    }
    let mut widest = 0.0f32;
    for line in &lines {
        let width = width_at(line, size);
        if width > max_width {
            return None;
        }
        widest = widest.max(width);
    }
    Some(FitResult {
        lines,
        font_size: size,
        truncated: false,
        width: widest,
    })
}

fn truncate(
    text: &str,
    size: f32,
    max_width: f32,
    width_at: &dyn Fn(&str, f32) -> f32,
) -> FitResult {
    let chars: Vec<char> = text.chars().collect();
    for keep in (1..chars.len()).rev() {
        let head: String = chars[..keep].iter().collect();
        let candidate = format!("{}{ELLIPSIS}", head.trim_end());
        let width = width_at(&candidate, size);
        if width <= max_width {
            return FitResult {
                lines: vec![candidate],
                font_size: size,
                truncated: true,
                width,
            };
        }
    }
    let only = ELLIPSIS.to_string();
    let width = width_at(&only, size);
    FitResult {
        lines: vec![only],
        font_size: size,
        truncated: true,
        width,
    }
}

fn ellipsis_only(measure: &dyn TextMeasure, req: &FitRequest<'_>, size: f32) -> FitResult {
    let only = ELLIPSIS.to_string();
    let width = text_width(measure, &only, req.font_family, size, req.font_weight);
    FitResult {
        lines: vec![only],
        font_size: size,
        truncated: true,
        width,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unavailable;

    impl TextMeasure for Unavailable {
        fn measure(&self, _: &str, _: &str, _: f32, _: u16) -> Option<f32> {
            None
        }
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

    #[test]
    fn short_text_keeps_base_size() {
        let result = fit_text(&HeuristicMetrics::default(), &request("Peru", 400.0, 1));
        assert_eq!(result.lines, vec!["Peru"]);
        assert_eq!(result.font_size, 12.0);
        assert!(!result.truncated);
    }

    #[test]
    fn shrinks_before_wrapping() {
        // 10 chars: 72px at 12px, 60px at 10px.
        let result = fit_text(&HeuristicMetrics::default(), &request("Madagascar", 61.0, 3));
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.font_size, 10.0);
    }

    #[test]
    fn switzerland_truncates_at_minimum_size() {
        let measure = HeuristicMetrics::default();
        let result = fit_text(&measure, &request("Switzerland", 40.0, 1));
        assert!(result.truncated);
        assert_eq!(result.font_size, 8.0);
        assert_eq!(result.lines.len(), 1);
        assert!(result.lines[0].ends_with(ELLIPSIS));
        let width = text_width(&measure, &result.lines[0], "sans-serif", 8.0, 400);
        assert!(width <= 40.0, "width {width}");
    }

    #[test]
    fn wraps_words_when_allowed() {
        let result = fit_text(
            &HeuristicMetrics::default(),
            &request("United Arab Emirates", 60.0, 3),
        );
        assert!(!result.truncated);
        assert!(result.lines.len() > 1, "{:?}", result.lines);
        assert!(result.width <= 60.0);
    }

    #[test]
    fn wraps_characters_for_single_token() {
        let result = fit_text(
            &HeuristicMetrics::default(),
            &request("Liechtenstein", 30.0, 3),
        );
        assert!(!result.truncated, "{:?}", result);
        assert_eq!(result.font_size, 8.0);
        assert_eq!(result.lines.concat(), "Liechtenstein");
    }

    #[test]
    fn too_many_lines_falls_back_to_truncation() {
        let result = fit_text(
            &HeuristicMetrics::default(),
            &request("a very long category name indeed", 20.0, 2),
        );
        assert!(result.truncated);
        assert_eq!(result.lines.len(), 1);
    }

    #[test]
    fn empty_text_yields_no_lines() {
        let result = fit_text(&HeuristicMetrics::default(), &request("   ", 100.0, 3));
        assert!(result.is_empty());
        assert_eq!(result.width, 0.0);
    }

    #[test]
    fn non_positive_width_is_ellipsis() {
        let result = fit_text(&HeuristicMetrics::default(), &request("Chad", 0.0, 3));
        assert!(result.truncated);
        assert_eq!(result.lines, vec![ELLIPSIS.to_string()]);
    }

    #[test]
    fn unavailable_backend_uses_heuristic() {
        let fallback = fit_text(&Unavailable, &request("Switzerland", 40.0, 1));
        let heuristic = fit_text(&HeuristicMetrics::default(), &request("Switzerland", 40.0, 1));
        assert_eq!(fallback, heuristic);
    }

    #[test]
    fn repeated_calls_agree() {
        let req = request("Bosnia and Herzegovina", 55.0, 3);
        let measure = HeuristicMetrics::default();
        assert_eq!(fit_text(&measure, &req), fit_text(&measure, &req));
    }
}
