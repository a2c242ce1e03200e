#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod scene;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use layout::{Layout, compute_error_layout, compute_layout, compute_layout_with};
pub use parser::{Payload, PayloadError, build_dataset, parse_payload};
pub use render::{draw_layout, render, render_svg, write_output_png, write_output_svg};
pub use scene::{NodeId, Scene};
pub use theme::Theme;

/// Theme and layout settings for one-shot rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

impl RenderOptions {
    pub fn classic() -> Self {
        Self {
            theme: Theme::classic(),
            layout: LayoutConfig::default(),
        }
    }

    pub fn modern() -> Self {
        Self {
            theme: Theme::modern(),
            layout: LayoutConfig::default(),
        }
    }
}

/// Parse a payload and render it to an SVG string. A payload that parses but
/// cannot be drawn yields the error placeholder SVG; only unparseable input
/// is an `Err`.
pub fn render_with_options(input: &str, options: RenderOptions) -> anyhow::Result<String> {
    let payload = parse_payload(input)?;
    let mut config = Config {
        theme: options.theme,
        layout: options.layout,
        ..Config::default()
    };
    payload.style.apply(&mut config);
    config.render.background = config.theme.background.clone();
    let layout = match build_dataset(&payload, &config) {
        Ok(dataset) => compute_layout(&dataset, &config.theme, &config.layout),
        Err(err) => compute_error_layout(&err, &config.layout),
    };
    Ok(render_svg(&layout, &config.theme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_payload_end_to_end() {
        let mut options = RenderOptions::modern();
        options.layout.fast_text_metrics = true;
        let svg = render_with_options(
            r#"{"columns": [{"role": "x", "name": "k"}, {"role": "y", "name": "v"}],
                "rows": [{"k": "Alpha", "v": 3}, {"k": "Beta", "v": 1}]}"#,
            options,
        )
        .expect("svg");
        assert!(svg.contains("<circle"));
        assert!(svg.contains("Alpha"));
    }

    #[test]
    fn unusable_payload_renders_placeholder() {
        let svg = render_with_options(r#"{"rows": []}"#, RenderOptions::classic()).expect("svg");
        assert!(svg.contains("pack-error"));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(render_with_options("not json", RenderOptions::classic()).is_err());
    }
}
