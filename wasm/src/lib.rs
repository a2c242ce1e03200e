use area_pack_renderer::config::{Shading, SolverKind};
use area_pack_renderer::ir::ShapeKind;
use area_pack_renderer::{RenderOptions, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    shape: Option<ShapeKind>,
    solver: Option<SolverKind>,
    shading: Option<Shading>,
    width: Option<f32>,
    height: Option<f32>,
}

fn build_render_options(options: PackRenderOptions) -> RenderOptions {
    let mut render_options = if options.theme.as_deref() == Some("modern") {
        RenderOptions::modern()
    } else {
        RenderOptions::classic()
    };

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(shape) = options.shape {
        render_options.layout.shape = shape;
    }
    if let Some(solver) = options.solver {
        render_options.layout.solver = solver;
    }
    if let Some(shading) = options.shading {
        render_options.layout.shading = shading;
    }
    if let Some(width) = options.width {
        render_options.layout.canvas.width = width;
    }
    if let Some(height) = options.height {
        render_options.layout.canvas.height = height;
    }
    // No system fonts in the browser sandbox.
    render_options.layout.fast_text_metrics = true;

    render_options
}

#[wasm_bindgen]
pub fn render_pack_svg(payload: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<PackRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        PackRenderOptions::default()
    };

    let render_options = build_render_options(options);
    render_with_options(payload, render_options).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use area_pack_renderer::render_with_options;

    use crate::{PackRenderOptions, build_render_options};

    #[test]
    fn renders_grouped_triangles() {
        let payload = r#"{
            "columns": [
                {"role": "x", "name": "Country"},
                {"role": "y", "name": "Population", "unit": "M"},
                {"role": "group", "name": "Region"}
            ],
            "rows": [
                {"Country": "Peru", "Population": 34, "Region": "Americas"},
                {"Country": "Chile", "Population": 19, "Region": "Americas"},
                {"Country": "Chad", "Population": 18, "Region": "Africa"}
            ]
        }"#;
        let options: PackRenderOptions =
            serde_json::from_str(r#"{"shape": "triangle", "solver": "auto"}"#).expect("options");

        let svg = render_with_options(payload, build_render_options(options))
            .expect("triangle payload should render");

        assert!(svg.contains("<svg"));
        assert_eq!(svg.matches("<polygon").count(), 3);
    }
}
