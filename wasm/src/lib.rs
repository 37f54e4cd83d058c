use family_tree_layout::assets::NoAvatars;
use family_tree_layout::config::Config;
use family_tree_layout::layout::Point;
use family_tree_layout::render::render_svg;
use family_tree_layout::theme::Theme;
use family_tree_layout::{FamilyGraph, FamilySession};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilyRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
    /// Member tapped before drawing; a spouse or added parent opens the focus view.
    focus: Option<String>,
    selected: Option<String>,
}

fn parse_options(options_json: Option<String>) -> Result<FamilyRenderOptions, JsValue> {
    match options_json {
        Some(raw_options) => serde_json::from_str::<FamilyRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(FamilyRenderOptions::default()),
    }
}

fn build_config(options: &FamilyRenderOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("modern") {
        config.theme = Theme::modern();
    }
    if let Some(font_family) = options.font_family.clone() {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    if let Some(width) = options.width {
        config.render.width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
    }
    config
}

fn open_session(family_json: &str, options: &FamilyRenderOptions, config: &Config) -> Result<FamilySession, JsValue> {
    let graph = FamilyGraph::from_json(family_json).map_err(|error| JsValue::from_str(&error.to_string()))?;
    let mut session = FamilySession::new(graph, config.layout.clone());
    if let Some(focus) = options.focus.as_deref() {
        session.tap(focus);
    }
    if let Some(selected) = options.selected.as_deref() {
        session.select(selected);
    }
    Ok(session)
}

fn render_family(family_json: &str, options: FamilyRenderOptions) -> Result<String, JsValue> {
    let config = build_config(&options);
    let session = open_session(family_json, &options, &config)?;
    let layout = session.view_layout(Some(config.render.canvas()));
    let connectors = session.connectors(&layout);
    Ok(render_svg(
        session.graph(),
        &layout,
        &connectors,
        &config.theme,
        &config.layout,
        &NoAvatars,
        session.selected(),
    ))
}

#[wasm_bindgen]
pub fn render_family_svg(family_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    render_family(family_json, parse_options(options_json)?)
}

/// Id of the member drawn at `(x, y)` on the same view `render_family_svg` draws.
#[wasm_bindgen]
pub fn hit_test_member(
    family_json: &str,
    x: f32,
    y: f32,
    options_json: Option<String>,
) -> Result<Option<String>, JsValue> {
    let options = parse_options(options_json)?;
    let config = build_config(&options);
    let session = open_session(family_json, &options, &config)?;
    let layout = session.view_layout(Some(config.render.canvas()));
    Ok(session.hit_test(&layout, Point::new(x, y)).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use crate::{FamilyRenderOptions, render_family};

    const FAMILY: &str = r#"{
        "id": "ada", "name": "Ada", "gender": "female",
        "spouses": [{
            "id": "bert", "name": "Bert", "gender": "male", "spouses": [], "children": [],
            "parents": [{ "id": "mum", "name": "Mum", "gender": "female", "spouses": [], "children": [] }]
        }],
        "children": [{ "id": "cleo", "name": "Cleo", "gender": "female", "spouses": [], "children": [] }]
    }"#;

    #[test]
    fn renders_forest_and_focus_view() {
        let forest = render_family(FAMILY, FamilyRenderOptions::default())
            .expect("family should render");
        assert!(forest.contains("<svg"));
        assert!(forest.contains("Cleo"));

        let focus = render_family(
            FAMILY,
            FamilyRenderOptions {
                focus: Some("bert".into()),
                ..FamilyRenderOptions::default()
            },
        )
        .expect("focus view should render");
        assert!(focus.contains("Mum"));
        assert!(!focus.contains("Cleo"));
    }
}
