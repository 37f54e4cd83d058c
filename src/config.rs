use crate::assets::AvatarPaths;
use crate::layout::Canvas;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    /// Height of a lone parent above the focused spouse.
    pub single_parent_offset_y: f32,
    pub two_parent_offset_y: f32,
    /// Horizontal distance between two parents, split evenly around the spouse.
    pub two_parent_spacing_x: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            single_parent_offset_y: 140.0,
            two_parent_offset_y: 140.0,
            two_parent_spacing_x: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_radius: f32,
    /// Width of a leaf subtree and the distance between spouses.
    pub base_spacing: f32,
    /// Distance between generations.
    pub vertical_spacing: f32,
    pub branch_gap: f32,
    pub safe_margin: f32,
    /// Extra space between stacked trees of a forest.
    pub tree_margin: f32,
    pub spouse_stagger: f32,
    pub link_marker_offset: f32,
    pub link_marker_radius: f32,
    pub zoom: ZoomConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_radius: 28.0,
            base_spacing: 100.0,
            vertical_spacing: 140.0,
            branch_gap: 24.0,
            safe_margin: 48.0,
            tree_margin: 96.0,
            spouse_stagger: 6.0,
            link_marker_offset: 10.0,
            link_marker_radius: 5.0,
            zoom: ZoomConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

impl RenderConfig {
    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    pub avatars: AvatarPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::classic(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
            avatars: AvatarPaths::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    male_color: Option<String>,
    female_color: Option<String>,
    avatar_border_color: Option<String>,
    line_color: Option<String>,
    marker_color: Option<String>,
    selection_color: Option<String>,
    text_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoomConfigFile {
    single_parent_offset_y: Option<f32>,
    two_parent_offset_y: Option<f32>,
    two_parent_spacing_x: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_radius: Option<f32>,
    base_spacing: Option<f32>,
    vertical_spacing: Option<f32>,
    branch_gap: Option<f32>,
    safe_margin: Option<f32>,
    tree_margin: Option<f32>,
    spouse_stagger: Option<f32>,
    link_marker_offset: Option<f32>,
    link_marker_radius: Option<f32>,
    zoom: Option<ZoomConfigFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    /// Same colour as `themeVariables.background`; applied after it.
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvatarConfigFile {
    male: Option<String>,
    female: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
    avatars: Option<AvatarConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Applies a JSON5 document of optional overrides onto the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => tracing::warn!(theme = other, "unknown theme name, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.male_color {
            config.theme.male_fill = v;
        }
        if let Some(v) = vars.female_color {
            config.theme.female_fill = v;
        }
        if let Some(v) = vars.avatar_border_color {
            config.theme.avatar_border = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.marker_color {
            config.theme.marker_color = v;
        }
        if let Some(v) = vars.selection_color {
            config.theme.selection_color = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_radius {
            config.layout.node_radius = v;
        }
        if let Some(v) = layout.base_spacing {
            config.layout.base_spacing = v;
        }
        if let Some(v) = layout.vertical_spacing {
            config.layout.vertical_spacing = v;
        }
        if let Some(v) = layout.branch_gap {
            config.layout.branch_gap = v;
        }
        if let Some(v) = layout.safe_margin {
            config.layout.safe_margin = v;
        }
        if let Some(v) = layout.tree_margin {
            config.layout.tree_margin = v;
        }
        if let Some(v) = layout.spouse_stagger {
            config.layout.spouse_stagger = v;
        }
        if let Some(v) = layout.link_marker_offset {
            config.layout.link_marker_offset = v;
        }
        if let Some(v) = layout.link_marker_radius {
            config.layout.link_marker_radius = v;
        }
        if let Some(zoom) = layout.zoom {
            if let Some(v) = zoom.single_parent_offset_y {
                config.layout.zoom.single_parent_offset_y = v;
            }
            if let Some(v) = zoom.two_parent_offset_y {
                config.layout.zoom.two_parent_offset_y = v;
            }
            if let Some(v) = zoom.two_parent_spacing_x {
                config.layout.zoom.two_parent_spacing_x = v;
            }
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.theme.background = v;
        }
    }

    if let Some(avatars) = parsed.avatars {
        if avatars.male.is_some() {
            config.avatars.male = avatars.male;
        }
        if avatars.female.is_some() {
            config.avatars.female = avatars.female;
        }
    }

    Ok(config)
}
