use crate::assets::AvatarSource;
use crate::config::LayoutConfig;
use crate::family::FamilyGraph;
use crate::layout::{Connectors, FamilyLayout};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Draws connectors first, then avatars in draw order so later members sit on
/// top, matching what the hit tester reports.
pub fn render_svg(
    graph: &FamilyGraph,
    layout: &FamilyLayout,
    connectors: &Connectors,
    theme: &Theme,
    config: &LayoutConfig,
    avatars: &dyn AvatarSource,
    selected: Option<&str>,
) -> String {
    let mut svg = String::new();
    let width = layout.width.max(200.0);
    let height = layout.height.max(200.0);
    let r = config.node_radius;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    for (idx, id) in layout.draw_order.iter().enumerate() {
        if let Some(p) = layout.position(id) {
            svg.push_str(&format!(
                "<clipPath id=\"avatar-{idx}\"><circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{r:.2}\"/></clipPath>",
                p.x, p.y
            ));
        }
    }
    svg.push_str("</defs>");

    svg.push_str("<g class=\"connectors\">");
    for line in &connectors.lines {
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.6\"/>",
            points_to_path(&line.points),
            theme.line_color
        ));
    }
    for marker in &connectors.markers {
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"/>",
            marker.x, marker.y, config.link_marker_radius, theme.marker_color
        ));
    }
    svg.push_str("</g>");

    for (idx, id) in layout.draw_order.iter().enumerate() {
        let (Some(p), Some(member)) = (layout.position(id), graph.member(id)) else {
            continue;
        };
        svg.push_str(&format!("<g class=\"member\" data-id=\"{}\">", escape_xml(id)));
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{r:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
            p.x,
            p.y,
            theme.fill_for(member.gender),
            theme.avatar_border
        ));
        if let Some(href) = avatars.avatar(member.gender) {
            svg.push_str(&format!(
                "<image href=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" clip-path=\"url(#avatar-{idx})\" preserveAspectRatio=\"xMidYMid slice\"/>",
                escape_xml(&href),
                p.x - r,
                p.y - r,
                r * 2.0,
                r * 2.0
            ));
        }
        if selected == Some(id.as_str()) {
            svg.push_str(&format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"3\"/>",
                p.x,
                p.y,
                r + 4.0,
                theme.selection_color
            ));
        }
        let label_y = p.y + r + theme.font_size + 2.0;
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{label_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            p.x,
            theme.font_family,
            theme.font_size,
            theme.text_color,
            escape_xml(&member.name)
        ));
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &crate::config::RenderConfig,
    theme: &Theme,
) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = primary_font(&theme.font_family);
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

/// First family of a CSS font list, unquoted.
#[cfg(feature = "png")]
fn primary_font(list: &str) -> String {
    list.split(',')
        .next()
        .map(|family| family.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string())
        .filter(|family| !family.is_empty())
        .unwrap_or_else(|| "sans-serif".to_string())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AvatarPaths, NoAvatars};
    use crate::family::Gender;
    use crate::layout::{build_connectors, compute_layout};

    fn render(graph: &FamilyGraph, avatars: &dyn AvatarSource, selected: Option<&str>) -> String {
        let config = LayoutConfig::default();
        let layout = compute_layout(graph, &config, None);
        let connectors = build_connectors(graph, &layout, &config);
        render_svg(graph, &layout, &connectors, &Theme::classic(), &config, avatars, selected)
    }

    #[test]
    fn render_svg_basic() {
        let mut graph = FamilyGraph::new();
        let root = graph.add_root("Ada & Co", Gender::Female);
        graph.add_spouse(&root, "Bert", Gender::Male).unwrap();
        graph.add_child(&root, "Cleo", Gender::Female).unwrap();
        let svg = render(&graph, &NoAvatars, None);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Ada &amp; Co"));
        assert!(svg.contains("Cleo"));
        assert!(svg.contains(&Theme::classic().female_fill));
        assert!(!svg.contains("<image"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn selection_and_avatars_are_drawn() {
        let mut graph = FamilyGraph::new();
        let root = graph.add_root("Ada", Gender::Female);
        let avatars = AvatarPaths {
            male: None,
            female: Some("female.png".into()),
        };
        let svg = render(&graph, &avatars, Some(&root));
        assert!(svg.contains("href=\"female.png\""));
        assert!(svg.contains(&Theme::classic().selection_color));
    }

    #[test]
    fn path_from_points() {
        assert_eq!(points_to_path(&[]), "");
        assert_eq!(
            points_to_path(&[(0.0, 1.0), (2.5, 1.0)]),
            "M 0.00 1.00 L 2.50 1.00"
        );
    }
}
