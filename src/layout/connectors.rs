//! Connector geometry derived from a finished layout. Nothing here is cached:
//! the renderer rebuilds the polylines every draw.

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::family::FamilyGraph;

use super::{ChildRow, FamilyLayout, Point};

const EPSILON: f32 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectorKind {
    SpouseLink { member: String, spouse: String },
    Trunk { parent: String },
    Bus { parent: String },
    ChildStub { parent: String, child: String },
}

/// An axis-aligned polyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub kind: ConnectorKind,
    pub points: Vec<(f32, f32)>,
}

impl Connector {
    pub fn is_axis_aligned(&self) -> bool {
        self.points.windows(2).all(|pair| {
            let (a, b) = (pair[0], pair[1]);
            (a.0 - b.0).abs() < EPSILON || (a.1 - b.1).abs() < EPSILON
        })
    }
}

/// Small dot marking which spouse link belongs to which pairing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkMarker {
    pub x: f32,
    pub y: f32,
    pub member: String,
    pub spouse: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Connectors {
    pub lines: Vec<Connector>,
    pub markers: Vec<LinkMarker>,
}

pub fn build_connectors(
    graph: &FamilyGraph,
    layout: &FamilyLayout,
    config: &LayoutConfig,
) -> Connectors {
    let mut connectors = Connectors::default();
    for id in &layout.draw_order {
        spouse_links(graph, layout, config, id, &mut connectors);
    }
    for (owner, row) in &layout.ranges {
        descent(layout, config, owner, row, &mut connectors.lines);
    }
    connectors
}

fn spouse_links(
    graph: &FamilyGraph,
    layout: &FamilyLayout,
    config: &LayoutConfig,
    id: &str,
    out: &mut Connectors,
) {
    let Some(member) = graph.member(id) else {
        return;
    };
    let Some(from) = layout.position(id) else {
        return;
    };
    let r = config.node_radius;
    let staggered = member.spouses.len() > 1;
    for (index, spouse_id) in member.spouses.iter().enumerate() {
        let Some(to) = layout.position(spouse_id) else {
            continue;
        };
        let dir = if to.x < from.x { -1.0 } else { 1.0 };
        let y = if staggered {
            from.y + index as f32 * config.spouse_stagger
        } else {
            from.y
        };
        let start_x = from.x + dir * r;
        let end_x = to.x - dir * r;
        let mut points = vec![(start_x, y), (end_x, y)];
        if (to.y - from.y).abs() > EPSILON {
            // partner drawn on another row; drop into its avatar
            let target_y = if to.y > y { to.y - r } else { to.y + r };
            points.push((end_x, target_y));
        }
        out.lines.push(Connector {
            kind: ConnectorKind::SpouseLink {
                member: id.to_string(),
                spouse: spouse_id.clone(),
            },
            points,
        });

        let marker_x = if index == 0 {
            (start_x + end_x) / 2.0
        } else {
            end_x - dir * config.link_marker_offset
        };
        out.markers.push(LinkMarker {
            x: marker_x,
            y,
            member: id.to_string(),
            spouse: spouse_id.clone(),
        });
    }
}

fn descent(
    layout: &FamilyLayout,
    config: &LayoutConfig,
    owner: &str,
    row: &ChildRow,
    out: &mut Vec<Connector>,
) {
    let r = config.node_radius;
    let anchor = row.anchor;
    // An anchor on the owner's own centre starts below the avatar; a couple
    // midpoint starts on the spouse link.
    let on_avatar = layout.position(owner).is_some_and(|p| same_point(p, anchor));
    let start_y = if on_avatar { anchor.y + r } else { anchor.y };
    let bus_y = (anchor.y + row.y) / 2.0;
    let drop_x = anchor.x.clamp(row.left, row.right);

    let mut trunk = vec![(anchor.x, start_y)];
    if (drop_x - anchor.x).abs() > EPSILON {
        let elbow_y = (start_y + bus_y) / 2.0;
        trunk.push((anchor.x, elbow_y));
        trunk.push((drop_x, elbow_y));
    }
    trunk.push((drop_x, bus_y));
    out.push(Connector {
        kind: ConnectorKind::Trunk {
            parent: owner.to_string(),
        },
        points: trunk,
    });

    if row.right - row.left > EPSILON {
        out.push(Connector {
            kind: ConnectorKind::Bus {
                parent: owner.to_string(),
            },
            points: vec![(row.left, bus_y), (row.right, bus_y)],
        });
    }

    for child in &row.children {
        let Some(at) = layout.position(child) else {
            continue;
        };
        out.push(Connector {
            kind: ConnectorKind::ChildStub {
                parent: owner.to_string(),
                child: child.clone(),
            },
            points: vec![(at.x, bus_y), (at.x, at.y - r)],
        });
    }
}

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::Gender;
    use crate::layout::compute_layout;

    fn config() -> LayoutConfig {
        LayoutConfig {
            node_radius: 20.0,
            base_spacing: 100.0,
            vertical_spacing: 140.0,
            branch_gap: 20.0,
            safe_margin: 40.0,
            spouse_stagger: 6.0,
            link_marker_offset: 10.0,
            ..LayoutConfig::default()
        }
    }

    fn lines_of<'c>(connectors: &'c Connectors, pick: fn(&ConnectorKind) -> bool) -> Vec<&'c Connector> {
        connectors.lines.iter().filter(|line| pick(&line.kind)).collect()
    }

    #[test]
    fn every_segment_is_axis_aligned() {
        let mut graph = FamilyGraph::new();
        let root = graph.add_root("R", Gender::Male);
        graph.add_spouse(&root, "S1", Gender::Female).unwrap();
        let second = graph.add_spouse(&root, "S2", Gender::Female).unwrap();
        let a = graph.add_child(&root, "A", Gender::Male).unwrap();
        graph.add_spouse(&a, "A'", Gender::Female).unwrap();
        graph.add_child(&a, "AA", Gender::Female).unwrap();
        graph.add_child(&second, "B", Gender::Male).unwrap();

        let config = config();
        let layout = compute_layout(&graph, &config, None);
        let connectors = build_connectors(&graph, &layout, &config);
        assert!(!connectors.lines.is_empty());
        for line in &connectors.lines {
            assert!(line.is_axis_aligned(), "{line:?}");
        }
    }

    #[test]
    fn spouse_link_runs_between_avatar_edges() {
        let mut graph = FamilyGraph::new();
        let root = graph.add_root("R", Gender::Male);
        let spouse = graph.add_spouse(&root, "S", Gender::Female).unwrap();
        let config = config();
        let layout = compute_layout(&graph, &config, None);
        let connectors = build_connectors(&graph, &layout, &config);

        let r = layout.position(&root).unwrap();
        let links = lines_of(&connectors, |k| matches!(k, ConnectorKind::SpouseLink { .. }));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].points, vec![(r.x + 20.0, r.y), (r.x + 80.0, r.y)]);
        assert_eq!(connectors.markers.len(), 1);
        assert_eq!(connectors.markers[0].x, r.x + 50.0);
        assert_eq!(connectors.markers[0].spouse, spouse);
    }

    #[test]
    fn later_spouses_are_staggered_with_offset_marker() {
        let mut graph = FamilyGraph::new();
        let root = graph.add_root("R", Gender::Male);
        graph.add_spouse(&root, "S1", Gender::Female).unwrap();
        graph.add_spouse(&root, "S2", Gender::Female).unwrap();
        let config = config();
        let layout = compute_layout(&graph, &config, None);
        let connectors = build_connectors(&graph, &layout, &config);

        let r = layout.position(&root).unwrap();
        assert_eq!(connectors.markers.len(), 2);
        assert_eq!(connectors.markers[0].y, r.y);
        assert_eq!(connectors.markers[1].y, r.y + 6.0);
        // second spouse sits at +200; its left edge is at +180
        assert_eq!(connectors.markers[1].x, r.x + 170.0);
    }

    #[test]
    fn descent_from_couple_midpoint_drops_to_bus() {
        let mut graph = FamilyGraph::new();
        let root = graph.add_root("R", Gender::Male);
        graph.add_spouse(&root, "S", Gender::Female).unwrap();
        let first = graph.add_child(&root, "C1", Gender::Male).unwrap();
        let second = graph.add_child(&root, "C2", Gender::Male).unwrap();
        let config = config();
        let layout = compute_layout(&graph, &config, None);
        let connectors = build_connectors(&graph, &layout, &config);

        let row = &layout.ranges[&root];
        let bus_y = (row.anchor.y + row.y) / 2.0;
        let trunk = lines_of(&connectors, |k| matches!(k, ConnectorKind::Trunk { .. }));
        assert_eq!(trunk.len(), 1);
        assert_eq!(
            trunk[0].points,
            vec![(row.anchor.x, row.anchor.y), (row.anchor.x, bus_y)]
        );

        let bus = lines_of(&connectors, |k| matches!(k, ConnectorKind::Bus { .. }));
        assert_eq!(bus[0].points, vec![(row.left, bus_y), (row.right, bus_y)]);

        let stubs = lines_of(&connectors, |k| matches!(k, ConnectorKind::ChildStub { .. }));
        assert_eq!(stubs.len(), 2);
        for (stub, child) in stubs.iter().zip([&first, &second]) {
            let at = layout.position(child).unwrap();
            assert_eq!(stub.points, vec![(at.x, bus_y), (at.x, at.y - 20.0)]);
        }
    }

    #[test]
    fn single_parent_trunk_starts_below_avatar() {
        let mut graph = FamilyGraph::new();
        let root = graph.add_root("R", Gender::Male);
        graph.add_child(&root, "C", Gender::Male).unwrap();
        let config = config();
        let layout = compute_layout(&graph, &config, None);
        let connectors = build_connectors(&graph, &layout, &config);

        let r = layout.position(&root).unwrap();
        let trunk = lines_of(&connectors, |k| matches!(k, ConnectorKind::Trunk { .. }));
        assert_eq!(trunk[0].points[0], (r.x, r.y + 20.0));
        // a lone child needs no bus
        assert!(lines_of(&connectors, |k| matches!(k, ConnectorKind::Bus { .. })).is_empty());
    }

    #[test]
    fn drop_x_is_clamped_into_row() {
        let mut layout = FamilyLayout::default();
        layout.positions.insert("p".into(), Point::new(0.0, 0.0));
        layout.positions.insert("a".into(), Point::new(200.0, 140.0));
        layout.positions.insert("b".into(), Point::new(320.0, 140.0));
        layout.ranges.insert(
            "p".into(),
            ChildRow {
                left: 200.0,
                right: 320.0,
                anchor: Point::new(0.0, 0.0),
                y: 140.0,
                children: vec!["a".into(), "b".into()],
            },
        );
        let mut lines = Vec::new();
        descent(&layout, &config(), "p", &layout.ranges["p"], &mut lines);

        let trunk = &lines[0];
        assert_eq!(
            trunk.points,
            vec![(0.0, 20.0), (0.0, 45.0), (200.0, 45.0), (200.0, 70.0)]
        );
        assert!(lines.iter().all(Connector::is_axis_aligned));
    }
}
