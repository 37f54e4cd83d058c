//! Focus view around one spouse pair: the main member, the spouse, the
//! spouse's added parents above and, when both parents exist, the spouse's
//! siblings below. Nothing below the siblings' row is placed.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::family::FamilyGraph;

use super::tree::{LayoutPass, collect_draw_order};
use super::width::slots_for_children;
use super::{Canvas, ChildRow, FamilyLayout, Point};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoomPair {
    pub main: String,
    pub spouse: String,
}

/// Resolves the pair a tap on `target` focuses. A parent-node first resolves
/// to the spouse that lists it as a parent; the spouse then resolves to its
/// main partner.
pub fn resolve_zoom_pair(graph: &FamilyGraph, target: &str) -> Option<ZoomPair> {
    let lineage = graph.lineage();
    let role = graph.role_in(&lineage, target)?;
    let spouse = if role.parent_node {
        graph.child_of_parent_node(target)?
    } else if role.is_spouse_node() {
        target
    } else {
        return None;
    };
    let main = graph.main_partner_in(&lineage, spouse)?;
    let pair = ZoomPair {
        main: main.to_string(),
        spouse: spouse.to_string(),
    };
    tracing::debug!(member = %target, main = %pair.main, spouse = %pair.spouse, "resolved zoom pair");
    Some(pair)
}

/// Up to two of the spouse's parents that still exist in the graph.
fn zoom_parents<'g>(graph: &'g FamilyGraph, pair: &ZoomPair) -> Vec<&'g str> {
    graph
        .member(&pair.spouse)
        .map(|spouse| {
            spouse
                .parents
                .iter()
                .filter(|id| graph.contains(id))
                .take(2)
                .map(String::as_str)
                .collect()
        })
        .unwrap_or_default()
}

/// The spouse's siblings: the union of both parents' children, without the
/// spouse. Empty unless both parents are present.
pub fn zoom_siblings(graph: &FamilyGraph, pair: &ZoomPair) -> Vec<String> {
    let parents = zoom_parents(graph, pair);
    if parents.len() < 2 {
        return Vec::new();
    }
    let lineage = graph.lineage();
    let mut seen: HashSet<&str> = HashSet::from([pair.spouse.as_str()]);
    let mut siblings = Vec::new();
    for parent in parents {
        for child in graph.children_view_in(&lineage, parent) {
            if graph.contains(child) && seen.insert(child.as_str()) {
                siblings.push(child.clone());
            }
        }
    }
    siblings
}

/// Every member the focus view places: the pair, the spouse's parents, and
/// the siblings' row (siblings and their spouses). A tap on any of them
/// keeps the view.
pub fn zoom_members(graph: &FamilyGraph, pair: &ZoomPair) -> Vec<String> {
    let mut members = vec![pair.main.clone(), pair.spouse.clone()];
    members.extend(zoom_parents(graph, pair).into_iter().map(str::to_string));
    let siblings = zoom_siblings(graph, pair);
    for slot in slots_for_children(graph, &siblings) {
        if !members.iter().any(|m| m == slot.target()) {
            members.push(slot.target().to_string());
        }
    }
    members
}

pub fn compute_zoom_layout(
    graph: &FamilyGraph,
    pair: &ZoomPair,
    config: &LayoutConfig,
    canvas: Option<Canvas>,
) -> FamilyLayout {
    let mut pass = LayoutPass::new(graph, config);
    let spouse_x = config.base_spacing;
    pass.place(&pair.main, 0.0, 0.0);
    pass.mark_expanded(&pair.main);
    pass.place(&pair.spouse, spouse_x, 0.0);
    pass.mark_expanded(&pair.spouse);

    let parents = zoom_parents(graph, pair);
    match parents.as_slice() {
        [single] => {
            pass.place(single, spouse_x, -config.zoom.single_parent_offset_y);
        }
        [first, second] => {
            let half = config.zoom.two_parent_spacing_x / 2.0;
            let y = -config.zoom.two_parent_offset_y;
            pass.place(first, spouse_x - half, y);
            pass.place(second, spouse_x + half, y);
        }
        _ => {}
    }
    for parent in &parents {
        pass.mark_expanded(parent);
    }

    if let Some(first) = parents.first() {
        let anchor = parent_anchor(&pass, &parents);
        pass.record_row(
            first,
            ChildRow {
                left: spouse_x,
                right: spouse_x,
                anchor,
                y: 0.0,
                children: vec![pair.spouse.clone()],
            },
        );
    }

    let siblings = zoom_siblings(graph, pair);
    if !siblings.is_empty() {
        let slots = slots_for_children(graph, &siblings);
        let anchor = Point::new(spouse_x / 2.0, 0.0);
        // the row stops at the siblings and their spouses
        pass.reserve_row(&pair.spouse, anchor, &slots, config.vertical_spacing, f32::NEG_INFINITY);
    }

    let mut layout = pass.finish();
    let mut fixed: Vec<String> = parents.iter().map(|id| id.to_string()).collect();
    fixed.push(pair.main.clone());
    fixed.push(pair.spouse.clone());
    let mut order: Vec<String> = fixed
        .iter()
        .filter(|id| layout.is_positioned(id))
        .cloned()
        .collect();
    order.extend(collect_draw_order(graph, &siblings, &layout.positions, &fixed));
    layout.draw_order = order;
    layout.normalize(config.safe_margin, canvas);
    tracing::debug!(
        main = %pair.main,
        spouse = %pair.spouse,
        parents = parents.len(),
        siblings = siblings.len(),
        "computed zoom layout"
    );
    layout
}

/// Midpoint of the placed parents, on their shared line.
fn parent_anchor(pass: &LayoutPass<'_>, parents: &[&str]) -> Point {
    let placed: Vec<Point> = parents.iter().filter_map(|id| pass.position(id)).collect();
    if placed.is_empty() {
        return Point::new(0.0, 0.0);
    }
    let n = placed.len() as f32;
    Point::new(
        placed.iter().map(|p| p.x).sum::<f32>() / n,
        placed.iter().map(|p| p.y).sum::<f32>() / n,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::Gender;

    struct Fixture {
        graph: FamilyGraph,
        root: String,
        spouse: String,
        mother: String,
        father: String,
    }

    fn fixture() -> Fixture {
        let mut graph = FamilyGraph::new();
        let root = graph.add_root("Root", Gender::Male);
        let spouse = graph.add_spouse(&root, "Wife", Gender::Female).unwrap();
        let mother = graph.add_parent(&spouse, "Mum", Gender::Female).unwrap();
        let father = graph.add_parent(&spouse, "Dad", Gender::Male).unwrap();
        Fixture {
            graph,
            root,
            spouse,
            mother,
            father,
        }
    }

    fn config() -> LayoutConfig {
        LayoutConfig {
            base_spacing: 100.0,
            vertical_spacing: 140.0,
            branch_gap: 20.0,
            safe_margin: 0.0,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn resolves_from_spouse_and_from_parent() {
        let f = fixture();
        let expected = ZoomPair {
            main: f.root.clone(),
            spouse: f.spouse.clone(),
        };
        assert_eq!(resolve_zoom_pair(&f.graph, &f.spouse), Some(expected.clone()));
        assert_eq!(resolve_zoom_pair(&f.graph, &f.mother), Some(expected.clone()));
        assert_eq!(resolve_zoom_pair(&f.graph, &f.father), Some(expected));
        assert_eq!(resolve_zoom_pair(&f.graph, &f.root), None);
        assert_eq!(resolve_zoom_pair(&f.graph, "missing"), None);
    }

    #[test]
    fn siblings_are_deduplicated_and_exclude_spouse() {
        let mut f = fixture();
        let sib = f.graph.add_child(&f.mother, "Sib", Gender::Male).unwrap();
        let other = f.graph.add_child(&f.father, "Other", Gender::Female).unwrap();
        let pair = resolve_zoom_pair(&f.graph, &f.spouse).unwrap();
        assert_eq!(zoom_siblings(&f.graph, &pair), vec![sib.clone(), other.clone()]);
        assert_eq!(
            zoom_members(&f.graph, &pair),
            vec![f.root.clone(), f.spouse.clone(), f.mother.clone(), f.father.clone(), sib, other]
        );
    }

    #[test]
    fn sibling_row_stops_at_siblings_and_their_spouses() {
        let mut f = fixture();
        let sib = f.graph.add_child(&f.mother, "Sib", Gender::Male).unwrap();
        let sib_wife = f.graph.add_spouse(&sib, "SibWife", Gender::Female).unwrap();
        let nephew = f.graph.add_child(&sib, "Nephew", Gender::Male).unwrap();
        let pair = resolve_zoom_pair(&f.graph, &f.spouse).unwrap();
        let layout = compute_zoom_layout(&f.graph, &pair, &config(), None);

        assert!(layout.is_positioned(&sib_wife));
        assert!(!layout.is_positioned(&nephew));
        assert!(!layout.draw_order.contains(&nephew));
        assert!(!layout.ranges.contains_key(&sib));

        let mut members = zoom_members(&f.graph, &pair);
        members.sort();
        let mut placed: Vec<String> = layout.positions.keys().cloned().collect();
        placed.sort();
        assert_eq!(members, placed);
    }

    #[test]
    fn two_parents_sit_above_spouse_and_siblings_below() {
        let mut f = fixture();
        let sib = f.graph.add_child(&f.mother, "Sib", Gender::Male).unwrap();
        let pair = resolve_zoom_pair(&f.graph, &f.spouse).unwrap();
        let config = config();
        let layout = compute_zoom_layout(&f.graph, &pair, &config, None);

        let main = layout.position(&f.root).unwrap();
        let spouse = layout.position(&f.spouse).unwrap();
        let mother = layout.position(&f.mother).unwrap();
        let father = layout.position(&f.father).unwrap();
        let sibling = layout.position(&sib).unwrap();

        assert_eq!(spouse.x - main.x, 100.0);
        assert_eq!(spouse.y - mother.y, 140.0);
        assert_eq!(father.y, mother.y);
        assert_eq!(father.x - mother.x, 120.0);
        assert_eq!((mother.x + father.x) / 2.0, spouse.x);
        assert_eq!(sibling.y - spouse.y, 140.0);
        assert_eq!(sibling.x, (main.x + spouse.x) / 2.0);

        assert_eq!(layout.range(&f.mother), Some((spouse.x, spouse.x)));
        assert_eq!(
            layout.draw_order,
            vec![f.mother, f.father, f.root, f.spouse, sib]
        );
    }

    #[test]
    fn single_parent_centres_over_spouse() {
        let mut graph = FamilyGraph::new();
        let root = graph.add_root("Root", Gender::Male);
        let spouse = graph.add_spouse(&root, "Wife", Gender::Female).unwrap();
        let mother = graph.add_parent(&spouse, "Mum", Gender::Female).unwrap();
        graph.add_child(&mother, "Sib", Gender::Male).unwrap();
        let pair = resolve_zoom_pair(&graph, &mother).unwrap();
        let layout = compute_zoom_layout(&graph, &pair, &config(), None);

        let spouse_at = layout.position(&spouse).unwrap();
        let mother_at = layout.position(&mother).unwrap();
        assert_eq!(mother_at.x, spouse_at.x);
        assert_eq!(spouse_at.y - mother_at.y, 140.0);
        // siblings only show once both parents are known
        assert_eq!(layout.positions.len(), 3);
    }

    #[test]
    fn zoom_layout_is_stable() {
        let f = fixture();
        let pair = resolve_zoom_pair(&f.graph, &f.spouse).unwrap();
        let canvas = Some(Canvas::new(800.0, 600.0));
        let first = compute_zoom_layout(&f.graph, &pair, &config(), canvas);
        let second = compute_zoom_layout(&f.graph, &pair, &config(), canvas);
        assert_eq!(first, second);
    }
}
