use std::collections::{HashMap, HashSet};

use crate::config::LayoutConfig;
use crate::family::FamilyGraph;

use super::Slot;

/// Slots for a member's own children row: each child, then each of that
/// child's spouses.
pub fn child_slots(graph: &FamilyGraph, id: &str) -> Vec<Slot> {
    match graph.member(id) {
        Some(member) => slots_for_children(graph, &member.children),
        None => Vec::new(),
    }
}

pub fn slots_for_children(graph: &FamilyGraph, children: &[String]) -> Vec<Slot> {
    let mut slots = Vec::new();
    for child_id in children {
        let Some(child) = graph.member(child_id) else {
            continue;
        };
        slots.push(Slot::Child(child_id.clone()));
        for spouse in &child.spouses {
            if graph.contains(spouse) {
                slots.push(Slot::ChildSpouse {
                    child: child_id.clone(),
                    spouse: spouse.clone(),
                });
            }
        }
    }
    slots
}

/// Total span of a row: widths plus one gap between neighbours.
pub fn row_span(widths: &[f32], gap: f32) -> f32 {
    if widths.is_empty() {
        return 0.0;
    }
    widths.iter().sum::<f32>() + gap * (widths.len() as f32 - 1.0)
}

pub fn subtree_width(graph: &FamilyGraph, id: &str, config: &LayoutConfig) -> f32 {
    WidthCache::new(graph, config).width(id)
}

/// Per-pass memo of subtree widths. Lives for one layout pass only.
pub struct WidthCache<'a> {
    graph: &'a FamilyGraph,
    config: &'a LayoutConfig,
    memo: HashMap<String, f32>,
    in_progress: HashSet<String>,
}

impl<'a> WidthCache<'a> {
    pub fn new(graph: &'a FamilyGraph, config: &'a LayoutConfig) -> Self {
        Self {
            graph,
            config,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    pub fn width(&mut self, id: &str) -> f32 {
        if let Some(value) = self.memo.get(id) {
            return *value;
        }
        // A member already on the measuring stack closes a cycle; treat it as a leaf.
        if !self.in_progress.insert(id.to_string()) {
            return self.config.base_spacing;
        }
        let slots = child_slots(self.graph, id);
        let width = if slots.is_empty() {
            self.config.base_spacing
        } else {
            let widths = self.slot_widths(&slots);
            row_span(&widths, self.config.branch_gap)
        };
        self.in_progress.remove(id);
        self.memo.insert(id.to_string(), width);
        width
    }

    pub fn slot_widths(&mut self, slots: &[Slot]) -> Vec<f32> {
        slots.iter().map(|slot| self.width(slot.target())).collect()
    }
}
