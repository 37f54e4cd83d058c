use std::collections::{BTreeMap, HashSet};

use crate::config::LayoutConfig;
use crate::family::FamilyGraph;

use super::width::{WidthCache, child_slots, row_span};
use super::{ChildRow, FamilyLayout, Point, Slot};

/// Mutable state of one layout pass. Cleared by construction; read-only once
/// `finish` hands the layout out.
pub(super) struct LayoutPass<'a> {
    graph: &'a FamilyGraph,
    config: &'a LayoutConfig,
    widths: WidthCache<'a>,
    layout: FamilyLayout,
    expanded: HashSet<String>,
    max_y: f32,
}

impl<'a> LayoutPass<'a> {
    pub(super) fn new(graph: &'a FamilyGraph, config: &'a LayoutConfig) -> Self {
        Self {
            graph,
            config,
            widths: WidthCache::new(graph, config),
            layout: FamilyLayout::default(),
            expanded: HashSet::new(),
            max_y: 0.0,
        }
    }

    pub(super) fn is_positioned(&self, id: &str) -> bool {
        self.layout.positions.contains_key(id)
    }

    pub(super) fn position(&self, id: &str) -> Option<Point> {
        self.layout.positions.get(id).copied()
    }

    pub(super) fn max_y(&self) -> f32 {
        self.max_y
    }

    pub(super) fn reset_max_y(&mut self, y: f32) {
        self.max_y = y;
    }

    pub(super) fn place(&mut self, id: &str, x: f32, y: f32) {
        self.layout.positions.insert(id.to_string(), Point::new(x, y));
        self.max_y = self.max_y.max(y);
    }

    pub(super) fn mark_expanded(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }

    pub(super) fn record_row(&mut self, owner: &str, row: ChildRow) {
        self.layout.ranges.insert(owner.to_string(), row);
    }

    pub(super) fn finish(self) -> FamilyLayout {
        self.layout
    }

    /// Places `id` centred at `center_x`, its unplaced spouses to its right,
    /// and recursively its children row one generation down.
    pub(super) fn layout_member(&mut self, id: &str, center_x: f32, y: f32) {
        self.layout_family(id, center_x, y, f32::NEG_INFINITY);
    }

    /// Lays out `id` and everything hanging from it. Children rows of spouses
    /// come after the member's own row and start no further left than
    /// `min_left`, or a branch gap past the row before them. Returns the
    /// right edge of the last row laid out.
    fn layout_family(&mut self, id: &str, center_x: f32, y: f32, min_left: f32) -> Option<f32> {
        if !self.expanded.insert(id.to_string()) {
            return None;
        }
        let graph = self.graph;
        let member = graph.member(id)?;
        self.place(id, center_x, y);

        // spouses a parent row already reserved keep their slot
        let mut spouses = Vec::new();
        for (index, spouse) in member.spouses.iter().enumerate() {
            if !graph.contains(spouse) {
                continue;
            }
            if !self.is_positioned(spouse) {
                let x = center_x + (index as f32 + 1.0) * self.config.base_spacing;
                self.place(spouse, x, y);
            }
            if !self.expanded.contains(spouse.as_str()) {
                spouses.push(spouse.as_str());
            }
        }

        let mut row_right = None;
        let slots = child_slots(graph, id);
        if !slots.is_empty() {
            let mut connector_x = center_x;
            if let Some(first) = member.spouses.first()
                && let Some(spouse_pos) = self.position(first)
            {
                connector_x = (center_x + spouse_pos.x) / 2.0;
            }
            let child_y = y + self.config.vertical_spacing;
            row_right = self.lay_out_row(id, Point::new(connector_x, y), &slots, child_y, min_left);
        }

        let gap = self.config.branch_gap;
        for spouse in spouses {
            let Some(at) = self.position(spouse) else {
                continue;
            };
            if graph.member(spouse).is_some_and(|s| s.has_children()) {
                let spouse_min = row_right.map_or(min_left, |right| right + gap);
                if let Some(right) = self.layout_family(spouse, at.x, at.y, spouse_min) {
                    row_right = Some(right);
                }
            } else {
                self.mark_expanded(spouse);
            }
        }
        row_right
    }

    /// Lays out a children row centred under `anchor` and every subtree
    /// below it. Returns the right edge of the reserved span.
    pub(super) fn lay_out_row(
        &mut self,
        owner: &str,
        anchor: Point,
        slots: &[Slot],
        child_y: f32,
        min_left: f32,
    ) -> Option<f32> {
        let (reserved, right) = self.reserve_row(owner, anchor, slots, child_y, min_left)?;
        for (target, center) in reserved {
            self.layout_member(&target, center, child_y);
        }
        Some(right)
    }

    /// Places the unplaced slot targets of one row without descending below
    /// them, recording the row in `ranges` under `owner`. The row slides
    /// right when it would start left of `min_left`. Every target is placed
    /// before any caller recurses so later siblings see their neighbours'
    /// spouses placed. Returns the newly placed targets and the right edge
    /// of the reserved span.
    pub(super) fn reserve_row(
        &mut self,
        owner: &str,
        anchor: Point,
        slots: &[Slot],
        child_y: f32,
        min_left: f32,
    ) -> Option<(Vec<(String, f32)>, f32)> {
        if slots.is_empty() {
            return None;
        }
        let gap = self.config.branch_gap;
        let widths = self.widths.slot_widths(slots);
        let total = row_span(&widths, gap);

        let start = (anchor.x - total / 2.0).max(min_left);
        let mut centers = Vec::with_capacity(slots.len());
        let mut cursor = start;
        for width in &widths {
            centers.push(cursor + width / 2.0);
            cursor += width + gap;
        }

        let left = centers.first().copied().unwrap_or(anchor.x);
        let right = centers.last().copied().unwrap_or(anchor.x);
        self.layout.ranges.insert(
            owner.to_string(),
            ChildRow {
                left,
                right,
                anchor,
                y: child_y,
                children: slots
                    .iter()
                    .filter(|slot| slot.is_child())
                    .map(|slot| slot.target().to_string())
                    .collect(),
            },
        );

        let mut reserved = Vec::new();
        for (slot, center) in slots.iter().zip(centers) {
            let target = slot.target();
            if self.is_positioned(target) {
                continue;
            }
            self.place(target, center, child_y);
            reserved.push((target.to_string(), center));
        }
        Some((reserved, start + total))
    }
}

/// Renderer order: a member, its spouses (descending into a spouse only when
/// it owns children), then each child subtree left to right. Ids in `skip`
/// count as already drawn.
pub(super) fn collect_draw_order(
    graph: &FamilyGraph,
    start: &[String],
    positions: &BTreeMap<String, Point>,
    skip: &[String],
) -> Vec<String> {
    let mut order = Vec::new();
    let mut visited: HashSet<String> = skip.iter().cloned().collect();
    for id in start {
        draw_walk(graph, id, positions, &mut visited, &mut order);
    }
    order
}

fn draw_walk(
    graph: &FamilyGraph,
    id: &str,
    positions: &BTreeMap<String, Point>,
    visited: &mut HashSet<String>,
    order: &mut Vec<String>,
) {
    if !visited.insert(id.to_string()) {
        return;
    }
    if positions.contains_key(id) {
        order.push(id.to_string());
    }
    let Some(member) = graph.member(id) else {
        return;
    };
    for spouse in &member.spouses {
        if graph.member(spouse).is_some_and(|s| s.has_children()) {
            draw_walk(graph, spouse, positions, visited, order);
        } else if positions.contains_key(spouse.as_str()) && visited.insert(spouse.clone()) {
            order.push(spouse.clone());
        }
    }
    for child in &member.children {
        draw_walk(graph, child, positions, visited, order);
    }
}
