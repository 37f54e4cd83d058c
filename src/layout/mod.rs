mod connectors;
mod hit;
mod tree;
mod types;
mod width;
mod zoom;

pub use connectors::{Connector, ConnectorKind, Connectors, LinkMarker, build_connectors};
pub use hit::hit_test;
pub use types::{Canvas, ChildRow, FamilyLayout, Point, Slot};
pub use width::{WidthCache, child_slots, row_span, slots_for_children, subtree_width};
pub use zoom::{ZoomPair, compute_zoom_layout, resolve_zoom_pair, zoom_members, zoom_siblings};

use crate::config::LayoutConfig;
use crate::family::FamilyGraph;

use tree::{LayoutPass, collect_draw_order};

/// Lays out the whole forest from scratch. Roots are stacked top to bottom in
/// forest order, each starting at `x = 0`; the result is normalized to the
/// safe margin and centred in `canvas` when one is given.
pub fn compute_layout(
    graph: &FamilyGraph,
    config: &LayoutConfig,
    canvas: Option<Canvas>,
) -> FamilyLayout {
    let mut pass = LayoutPass::new(graph, config);
    let mut cursor_y = 0.0;
    for root in graph.roots() {
        if !graph.contains(root) || pass.is_positioned(root) {
            continue;
        }
        pass.reset_max_y(cursor_y);
        pass.layout_member(root, 0.0, cursor_y);
        let height = pass.max_y() - cursor_y + config.vertical_spacing;
        cursor_y += height + config.tree_margin;
    }

    let mut layout = pass.finish();
    layout.draw_order = collect_draw_order(graph, graph.roots(), &layout.positions, &[]);
    layout.normalize(config.safe_margin, canvas);
    tracing::debug!(
        members = layout.positions.len(),
        rows = layout.ranges.len(),
        width = layout.width,
        height = layout.height,
        "computed forest layout"
    );
    layout
}
