use crate::family::FamilyGraph;
use crate::layout::{Connectors, FamilyLayout, ZoomPair};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    /// `forest` or `zoom`.
    pub view: String,
    pub zoom: Option<ZoomPair>,
    pub width: f32,
    pub height: f32,
    pub members: Vec<MemberDump>,
    pub rows: Vec<RowDump>,
    pub draw_order: Vec<String>,
    pub connectors: Connectors,
}

#[derive(Debug, Serialize)]
pub struct MemberDump {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub main: bool,
    pub parent_node: bool,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
pub struct RowDump {
    pub owner: String,
    pub left: f32,
    pub right: f32,
    pub anchor: [f32; 2],
    pub y: f32,
    pub children: Vec<String>,
}

impl LayoutDump {
    pub fn from_layout(
        layout: &FamilyLayout,
        graph: &FamilyGraph,
        connectors: &Connectors,
        zoom: Option<&ZoomPair>,
    ) -> Self {
        let lineage = graph.lineage();
        let members = layout
            .draw_order
            .iter()
            .filter_map(|id| {
                let point = layout.position(id)?;
                let member = graph.member(id)?;
                Some(MemberDump {
                    id: id.clone(),
                    name: member.name.clone(),
                    gender: member.gender.as_str().to_string(),
                    main: lineage.is_main(id),
                    parent_node: lineage.is_parent_node(id),
                    x: point.x,
                    y: point.y,
                })
            })
            .collect();

        let rows = layout
            .ranges
            .iter()
            .map(|(owner, row)| RowDump {
                owner: owner.clone(),
                left: row.left,
                right: row.right,
                anchor: [row.anchor.x, row.anchor.y],
                y: row.y,
                children: row.children.clone(),
            })
            .collect();

        LayoutDump {
            view: if zoom.is_some() { "zoom" } else { "forest" }.to_string(),
            zoom: zoom.cloned(),
            width: layout.width,
            height: layout.height,
            members,
            rows,
            draw_order: layout.draw_order.clone(),
            connectors: connectors.clone(),
        }
    }
}

pub fn write_layout_dump(
    path: &Path,
    layout: &FamilyLayout,
    graph: &FamilyGraph,
    connectors: &Connectors,
    zoom: Option<&ZoomPair>,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, graph, connectors, zoom);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
