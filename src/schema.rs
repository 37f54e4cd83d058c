//! JSON persistence for the family graph. Each record nests its spouses,
//! children and parents; a member written once appears later only as a
//! shallow stub carrying id, name and gender.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::family::{FamilyGraph, Gender, Member};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid family document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("member record with an empty id")]
    EmptyId,
    #[error("family document is empty")]
    EmptyDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub spouses: Vec<MemberRecord>,
    pub children: Vec<MemberRecord>,
    #[serde(default)]
    pub parents: Vec<MemberRecord>,
}

impl MemberRecord {
    fn stub(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            gender: member.gender,
            spouses: Vec::new(),
            children: Vec::new(),
            parents: Vec::new(),
        }
    }
}

#[derive(Clone, Copy)]
enum Relation {
    Spouse,
    Child,
    Parent,
}

impl FamilyGraph {
    /// One record per root that is not itself somebody's added parent. Such
    /// detached roots are reached through the nested `parents` lists.
    pub fn to_records(&self) -> Vec<MemberRecord> {
        let parent_nodes = self.parent_nodes();
        let mut emitted = HashSet::new();
        let mut records = Vec::new();
        let (primary, detached): (Vec<&String>, Vec<&String>) = self
            .roots()
            .iter()
            .partition(|id| !parent_nodes.contains(id.as_str()));
        for root in primary {
            if let Some(record) = self.member_record(root, &mut emitted) {
                records.push(record);
            }
        }
        // Detached roots whose child never got written still need a home.
        for root in detached {
            if !emitted.contains(root.as_str())
                && let Some(record) = self.member_record(root, &mut emitted)
            {
                records.push(record);
            }
        }
        records
    }

    fn member_record<'g>(
        &'g self,
        id: &'g str,
        emitted: &mut HashSet<&'g str>,
    ) -> Option<MemberRecord> {
        let member = self.member(id)?;
        if !emitted.insert(member.id.as_str()) {
            return Some(MemberRecord::stub(member));
        }
        let mut record = MemberRecord::stub(member);
        record.spouses = self.member_records(&member.spouses, emitted);
        record.children = self.member_records(&member.children, emitted);
        record.parents = self.member_records(&member.parents, emitted);
        Some(record)
    }

    fn member_records<'g>(
        &'g self,
        ids: &'g [String],
        emitted: &mut HashSet<&'g str>,
    ) -> Vec<MemberRecord> {
        ids.iter()
            .filter_map(|id| self.member_record(id, emitted))
            .collect()
    }

    /// Rebuilds a graph from records. Records sharing an id describe one
    /// member: the first occurrence names it, relation lists are merged.
    pub fn from_records(records: &[MemberRecord]) -> Result<FamilyGraph, PersistError> {
        let mut graph = FamilyGraph::new();
        let mut placed = HashSet::new();
        let mut parent_refs = Vec::new();
        for record in records {
            collect_record(&mut graph, record, &mut placed, &mut parent_refs)?;
        }
        for record in records {
            graph.push_root(record.id.clone());
        }
        for id in parent_refs {
            if !placed.contains(&id) {
                graph.push_root(id);
            }
        }
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        let records = self.to_records();
        let json = match records.as_slice() {
            [single] => serde_json::to_string_pretty(single)?,
            _ => serde_json::to_string_pretty(&records)?,
        };
        Ok(json)
    }

    /// Accepts either a single record object or an array of records. Nesting
    /// depth is unbounded so any lineage `to_json` writes reads back.
    pub fn from_json(json: &str) -> Result<FamilyGraph, PersistError> {
        let body = json.trim_start();
        if body.is_empty() {
            return Err(PersistError::EmptyDocument);
        }
        let records = if body.starts_with('[') {
            decode_unbounded::<Vec<MemberRecord>>(body)?
        } else {
            vec![decode_unbounded::<MemberRecord>(body)?]
        };
        let graph = Self::from_records(&records)?;
        tracing::debug!(members = graph.len(), roots = graph.roots().len(), "decoded family");
        Ok(graph)
    }
}

/// Deserializes without serde_json's recursion limit, growing the stack on
/// demand instead of overflowing it.
fn decode_unbounded<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, serde_json::Error> {
    let mut reader = serde_json::Deserializer::from_str(json);
    reader.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut reader))?;
    reader.end()?;
    Ok(value)
}

fn collect_record(
    graph: &mut FamilyGraph,
    record: &MemberRecord,
    placed: &mut HashSet<String>,
    parent_refs: &mut Vec<String>,
) -> Result<(), PersistError> {
    if record.id.trim().is_empty() {
        return Err(PersistError::EmptyId);
    }
    if !graph.contains(&record.id) {
        graph.insert_member(Member::new(
            record.id.clone(),
            record.name.clone(),
            record.gender,
        ));
    }
    for spouse in &record.spouses {
        collect_record(graph, spouse, placed, parent_refs)?;
        placed.insert(spouse.id.clone());
        link(graph, &record.id, &spouse.id, Relation::Spouse);
    }
    for child in &record.children {
        collect_record(graph, child, placed, parent_refs)?;
        placed.insert(child.id.clone());
        link(graph, &record.id, &child.id, Relation::Child);
    }
    for parent in &record.parents {
        collect_record(graph, parent, placed, parent_refs)?;
        parent_refs.push(parent.id.clone());
        link(graph, &record.id, &parent.id, Relation::Parent);
    }
    Ok(())
}

fn link(graph: &mut FamilyGraph, owner: &str, other: &str, relation: Relation) {
    let Some(member) = graph.member_mut(owner) else {
        return;
    };
    let list = match relation {
        Relation::Spouse => &mut member.spouses,
        Relation::Child => &mut member.children,
        Relation::Parent => &mut member.parents,
    };
    if !list.iter().any(|id| id == other) {
        list.push(other.to_string());
    }
}
