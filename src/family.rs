//! Family graph model: members, their relations, and the edit operations a
//! host calls. Members live in an arena keyed by id; relations are id lists.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// A person in the forest.
///
/// Equality, ordering and hashing use `id` alone: two values with the same id
/// are the same member even when their relation lists differ.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    /// First entry is the primary connector anchor.
    pub spouses: Vec<String>,
    /// Children owned by this member, in left-to-right order.
    pub children: Vec<String>,
    /// Back-references to added parents. Never traversed for layout.
    pub parents: Vec<String>,
}

impl Member {
    pub fn new(id: impl Into<String>, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            gender,
            spouses: Vec::new(),
            children: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Member {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Member {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// How a member sits in the forest. `main` and `parent_node` are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    pub main: bool,
    pub parent_node: bool,
}

impl Role {
    pub fn is_spouse_node(&self) -> bool {
        !self.main
    }
}

/// Main-line and parent-node membership for one unchanged graph.
#[derive(Debug, Clone)]
pub struct Lineage<'g> {
    main: HashSet<&'g str>,
    parent_nodes: HashSet<&'g str>,
}

impl Lineage<'_> {
    pub fn is_main(&self, id: &str) -> bool {
        self.main.contains(id)
    }

    pub fn is_parent_node(&self, id: &str) -> bool {
        self.parent_nodes.contains(id)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("no member with id `{0}`")]
    MemberNotFound(String),
    #[error("`{0}` joined the family as a spouse; only the main line can take a spouse")]
    NotMain(String),
    #[error("`{0}` is on the main line; parents can only be added to a spouse")]
    IsMain(String),
    #[error("`{0}` already has two parents")]
    ParentLimit(String),
}

pub fn new_member_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Default)]
pub struct FamilyGraph {
    members: BTreeMap<String, Member>,
    roots: Vec<String>,
}

impl FamilyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub(crate) fn insert_member(&mut self, member: Member) {
        self.members.insert(member.id.clone(), member);
    }

    pub(crate) fn member_mut(&mut self, id: &str) -> Option<&mut Member> {
        self.members.get_mut(id)
    }

    pub(crate) fn push_root(&mut self, id: String) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
    }

    /// Members on the primary line of descent: roots and everything reachable
    /// from them through `children` alone, minus anyone listed as a spouse.
    pub fn main_line(&self) -> HashSet<&str> {
        let in_spouse_list: HashSet<&str> = self
            .members
            .values()
            .flat_map(|member| member.spouses.iter().map(String::as_str))
            .collect();
        let mut main = HashSet::new();
        let mut queue: VecDeque<&str> = self.roots.iter().map(String::as_str).collect();
        while let Some(id) = queue.pop_front() {
            if in_spouse_list.contains(id) || !main.insert(id) {
                continue;
            }
            if let Some(member) = self.members.get(id) {
                queue.extend(member.children.iter().map(String::as_str));
            }
        }
        main
    }

    pub fn parent_nodes(&self) -> HashSet<&str> {
        self.members
            .values()
            .flat_map(|member| member.parents.iter().map(String::as_str))
            .collect()
    }

    /// Classifies every member in one walk. Callers that ask about several
    /// members, or ask more than once, reuse it through the `*_in` methods.
    pub fn lineage(&self) -> Lineage<'_> {
        Lineage {
            main: self.main_line(),
            parent_nodes: self.parent_nodes(),
        }
    }

    pub fn role(&self, id: &str) -> Option<Role> {
        self.role_in(&self.lineage(), id)
    }

    pub fn role_in(&self, lineage: &Lineage<'_>, id: &str) -> Option<Role> {
        if !self.members.contains_key(id) {
            return None;
        }
        Some(Role {
            main: lineage.is_main(id),
            parent_node: lineage.is_parent_node(id),
        })
    }

    pub fn is_main(&self, id: &str) -> bool {
        self.role(id).is_some_and(|role| role.main)
    }

    pub fn is_spouse_node(&self, id: &str) -> bool {
        self.role(id).is_some_and(|role| role.is_spouse_node())
    }

    pub fn is_parent_node(&self, id: &str) -> bool {
        self.role(id).is_some_and(|role| role.parent_node)
    }

    /// The main-line member whose `spouses` list contains `id`.
    pub fn main_partner(&self, id: &str) -> Option<&str> {
        self.main_partner_in(&self.lineage(), id)
    }

    pub fn main_partner_in(&self, lineage: &Lineage<'_>, id: &str) -> Option<&str> {
        self.members
            .values()
            .find(|member| {
                lineage.is_main(&member.id) && member.spouses.iter().any(|s| s == id)
            })
            .map(|member| member.id.as_str())
    }

    /// The first member that lists `parent_id` among its parents.
    pub fn child_of_parent_node(&self, parent_id: &str) -> Option<&str> {
        self.members
            .values()
            .find(|member| member.parents.iter().any(|p| p == parent_id))
            .map(|member| member.id.as_str())
    }

    /// The member that actually stores children added to `id`: the main
    /// partner when `id` is that partner's first spouse, `id` otherwise.
    pub fn child_owner(&self, id: &str) -> Result<&str, EditError> {
        self.child_owner_in(&self.lineage(), id)
    }

    pub fn child_owner_in(&self, lineage: &Lineage<'_>, id: &str) -> Result<&str, EditError> {
        let member = self
            .members
            .get(id)
            .ok_or_else(|| EditError::MemberNotFound(id.to_string()))?;
        if let Some(partner) = self.main_partner_in(lineage, id)
            && let Some(partner_member) = self.members.get(partner)
            && partner_member.spouses.first().map(String::as_str) == Some(id)
        {
            return Ok(partner_member.id.as_str());
        }
        Ok(member.id.as_str())
    }

    /// Children as seen from `id`; a first spouse sees the couple's shared set.
    pub fn children_view(&self, id: &str) -> &[String] {
        self.children_view_in(&self.lineage(), id)
    }

    pub fn children_view_in(&self, lineage: &Lineage<'_>, id: &str) -> &[String] {
        match self.child_owner_in(lineage, id) {
            Ok(owner) => self
                .members
                .get(owner)
                .map(|member| member.children.as_slice())
                .unwrap_or(&[]),
            Err(_) => &[],
        }
    }

    pub fn add_root(&mut self, name: impl Into<String>, gender: Gender) -> String {
        let id = new_member_id();
        self.insert_member(Member::new(id.clone(), name, gender));
        self.push_root(id.clone());
        tracing::info!(member = %id, "added forest root");
        id
    }

    pub fn add_child(
        &mut self,
        target: &str,
        name: impl Into<String>,
        gender: Gender,
    ) -> Result<String, EditError> {
        let owner = self.child_owner(target)?.to_string();
        let id = new_member_id();
        self.insert_member(Member::new(id.clone(), name, gender));
        if let Some(owner_member) = self.members.get_mut(&owner) {
            owner_member.children.push(id.clone());
        }
        tracing::info!(member = %id, owner = %owner, "added child");
        Ok(id)
    }

    pub fn add_spouse(
        &mut self,
        target: &str,
        name: impl Into<String>,
        gender: Gender,
    ) -> Result<String, EditError> {
        let role = self.checked_role(target)?;
        if !role.main {
            tracing::warn!(member = %target, "rejected spouse on non-main member");
            return Err(EditError::NotMain(target.to_string()));
        }
        let id = new_member_id();
        self.insert_member(Member::new(id.clone(), name, gender));
        if let Some(member) = self.members.get_mut(target) {
            member.spouses.push(id.clone());
        }
        tracing::info!(member = %id, partner = %target, "added spouse");
        Ok(id)
    }

    /// Adds a parent to a spouse-node. The first parent starts a detached
    /// lineage as a new forest root; the second becomes the first's spouse so
    /// the two share one child set.
    pub fn add_parent(
        &mut self,
        target: &str,
        name: impl Into<String>,
        gender: Gender,
    ) -> Result<String, EditError> {
        let role = self.checked_role(target)?;
        if role.main {
            tracing::warn!(member = %target, "rejected parent on main-line member");
            return Err(EditError::IsMain(target.to_string()));
        }
        let existing = self
            .members
            .get(target)
            .map(|member| member.parents.clone())
            .unwrap_or_default();
        if existing.len() >= 2 {
            tracing::warn!(member = %target, "rejected third parent");
            return Err(EditError::ParentLimit(target.to_string()));
        }

        let id = new_member_id();
        self.insert_member(Member::new(id.clone(), name, gender));
        match existing.first() {
            Some(first) => {
                if let Some(first_parent) = self.members.get_mut(first) {
                    first_parent.spouses.push(id.clone());
                }
            }
            None => self.push_root(id.clone()),
        }
        if let Some(member) = self.members.get_mut(target) {
            member.parents.push(id.clone());
        }
        tracing::info!(member = %id, child = %target, "added parent");
        Ok(id)
    }

    pub fn rename(&mut self, target: &str, name: impl Into<String>) -> Result<(), EditError> {
        let member = self
            .members
            .get_mut(target)
            .ok_or_else(|| EditError::MemberNotFound(target.to_string()))?;
        member.name = name.into();
        Ok(())
    }

    pub fn set_gender(&mut self, target: &str, gender: Gender) -> Result<(), EditError> {
        let member = self
            .members
            .get_mut(target)
            .ok_or_else(|| EditError::MemberNotFound(target.to_string()))?;
        member.gender = gender;
        Ok(())
    }

    fn checked_role(&self, id: &str) -> Result<Role, EditError> {
        self.role(id)
            .ok_or_else(|| EditError::MemberNotFound(id.to_string()))
    }
}
