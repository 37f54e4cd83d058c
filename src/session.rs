//! Interactive session over one family graph: the current selection, the
//! focus state, and the edit and layout entry points a host drives.

use crate::config::LayoutConfig;
use crate::family::{EditError, FamilyGraph, Gender};
use crate::layout::{
    Canvas, Connectors, FamilyLayout, Point, ZoomPair, build_connectors, compute_layout,
    compute_zoom_layout, hit_test, resolve_zoom_pair, zoom_members,
};
use crate::schema::PersistError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Normal,
    Zoomed(ZoomPair),
}

/// What a tap did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// The id is not in the graph; nothing changed.
    Ignored,
    Selected,
    EnteredZoom(ZoomPair),
    LeftZoom,
}

#[derive(Debug, Clone, Default)]
pub struct FamilySession {
    graph: FamilyGraph,
    config: LayoutConfig,
    selected: Option<String>,
    view: ViewState,
}

impl FamilySession {
    pub fn new(graph: FamilyGraph, config: LayoutConfig) -> Self {
        Self {
            graph,
            config,
            selected: None,
            view: ViewState::Normal,
        }
    }

    pub fn graph(&self) -> &FamilyGraph {
        &self.graph
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn zoom_pair(&self) -> Option<&ZoomPair> {
        match &self.view {
            ViewState::Zoomed(pair) => Some(pair),
            ViewState::Normal => None,
        }
    }

    /// Sets the selection without touching the focus state.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.graph.contains(id) {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    pub fn tap(&mut self, id: &str) -> TapOutcome {
        if !self.graph.contains(id) {
            tracing::debug!(member = %id, "ignored tap on unknown member");
            return TapOutcome::Ignored;
        }
        match self.view.clone() {
            ViewState::Normal => {
                self.selected = Some(id.to_string());
                match resolve_zoom_pair(&self.graph, id) {
                    Some(pair) => {
                        tracing::info!(main = %pair.main, spouse = %pair.spouse, "entered zoom view");
                        self.view = ViewState::Zoomed(pair.clone());
                        TapOutcome::EnteredZoom(pair)
                    }
                    None => TapOutcome::Selected,
                }
            }
            ViewState::Zoomed(pair) => {
                if id == pair.main {
                    tracing::info!(main = %pair.main, "left zoom view");
                    self.view = ViewState::Normal;
                    return TapOutcome::LeftZoom;
                }
                self.selected = Some(id.to_string());
                if zoom_members(&self.graph, &pair).iter().any(|m| m == id) {
                    TapOutcome::Selected
                } else {
                    tracing::info!(member = %id, "left zoom view by tapping outside it");
                    self.view = ViewState::Normal;
                    TapOutcome::LeftZoom
                }
            }
        }
    }

    /// Hit-tests `point` on the current view and taps whatever is there.
    pub fn tap_at(&mut self, point: Point, canvas: Option<Canvas>) -> TapOutcome {
        let layout = self.view_layout(canvas);
        match self.hit_test(&layout, point).map(str::to_string) {
            Some(id) => self.tap(&id),
            None => TapOutcome::Ignored,
        }
    }

    pub fn layout(&self, canvas: Option<Canvas>) -> FamilyLayout {
        compute_layout(&self.graph, &self.config, canvas)
    }

    /// The focus layout while zoomed, the whole forest otherwise.
    pub fn view_layout(&self, canvas: Option<Canvas>) -> FamilyLayout {
        match &self.view {
            ViewState::Zoomed(pair) => compute_zoom_layout(&self.graph, pair, &self.config, canvas),
            ViewState::Normal => self.layout(canvas),
        }
    }

    pub fn connectors(&self, layout: &FamilyLayout) -> Connectors {
        build_connectors(&self.graph, layout, &self.config)
    }

    pub fn hit_test<'l>(&self, layout: &'l FamilyLayout, point: Point) -> Option<&'l str> {
        hit_test(layout, point, self.config.node_radius)
    }

    pub fn add_root(&mut self, name: &str, gender: Gender) -> String {
        self.graph.add_root(name, gender)
    }

    pub fn add_child(&mut self, target: &str, name: &str, gender: Gender) -> Result<String, EditError> {
        self.graph.add_child(target, name, gender)
    }

    pub fn add_spouse(&mut self, target: &str, name: &str, gender: Gender) -> Result<String, EditError> {
        self.graph.add_spouse(target, name, gender)
    }

    pub fn add_parent(&mut self, target: &str, name: &str, gender: Gender) -> Result<String, EditError> {
        self.graph.add_parent(target, name, gender)
    }

    pub fn rename(&mut self, target: &str, name: &str) -> Result<(), EditError> {
        self.graph.rename(target, name)
    }

    pub fn set_gender(&mut self, target: &str, gender: Gender) -> Result<(), EditError> {
        self.graph.set_gender(target, gender)
    }

    /// Replaces the forest. On any decoding error the current forest, the
    /// selection and the focus state stay exactly as they were.
    pub fn load_json(&mut self, json: &str) -> Result<(), PersistError> {
        let graph = match FamilyGraph::from_json(json) {
            Ok(graph) => graph,
            Err(err) => {
                tracing::warn!(error = %err, "family load failed; keeping current forest");
                return Err(err);
            }
        };
        tracing::info!(members = graph.len(), "loaded family");
        self.graph = graph;
        self.view = ViewState::Normal;
        if self
            .selected
            .as_deref()
            .is_some_and(|id| !self.graph.contains(id))
        {
            self.selected = None;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        self.graph.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Family {
        session: FamilySession,
        root: String,
        spouse: String,
        child: String,
        mother: String,
        sibling: String,
    }

    fn family() -> Family {
        let mut session = FamilySession::new(FamilyGraph::new(), LayoutConfig::default());
        let root = session.add_root("Root", Gender::Male);
        let spouse = session.add_spouse(&root, "Wife", Gender::Female).unwrap();
        let child = session.add_child(&root, "Kid", Gender::Male).unwrap();
        let mother = session.add_parent(&spouse, "Mum", Gender::Female).unwrap();
        session.add_parent(&spouse, "Dad", Gender::Male).unwrap();
        let sibling = session.add_child(&mother, "Sib", Gender::Female).unwrap();
        Family {
            session,
            root,
            spouse,
            child,
            mother,
            sibling,
        }
    }

    #[test]
    fn tapping_main_member_only_selects() {
        let mut f = family();
        assert_eq!(f.session.tap(&f.child), TapOutcome::Selected);
        assert_eq!(f.session.selected(), Some(f.child.as_str()));
        assert_eq!(f.session.view(), &ViewState::Normal);
    }

    #[test]
    fn tapping_spouse_enters_zoom_and_main_leaves_it() {
        let mut f = family();
        let outcome = f.session.tap(&f.spouse);
        let pair = ZoomPair {
            main: f.root.clone(),
            spouse: f.spouse.clone(),
        };
        assert_eq!(outcome, TapOutcome::EnteredZoom(pair.clone()));
        assert_eq!(f.session.zoom_pair(), Some(&pair));

        assert_eq!(f.session.tap(&f.sibling), TapOutcome::Selected);
        assert_eq!(f.session.selected(), Some(f.sibling.as_str()));
        assert!(f.session.zoom_pair().is_some());

        assert_eq!(f.session.tap(&f.root), TapOutcome::LeftZoom);
        assert_eq!(f.session.view(), &ViewState::Normal);
        // leaving through the main member keeps the previous selection
        assert_eq!(f.session.selected(), Some(f.sibling.as_str()));
    }

    #[test]
    fn tapping_parents_and_sibling_spouses_stays_zoomed() {
        let mut f = family();
        let sib_husband = f.session.add_spouse(&f.sibling, "SibHusband", Gender::Male).unwrap();
        let niece = f.session.add_child(&f.sibling, "Niece", Gender::Female).unwrap();
        f.session.tap(&f.spouse);

        assert_eq!(f.session.tap(&f.mother), TapOutcome::Selected);
        assert_eq!(f.session.tap(&sib_husband), TapOutcome::Selected);
        assert!(f.session.zoom_pair().is_some());
        assert!(!f.session.view_layout(None).is_positioned(&niece));

        // the niece is not drawn in the focus view, so tapping her leaves it
        assert_eq!(f.session.tap(&niece), TapOutcome::LeftZoom);
        assert_eq!(f.session.selected(), Some(niece.as_str()));
    }

    #[test]
    fn tapping_outside_zoom_set_leaves_and_selects() {
        let mut f = family();
        f.session.tap(&f.mother);
        assert!(f.session.zoom_pair().is_some());
        assert_eq!(f.session.tap(&f.child), TapOutcome::LeftZoom);
        assert_eq!(f.session.selected(), Some(f.child.as_str()));
        assert_eq!(f.session.view(), &ViewState::Normal);
    }

    #[test]
    fn unknown_tap_is_ignored() {
        let mut f = family();
        f.session.tap(&f.child);
        assert_eq!(f.session.tap("ghost"), TapOutcome::Ignored);
        assert_eq!(f.session.selected(), Some(f.child.as_str()));
    }

    #[test]
    fn view_layout_follows_state() {
        let mut f = family();
        assert_eq!(f.session.view_layout(None).positions.len(), 6);
        f.session.tap(&f.spouse);
        let zoomed = f.session.view_layout(None);
        assert_eq!(zoomed.positions.len(), 5);
        assert!(!zoomed.is_positioned(&f.child));
    }

    #[test]
    fn tap_at_hits_topmost_member() {
        let mut f = family();
        let layout = f.session.view_layout(None);
        let at = layout.position(&f.spouse).unwrap();
        let outcome = f.session.tap_at(Point::new(at.x + 3.0, at.y - 3.0), None);
        assert!(matches!(outcome, TapOutcome::EnteredZoom(_)));
        assert_eq!(
            f.session.tap_at(Point::new(-500.0, -500.0), None),
            TapOutcome::Ignored
        );
    }

    #[test]
    fn failed_load_keeps_current_forest() {
        let mut f = family();
        f.session.tap(&f.spouse);
        let before = f.session.to_json().unwrap();
        assert!(f.session.load_json("{ \"id\": \"x\" }").is_err());
        assert_eq!(f.session.to_json().unwrap(), before);
        assert!(f.session.zoom_pair().is_some());
        assert_eq!(f.session.selected(), Some(f.spouse.as_str()));
    }

    #[test]
    fn load_resets_focus_and_drops_stale_selection() {
        let mut f = family();
        f.session.tap(&f.spouse);
        let json = r#"{ "id": "n", "name": "New", "gender": "male", "spouses": [], "children": [] }"#;
        f.session.load_json(json).unwrap();
        assert_eq!(f.session.view(), &ViewState::Normal);
        assert_eq!(f.session.selected(), None);
        assert_eq!(f.session.graph().len(), 1);
    }
}
