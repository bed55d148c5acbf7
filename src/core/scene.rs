//! Szenenbaum: navigierbare Node-Hierarchie als Cache über dem Element-Store.
//!
//! Die Baumform ergibt sich allein aus den `parent_index`-Werten im Store.
//! Der Baum folgt jedem angewendeten Change inkrementell und hält pro Node
//! die absolute Transformation sowie OBB/AABB vor.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{DAffine2, DVec2};

use super::change::{ElementChange, PropCategory, PropPatch};
use super::element::{Element, ElementId, ParentIndex};
use super::error::SceneError;
use super::geometry::{self, Rect};
use super::store::ElementStore;

/// Orientierte und achsen-parallele Bounding-Box eines Nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBounds {
    pub obb: [DVec2; 4],
    pub aabb: Rect,
}

/// Revisionszähler je Property-Kategorie; Renderer vergleichen sie mit
/// ihrem Cache, um nur betroffene Teile neu aufzubauen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeRevision {
    pub geometry: u64,
    pub paint: u64,
    pub stroke: u64,
    pub text: u64,
    pub meta: u64,
}

/// Baum-Spiegel eines Elements.
#[derive(Debug, Clone)]
pub struct Node {
    element: Arc<Element>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    absolute: DAffine2,
    bounds: Option<NodeBounds>,
    revision: NodeRevision,
}

impl Node {
    fn new(element: Arc<Element>) -> Self {
        let absolute = element.transform();
        Self {
            element,
            parent: None,
            children: Vec::new(),
            absolute,
            bounds: None,
            revision: NodeRevision::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.element.id
    }

    pub fn element(&self) -> &Arc<Element> {
        &self.element
    }

    /// Tatsächlich verknüpfter Parent; `None` für Roots und geparkte Waisen.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Kinder in Positionsreihenfolge.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn absolute_transform(&self) -> DAffine2 {
        self.absolute
    }

    pub fn bounds(&self) -> Option<&NodeBounds> {
        self.bounds.as_ref()
    }

    pub fn revision(&self) -> NodeRevision {
        self.revision
    }

    fn position(&self) -> &str {
        self.element.position().unwrap_or("")
    }

    fn refresh_bounds(&mut self) {
        self.bounds = self.element.kind.geometry().map(|g| {
            let obb = geometry::obb_points(g.width, g.height, &self.absolute);
            NodeBounds {
                obb,
                aabb: geometry::aabb(&obb),
            }
        });
        self.revision.geometry += 1;
    }
}

/// Verletzung einer Baum-Invariante (nur vom Debug-Validator gemeldet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `parent_index` zeigt auf ein nicht existierendes Element
    MissingParent { id: ElementId, parent: ElementId },
    /// Zwei Geschwister teilen sich eine Position
    DuplicatePosition { parent: ElementId, position: String },
    /// Kinderliste nicht aufsteigend sortiert
    UnsortedChildren { parent: ElementId },
    /// Anzahl Nodes ≠ Anzahl Elemente
    NodeCountMismatch { nodes: usize, elements: usize },
    /// Node hält eine veraltete Element-Referenz oder fehlt
    StaleNode { id: ElementId },
}

/// Node-Hierarchie eines geöffneten Dokuments.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: HashMap<ElementId, Node>,
    roots: Vec<ElementId>,
    /// Parent-ID → Kinder, deren Parent (noch) nicht existiert
    orphans: HashMap<ElementId, Vec<ElementId>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baut den Baum vollständig aus dem Store auf: erst alle Nodes,
    /// dann die `parent_index`-Kanten, dann die Geometrie von oben nach unten.
    pub fn build(store: &ElementStore) -> Self {
        let mut scene = Scene::new();
        for element in store.elements() {
            scene
                .nodes
                .insert(element.id.clone(), Node::new(Arc::clone(element)));
        }
        for element in store.elements() {
            scene.link(&element.id, element.parent_index.as_ref());
        }
        let tops: Vec<ElementId> = scene
            .nodes
            .values()
            .filter(|n| n.parent.is_none())
            .map(|n| n.element.id.clone())
            .collect();
        for id in tops {
            scene.refresh_subtree(&id);
        }
        log::debug!(
            "Szenenbaum aufgebaut: {} Nodes, {} Roots, {} Waisen",
            scene.nodes.len(),
            scene.roots.len(),
            scene.orphans.values().map(Vec::len).sum::<usize>()
        );
        scene
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Elemente ohne `parent_index` (Dokument-Roots).
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    pub fn children(&self, id: &str) -> &[ElementId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.parent())
    }

    pub fn absolute_transform(&self, id: &str) -> Option<DAffine2> {
        self.nodes.get(id).map(|n| n.absolute)
    }

    pub fn aabb(&self, id: &str) -> Option<Rect> {
        self.nodes.get(id)?.bounds.map(|b| b.aabb)
    }

    pub fn obb(&self, id: &str) -> Option<[DVec2; 4]> {
        self.nodes.get(id)?.bounds.map(|b| b.obb)
    }

    /// Gemeinsame AABB mehrerer Nodes, ohne Zwischen-Allokation.
    /// Unbekannte IDs und Nodes ohne Geometrie werden übersprungen.
    pub fn selection_bounds<'a, I>(&self, ids: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a str>,
    {
        geometry::max_aabb(ids.into_iter().filter_map(|id| self.aabb(id)))
    }

    /// Alle Nachfahren in Pre-Order (ohne `id` selbst).
    pub fn descendants(&self, id: &str) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut stack: Vec<&ElementId> = self.children(id).iter().rev().collect();
        while let Some(current) = stack.pop() {
            result.push(current.clone());
            stack.extend(self.children(current).iter().rev());
        }
        result
    }

    /// Folgt einem im Store angewendeten Change.
    ///
    /// Vor jeder Mutation wird geprüft; ein abgelehnter Change lässt den
    /// Baum unverändert, damit der Store sauber zurückrollen kann.
    pub fn on_change(
        &mut self,
        change: &ElementChange,
        store: &ElementStore,
    ) -> Result<(), SceneError> {
        match change {
            ElementChange::Props { id, props } => self.on_props(id, props, store),
            ElementChange::Add { id, .. } => self.on_add(id, store),
            ElementChange::Delete { id } => {
                self.on_delete(id);
                Ok(())
            }
            ElementChange::Move { id, parent_index } => self.on_move(id, parent_index, store),
        }
    }

    fn on_props(
        &mut self,
        id: &str,
        props: &PropPatch,
        store: &ElementStore,
    ) -> Result<(), SceneError> {
        let Some(element) = store.get_arc(id) else {
            return Ok(());
        };
        if props.touches(PropCategory::Transform) {
            check_transform(element)?;
        }
        if props.touches(PropCategory::Size) {
            check_size(element)?;
        }
        let Some(node) = self.nodes.get_mut(id) else {
            return Ok(());
        };
        node.element = Arc::clone(element);

        // Transform schließt Size ein: der Teilbaum erneuert auch die eigenen Bounds
        if props.touches(PropCategory::Transform) {
            self.refresh_subtree(id);
        } else if props.touches(PropCategory::Size) {
            node.refresh_bounds();
        }
        let Some(node) = self.nodes.get_mut(id) else {
            return Ok(());
        };
        let rev = &mut node.revision;
        for key in props.keys() {
            match key.category() {
                PropCategory::Paint => rev.paint += 1,
                PropCategory::Stroke => rev.stroke += 1,
                PropCategory::Text => rev.text += 1,
                PropCategory::Meta => rev.meta += 1,
                PropCategory::Transform | PropCategory::Size => {}
            }
        }
        Ok(())
    }

    fn on_add(&mut self, id: &str, store: &ElementStore) -> Result<(), SceneError> {
        let Some(element) = store.get_arc(id) else {
            return Ok(());
        };
        check_transform(element)?;
        check_size(element)?;
        if self.nodes.contains_key(id) {
            log::warn!("Add für bereits vorhandenen Node '{}' ignoriert", id);
            return Ok(());
        }
        // Auch über geparkte Waisen: ein Vorfahre, der auf `id` wartet, ergäbe einen Ring
        if let Some(parent) = element.parent_id() {
            if self.is_ancestor_or_self(id, parent) {
                return Err(SceneError::CyclicParent {
                    id: id.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        self.nodes
            .insert(id.to_string(), Node::new(Arc::clone(element)));
        self.link(id, element.parent_index.as_ref());

        // Wartende Kinder adoptieren
        if let Some(waiting) = self.orphans.remove(id) {
            for child in waiting {
                let parent_index = self
                    .nodes
                    .get(&child)
                    .and_then(|n| n.element.parent_index.clone());
                if parent_index.as_ref().is_some_and(|p| p.id == id) {
                    self.attach(&child, id);
                }
            }
        }
        self.refresh_subtree(id);
        Ok(())
    }

    fn on_delete(&mut self, id: &str) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        self.unlink(id, node.parent.as_deref(), node.element.parent_id());

        // Kinder bleiben bestehen, bis ihre Elemente gelöscht werden
        for child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
            }
            self.orphans.entry(id.to_string()).or_default().push(child.clone());
        }
        for child in &node.children {
            self.refresh_subtree(child);
        }
    }

    fn on_move(
        &mut self,
        id: &str,
        parent_index: &ParentIndex,
        store: &ElementStore,
    ) -> Result<(), SceneError> {
        let Some(element) = store.get_arc(id) else {
            return Ok(());
        };
        if self.is_ancestor_or_self(id, &parent_index.id) {
            return Err(SceneError::CyclicParent {
                id: id.to_string(),
                parent: parent_index.id.clone(),
            });
        }
        let Some(node) = self.nodes.get(id) else {
            return Ok(());
        };
        let linked = node.parent.clone();
        let declared = node.element.parent_id().map(str::to_string);
        self.unlink(id, linked.as_deref(), declared.as_deref());
        if let Some(node) = self.nodes.get_mut(id) {
            node.element = Arc::clone(element);
            node.parent = None;
        }
        self.link(id, Some(parent_index));
        self.refresh_subtree(id);
        Ok(())
    }

    /// `id` ist `start` selbst oder ein Vorfahre von `start`. Geparkte Waisen
    /// zählen mit ihrem deklarierten Parent.
    fn is_ancestor_or_self(&self, id: &str, start: &str) -> bool {
        let mut current = Some(start);
        let mut steps = 0usize;
        while let Some(cur) = current {
            if cur == id {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                // Baum bereits zyklisch
                return true;
            }
            current = self
                .nodes
                .get(cur)
                .and_then(|n| n.parent().or_else(|| n.element.parent_id()));
        }
        false
    }

    /// Verknüpft einen Node gemäß `parent_index`: Root, Kind oder Waise.
    /// Eine Kante, die einen Ring schließen würde, bleibt geparkt.
    fn link(&mut self, id: &str, parent_index: Option<&ParentIndex>) {
        match parent_index {
            None => self.roots.push(id.to_string()),
            Some(pi)
                if self.nodes.contains_key(&pi.id) && !self.is_ancestor_or_self(id, &pi.id) =>
            {
                self.attach(id, &pi.id)
            }
            Some(pi) => self
                .orphans
                .entry(pi.id.clone())
                .or_default()
                .push(id.to_string()),
        }
    }

    /// Entfernt einen Node aus Parent-Kinderliste, Roots oder Waisenliste.
    fn unlink(&mut self, id: &str, linked_parent: Option<&str>, declared_parent: Option<&str>) {
        if let Some(parent) = linked_parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|c| c != id);
            }
            return;
        }
        match declared_parent {
            None => self.roots.retain(|r| r != id),
            Some(parent) => {
                if let Some(waiting) = self.orphans.get_mut(parent) {
                    waiting.retain(|c| c != id);
                    if waiting.is_empty() {
                        self.orphans.remove(parent);
                    }
                }
            }
        }
    }

    /// Fügt `child` sortiert in die Kinderliste von `parent` ein.
    fn attach(&mut self, child: &str, parent: &str) {
        let Some(position) = self.nodes.get(child).map(|n| n.position().to_string()) else {
            return;
        };
        let Some(parent_node) = self.nodes.get(parent) else {
            return;
        };
        let index = insertion_index(&parent_node.children, &position, |sibling: &str| {
            self.nodes.get(sibling).map(Node::position).unwrap_or("")
        });
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.insert(index, child.to_string());
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent.to_string());
        }
    }

    /// Berechnet absolute Transformationen und Bounds des Teilbaums neu.
    /// Eltern werden immer vor ihren Kindern bearbeitet.
    fn refresh_subtree(&mut self, id: &str) {
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            let parent_absolute = self
                .nodes
                .get(&current)
                .and_then(|n| n.parent.as_ref())
                .and_then(|p| self.nodes.get(p))
                .map(|p| p.absolute);
            let Some(node) = self.nodes.get_mut(&current) else {
                continue;
            };
            node.absolute =
                geometry::compose(parent_absolute.as_ref(), &node.element.transform());
            node.refresh_bounds();
            stack.extend(node.children.iter().cloned());
        }
    }

    /// Debug-Validator für die Baum-Invarianten. Nicht im Hot-Path gedacht.
    pub fn validate(&self, store: &ElementStore) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        if self.nodes.len() != store.len() {
            violations.push(InvariantViolation::NodeCountMismatch {
                nodes: self.nodes.len(),
                elements: store.len(),
            });
        }
        for element in store.elements() {
            let fresh = self
                .nodes
                .get(&element.id)
                .is_some_and(|n| Arc::ptr_eq(&n.element, element));
            if !fresh {
                violations.push(InvariantViolation::StaleNode {
                    id: element.id.clone(),
                });
            }
            if let Some(parent) = element.parent_id() {
                if !store.has(parent) {
                    violations.push(InvariantViolation::MissingParent {
                        id: element.id.clone(),
                        parent: parent.to_string(),
                    });
                }
            }
        }
        for (id, node) in &self.nodes {
            let positions: Vec<&str> = node
                .children
                .iter()
                .filter_map(|c| self.nodes.get(c))
                .map(Node::position)
                .collect();
            for pair in positions.windows(2) {
                if pair[0] == pair[1] {
                    violations.push(InvariantViolation::DuplicatePosition {
                        parent: id.clone(),
                        position: pair[0].to_string(),
                    });
                } else if pair[0] > pair[1] {
                    violations.push(InvariantViolation::UnsortedChildren { parent: id.clone() });
                }
            }
        }
        violations
    }
}

/// Einfügeposition eines neuen Schlüssels in eine sortierte Geschwisterliste.
///
/// Leer → 0; vor dem ersten → 0; nach dem letzten → Ende; sonst der erste
/// Index, dessen Position ≥ `key` ist (binäre Suche).
pub fn insertion_index<'b, F>(siblings: &[ElementId], key: &str, position_of: F) -> usize
where
    F: Fn(&str) -> &'b str,
{
    let (Some(first), Some(last)) = (siblings.first(), siblings.last()) else {
        return 0;
    };
    if key < position_of(first.as_str()) {
        return 0;
    }
    if key > position_of(last.as_str()) {
        return siblings.len();
    }
    siblings.partition_point(|s| position_of(s.as_str()) < key)
}

fn check_transform(element: &Element) -> Result<(), SceneError> {
    match element.kind.geometry() {
        Some(g) if !geometry::is_finite(&g.transform) => Err(SceneError::NonFiniteTransform {
            id: element.id.clone(),
        }),
        _ => Ok(()),
    }
}

fn check_size(element: &Element) -> Result<(), SceneError> {
    match element.kind.geometry() {
        Some(g) if !(g.width.is_finite() && g.height.is_finite()) => {
            Err(SceneError::NonFiniteSize {
                id: element.id.clone(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests;
