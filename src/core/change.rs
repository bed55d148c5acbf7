//! Strukturierte Änderungen: `ElementChange`, Property-Patches und Transaktionen.

use glam::DAffine2;
use serde::{Deserialize, Serialize};

use super::element::{Color, Element, ElementId, Paint, ParentIndex, Stroke};

/// Ein einzelner Property-Wert mit Schlüssel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Prop {
    Name(String),
    Visible(bool),
    Locked(bool),
    Opacity(f64),
    Transform(DAffine2),
    Width(f64),
    Height(f64),
    Fills(Vec<Paint>),
    Strokes(Vec<Stroke>),
    CornerRadius([f64; 4]),
    ClipContent(bool),
    Content(String),
    FontSize(f64),
    Source(String),
    Background(Color),
}

/// Schlüssel einer Property (Diskriminante von [`Prop`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropKey {
    Name,
    Visible,
    Locked,
    Opacity,
    Transform,
    Width,
    Height,
    Fills,
    Strokes,
    CornerRadius,
    ClipContent,
    Content,
    FontSize,
    Source,
    Background,
}

/// Kategorie einer Property; steuert, welche Caches der Szenenbaum
/// nach einer Änderung neu berechnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropCategory {
    /// Absolute Transformationen des ganzen Teilbaums
    Transform,
    /// Nur OBB/AABB des Nodes selbst
    Size,
    Paint,
    Stroke,
    Text,
    /// Name, Sichtbarkeit, Sperre
    Meta,
}

impl PropKey {
    pub fn category(self) -> PropCategory {
        match self {
            PropKey::Transform => PropCategory::Transform,
            PropKey::Width | PropKey::Height => PropCategory::Size,
            PropKey::Fills | PropKey::Opacity | PropKey::Background | PropKey::Source => {
                PropCategory::Paint
            }
            PropKey::Strokes | PropKey::CornerRadius => PropCategory::Stroke,
            PropKey::Content | PropKey::FontSize => PropCategory::Text,
            PropKey::Name | PropKey::Visible | PropKey::Locked | PropKey::ClipContent => {
                PropCategory::Meta
            }
        }
    }
}

impl Prop {
    pub fn key(&self) -> PropKey {
        match self {
            Prop::Name(_) => PropKey::Name,
            Prop::Visible(_) => PropKey::Visible,
            Prop::Locked(_) => PropKey::Locked,
            Prop::Opacity(_) => PropKey::Opacity,
            Prop::Transform(_) => PropKey::Transform,
            Prop::Width(_) => PropKey::Width,
            Prop::Height(_) => PropKey::Height,
            Prop::Fills(_) => PropKey::Fills,
            Prop::Strokes(_) => PropKey::Strokes,
            Prop::CornerRadius(_) => PropKey::CornerRadius,
            Prop::ClipContent(_) => PropKey::ClipContent,
            Prop::Content(_) => PropKey::Content,
            Prop::FontSize(_) => PropKey::FontSize,
            Prop::Source(_) => PropKey::Source,
            Prop::Background(_) => PropKey::Background,
        }
    }
}

/// Teilmenge von Properties, die ein `Props`-Change ersetzt.
/// Jeder Schlüssel kommt höchstens einmal vor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropPatch(Vec<Prop>);

impl PropPatch {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builder-Variante von [`PropPatch::set`].
    pub fn with(mut self, prop: Prop) -> Self {
        self.set(prop);
        self
    }

    /// Setzt eine Property; ein vorhandener Wert mit gleichem Schlüssel wird ersetzt.
    pub fn set(&mut self, prop: Prop) {
        let key = prop.key();
        match self.0.iter_mut().find(|p| p.key() == key) {
            Some(slot) => *slot = prop,
            None => self.0.push(prop),
        }
    }

    pub fn get(&self, key: PropKey) -> Option<&Prop> {
        self.0.iter().find(|p| p.key() == key)
    }

    pub fn contains_key(&self, key: PropKey) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = PropKey> + '_ {
        self.0.iter().map(Prop::key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prop> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Jeder Schlüssel von `other` ist auch hier gesetzt.
    pub fn covers_keys_of(&self, other: &PropPatch) -> bool {
        other.keys().all(|k| self.contains_key(k))
    }

    /// Kein gemeinsamer Schlüssel.
    pub fn is_disjoint(&self, other: &PropPatch) -> bool {
        other.keys().all(|k| !self.contains_key(k))
    }

    /// Berührt der Patch eine Property dieser Kategorie?
    pub fn touches(&self, category: PropCategory) -> bool {
        self.keys().any(|k| k.category() == category)
    }
}

impl FromIterator<Prop> for PropPatch {
    fn from_iter<T: IntoIterator<Item = Prop>>(iter: T) -> Self {
        let mut patch = PropPatch::new();
        for prop in iter {
            patch.set(prop);
        }
        patch
    }
}

impl IntoIterator for PropPatch {
    type Item = Prop;
    type IntoIter = std::vec::IntoIter<Prop>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Eine strukturierte Mutation genau eines Elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ElementChange {
    /// Ersetzt eine Teilmenge der Properties
    Props { id: ElementId, props: PropPatch },
    /// Fügt ein neues, vollständiges Element ein
    Add { id: ElementId, data: Box<Element> },
    /// Entfernt ein Element
    Delete { id: ElementId },
    /// Hängt ein Element um bzw. sortiert es neu
    #[serde(rename_all = "camelCase")]
    Move {
        id: ElementId,
        parent_index: ParentIndex,
    },
}

impl ElementChange {
    pub fn props(id: impl Into<ElementId>, props: PropPatch) -> Self {
        ElementChange::Props {
            id: id.into(),
            props,
        }
    }

    pub fn add(element: Element) -> Self {
        ElementChange::Add {
            id: element.id.clone(),
            data: Box::new(element),
        }
    }

    pub fn delete(id: impl Into<ElementId>) -> Self {
        ElementChange::Delete { id: id.into() }
    }

    pub fn move_to(id: impl Into<ElementId>, parent_index: ParentIndex) -> Self {
        ElementChange::Move {
            id: id.into(),
            parent_index,
        }
    }

    /// ID des betroffenen Elements.
    pub fn id(&self) -> &str {
        match self {
            ElementChange::Props { id, .. }
            | ElementChange::Add { id, .. }
            | ElementChange::Delete { id }
            | ElementChange::Move { id, .. } => id,
        }
    }

    /// Kurzname für Log-Ausgaben.
    pub fn op_name(&self) -> &'static str {
        match self {
            ElementChange::Props { .. } => "props",
            ElementChange::Add { .. } => "add",
            ElementChange::Delete { .. } => "delete",
            ElementChange::Move { .. } => "move",
        }
    }
}

/// Geordnete Folge von Changes, die atomar angewendet wird.
pub type Transaction = Vec<ElementChange>;
