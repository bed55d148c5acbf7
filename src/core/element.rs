//! Element-Datenmodell: gemeinsame Felder plus geschlossene Typ-Union.
//!
//! Ein Element ist per Konvention unveränderlich; Änderungen laufen
//! ausschließlich über `ElementChange` im Element-Store.

use glam::DAffine2;
use serde::{Deserialize, Serialize};

use super::change::{Prop, PropKey};

/// Globale, eindeutige Element-ID.
pub type ElementId = String;

/// RGBA-Farbe (0.0–1.0 pro Kanal).
pub type Color = [f32; 4];

/// Parent-Referenz plus fraktionaler Sortierschlüssel unter Geschwistern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentIndex {
    /// ID des Parent-Elements
    pub id: ElementId,
    /// Lexikographisch vergleichbarer Positionsschlüssel
    pub position: String,
}

impl ParentIndex {
    pub fn new(id: impl Into<ElementId>, position: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: position.into(),
        }
    }
}

/// Einfarbige Füllung bzw. Kontur-Farbe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub color: Color,
    pub opacity: f64,
    pub visible: bool,
}

/// Ausrichtung der Kontur relativ zur Form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrokeAlign {
    #[default]
    Center,
    Inside,
    Outside,
}

/// Kontur einer Form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f64,
    pub align: StrokeAlign,
}

/// Transformations- und Größenblock geometrischer Elemente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Relative Transformation zum Parent (6 Skalare)
    pub transform: DAffine2,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub background: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameData {
    pub geometry: Geometry,
    pub fills: Vec<Paint>,
    pub strokes: Vec<Stroke>,
    pub corner_radius: [f64; 4],
    pub clip_content: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupData {
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleData {
    pub geometry: Geometry,
    pub fills: Vec<Paint>,
    pub strokes: Vec<Stroke>,
    pub corner_radius: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EllipseData {
    pub geometry: Geometry,
    pub fills: Vec<Paint>,
    pub strokes: Vec<Stroke>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub geometry: Geometry,
    pub content: String,
    pub font_size: f64,
    pub fills: Vec<Paint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub geometry: Geometry,
    /// Referenz auf die Bildquelle (Asset-Key oder URL)
    pub source: String,
}

/// Typ-Diskriminante ohne Daten, z.B. für `create_element`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    Document,
    Page,
    Frame,
    Group,
    Rectangle,
    Ellipse,
    Text,
    Image,
}

/// Typabhängige Daten eines Elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    Document,
    Page(PageData),
    Frame(FrameData),
    Group(GroupData),
    Rectangle(RectangleData),
    Ellipse(EllipseData),
    Text(TextData),
    Image(ImageData),
}

impl ElementKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Document => ElementType::Document,
            ElementKind::Page(_) => ElementType::Page,
            ElementKind::Frame(_) => ElementType::Frame,
            ElementKind::Group(_) => ElementType::Group,
            ElementKind::Rectangle(_) => ElementType::Rectangle,
            ElementKind::Ellipse(_) => ElementType::Ellipse,
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Image(_) => ElementType::Image,
        }
    }

    /// Geometrie-Block, falls der Typ einen besitzt (nicht Document/Page).
    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            ElementKind::Document | ElementKind::Page(_) => None,
            ElementKind::Frame(d) => Some(&d.geometry),
            ElementKind::Group(d) => Some(&d.geometry),
            ElementKind::Rectangle(d) => Some(&d.geometry),
            ElementKind::Ellipse(d) => Some(&d.geometry),
            ElementKind::Text(d) => Some(&d.geometry),
            ElementKind::Image(d) => Some(&d.geometry),
        }
    }

    fn geometry_mut(&mut self) -> Option<&mut Geometry> {
        match self {
            ElementKind::Document | ElementKind::Page(_) => None,
            ElementKind::Frame(d) => Some(&mut d.geometry),
            ElementKind::Group(d) => Some(&mut d.geometry),
            ElementKind::Rectangle(d) => Some(&mut d.geometry),
            ElementKind::Ellipse(d) => Some(&mut d.geometry),
            ElementKind::Text(d) => Some(&mut d.geometry),
            ElementKind::Image(d) => Some(&mut d.geometry),
        }
    }

    pub fn fills(&self) -> Option<&Vec<Paint>> {
        match self {
            ElementKind::Frame(d) => Some(&d.fills),
            ElementKind::Rectangle(d) => Some(&d.fills),
            ElementKind::Ellipse(d) => Some(&d.fills),
            ElementKind::Text(d) => Some(&d.fills),
            _ => None,
        }
    }

    fn fills_mut(&mut self) -> Option<&mut Vec<Paint>> {
        match self {
            ElementKind::Frame(d) => Some(&mut d.fills),
            ElementKind::Rectangle(d) => Some(&mut d.fills),
            ElementKind::Ellipse(d) => Some(&mut d.fills),
            ElementKind::Text(d) => Some(&mut d.fills),
            _ => None,
        }
    }

    pub fn strokes(&self) -> Option<&Vec<Stroke>> {
        match self {
            ElementKind::Frame(d) => Some(&d.strokes),
            ElementKind::Rectangle(d) => Some(&d.strokes),
            ElementKind::Ellipse(d) => Some(&d.strokes),
            _ => None,
        }
    }

    fn strokes_mut(&mut self) -> Option<&mut Vec<Stroke>> {
        match self {
            ElementKind::Frame(d) => Some(&mut d.strokes),
            ElementKind::Rectangle(d) => Some(&mut d.strokes),
            ElementKind::Ellipse(d) => Some(&mut d.strokes),
            _ => None,
        }
    }

    fn corner_radius_mut(&mut self) -> Option<&mut [f64; 4]> {
        match self {
            ElementKind::Frame(d) => Some(&mut d.corner_radius),
            ElementKind::Rectangle(d) => Some(&mut d.corner_radius),
            _ => None,
        }
    }

    fn corner_radius(&self) -> Option<[f64; 4]> {
        match self {
            ElementKind::Frame(d) => Some(d.corner_radius),
            ElementKind::Rectangle(d) => Some(d.corner_radius),
            _ => None,
        }
    }
}

fn default_visible() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

/// Ein Element des Dokuments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    /// Fehlt bei Root-/Dokument-Elementen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_index: Option<ParentIndex>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Erstellt ein Element mit Standardwerten für die gemeinsamen Felder.
    pub fn new(id: impl Into<ElementId>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            parent_index: None,
            name: String::new(),
            visible: true,
            locked: false,
            opacity: 1.0,
            kind,
        }
    }

    pub fn with_parent(mut self, parent_index: ParentIndex) -> Self {
        self.parent_index = Some(parent_index);
        self
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_index.as_ref().map(|p| p.id.as_str())
    }

    pub fn position(&self) -> Option<&str> {
        self.parent_index.as_ref().map(|p| p.position.as_str())
    }

    /// Relative Transformation; Identität für Typen ohne Geometrie.
    pub fn transform(&self) -> DAffine2 {
        self.kind
            .geometry()
            .map(|g| g.transform)
            .unwrap_or(DAffine2::IDENTITY)
    }

    /// Liest den aktuellen Wert einer Property.
    /// `None`, wenn der Elementtyp diese Property nicht trägt.
    pub fn prop(&self, key: PropKey) -> Option<Prop> {
        let kind = &self.kind;
        match key {
            PropKey::Name => Some(Prop::Name(self.name.clone())),
            PropKey::Visible => Some(Prop::Visible(self.visible)),
            PropKey::Locked => Some(Prop::Locked(self.locked)),
            PropKey::Opacity => Some(Prop::Opacity(self.opacity)),
            PropKey::Transform => kind.geometry().map(|g| Prop::Transform(g.transform)),
            PropKey::Width => kind.geometry().map(|g| Prop::Width(g.width)),
            PropKey::Height => kind.geometry().map(|g| Prop::Height(g.height)),
            PropKey::Fills => kind.fills().map(|f| Prop::Fills(f.clone())),
            PropKey::Strokes => kind.strokes().map(|s| Prop::Strokes(s.clone())),
            PropKey::CornerRadius => kind.corner_radius().map(Prop::CornerRadius),
            PropKey::ClipContent => match kind {
                ElementKind::Frame(d) => Some(Prop::ClipContent(d.clip_content)),
                _ => None,
            },
            PropKey::Content => match kind {
                ElementKind::Text(d) => Some(Prop::Content(d.content.clone())),
                _ => None,
            },
            PropKey::FontSize => match kind {
                ElementKind::Text(d) => Some(Prop::FontSize(d.font_size)),
                _ => None,
            },
            PropKey::Source => match kind {
                ElementKind::Image(d) => Some(Prop::Source(d.source.clone())),
                _ => None,
            },
            PropKey::Background => match kind {
                ElementKind::Page(d) => Some(Prop::Background(d.background)),
                _ => None,
            },
        }
    }

    /// Schreibt eine Property. Gibt `false` zurück, wenn der Typ sie nicht trägt.
    pub fn set_prop(&mut self, prop: Prop) -> bool {
        let kind = &mut self.kind;
        match prop {
            Prop::Name(v) => self.name = v,
            Prop::Visible(v) => self.visible = v,
            Prop::Locked(v) => self.locked = v,
            Prop::Opacity(v) => self.opacity = v,
            Prop::Transform(v) => match kind.geometry_mut() {
                Some(g) => g.transform = v,
                None => return false,
            },
            Prop::Width(v) => match kind.geometry_mut() {
                Some(g) => g.width = v,
                None => return false,
            },
            Prop::Height(v) => match kind.geometry_mut() {
                Some(g) => g.height = v,
                None => return false,
            },
            Prop::Fills(v) => match kind.fills_mut() {
                Some(f) => *f = v,
                None => return false,
            },
            Prop::Strokes(v) => match kind.strokes_mut() {
                Some(s) => *s = v,
                None => return false,
            },
            Prop::CornerRadius(v) => match kind.corner_radius_mut() {
                Some(r) => *r = v,
                None => return false,
            },
            Prop::ClipContent(v) => match kind {
                ElementKind::Frame(d) => d.clip_content = v,
                _ => return false,
            },
            Prop::Content(v) => match kind {
                ElementKind::Text(d) => d.content = v,
                _ => return false,
            },
            Prop::FontSize(v) => match kind {
                ElementKind::Text(d) => d.font_size = v,
                _ => return false,
            },
            Prop::Source(v) => match kind {
                ElementKind::Image(d) => d.source = v,
                _ => return false,
            },
            Prop::Background(v) => match kind {
                ElementKind::Page(d) => d.background = v,
                _ => return false,
            },
        }
        true
    }
}
