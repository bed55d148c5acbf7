//! Default-Daten-Tabelle: kanonische Startwerte je Elementtyp.
//!
//! Jeder Typ wird Feld für Feld aus benannten Blöcken (Transform, Größe,
//! Füllung, Kontur) zusammengesetzt. Erstellungs-Tools legen ihre Overrides
//! immer über diese Defaults, nie über selbst gebaute Records.

use glam::DAffine2;

use super::element::{
    Color, Element, ElementKind, ElementType, EllipseData, FrameData, Geometry, GroupData,
    ImageData, PageData, Paint, RectangleData, Stroke, StrokeAlign, TextData,
};

/// Standardbreite/-höhe neuer Formen.
pub const DEFAULT_SIZE: f64 = 100.0;
/// Standardfüllung (RGBA: Grau).
pub const DEFAULT_FILL_COLOR: Color = [0.85, 0.85, 0.85, 1.0];
/// Standard-Konturfarbe (RGBA: Schwarz).
pub const DEFAULT_STROKE_COLOR: Color = [0.0, 0.0, 0.0, 1.0];
/// Standard-Seitenhintergrund (RGBA: Hellgrau).
pub const DEFAULT_PAGE_BACKGROUND: Color = [0.96, 0.96, 0.96, 1.0];
/// Standard-Textfarbe (RGBA: Schwarz).
pub const DEFAULT_TEXT_COLOR: Color = [0.0, 0.0, 0.0, 1.0];
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

// ── Blöcke ──────────────────────────────────────────────────────────

/// Identitäts-Transform mit Standardgröße.
pub fn geometry_block() -> Geometry {
    sized_geometry_block(DEFAULT_SIZE, DEFAULT_SIZE)
}

pub fn sized_geometry_block(width: f64, height: f64) -> Geometry {
    Geometry {
        transform: DAffine2::IDENTITY,
        width,
        height,
    }
}

pub fn solid_paint(color: Color) -> Paint {
    Paint {
        color,
        opacity: 1.0,
        visible: true,
    }
}

/// Eine einzelne graue Vollfüllung.
pub fn fill_block() -> Vec<Paint> {
    vec![solid_paint(DEFAULT_FILL_COLOR)]
}

/// Formen starten ohne Kontur.
pub fn stroke_block() -> Vec<Stroke> {
    Vec::new()
}

/// Kontur, wie sie ein "Kontur hinzufügen"-Tool einfügt.
pub fn default_stroke() -> Stroke {
    Stroke {
        paint: solid_paint(DEFAULT_STROKE_COLOR),
        width: DEFAULT_STROKE_WIDTH,
        align: StrokeAlign::Center,
    }
}

pub fn radius_block() -> [f64; 4] {
    [0.0; 4]
}

// ── Builder je Typ ──────────────────────────────────────────────────

pub fn document() -> ElementKind {
    ElementKind::Document
}

pub fn page() -> ElementKind {
    ElementKind::Page(PageData {
        background: DEFAULT_PAGE_BACKGROUND,
    })
}

pub fn frame() -> ElementKind {
    ElementKind::Frame(FrameData {
        geometry: geometry_block(),
        fills: vec![solid_paint([1.0, 1.0, 1.0, 1.0])],
        strokes: stroke_block(),
        corner_radius: radius_block(),
        clip_content: true,
    })
}

pub fn group() -> ElementKind {
    ElementKind::Group(GroupData {
        geometry: sized_geometry_block(0.0, 0.0),
    })
}

pub fn rectangle() -> ElementKind {
    ElementKind::Rectangle(RectangleData {
        geometry: geometry_block(),
        fills: fill_block(),
        strokes: stroke_block(),
        corner_radius: radius_block(),
    })
}

pub fn ellipse() -> ElementKind {
    ElementKind::Ellipse(EllipseData {
        geometry: geometry_block(),
        fills: fill_block(),
        strokes: stroke_block(),
    })
}

pub fn text() -> ElementKind {
    ElementKind::Text(TextData {
        geometry: sized_geometry_block(DEFAULT_SIZE, DEFAULT_FONT_SIZE * 1.2),
        content: String::new(),
        font_size: DEFAULT_FONT_SIZE,
        fills: vec![solid_paint(DEFAULT_TEXT_COLOR)],
    })
}

pub fn image() -> ElementKind {
    ElementKind::Image(ImageData {
        geometry: geometry_block(),
        source: String::new(),
    })
}

/// Typ-Daten mit Standardwerten.
pub fn kind_for(element_type: ElementType) -> ElementKind {
    match element_type {
        ElementType::Document => document(),
        ElementType::Page => page(),
        ElementType::Frame => frame(),
        ElementType::Group => group(),
        ElementType::Rectangle => rectangle(),
        ElementType::Ellipse => ellipse(),
        ElementType::Text => text(),
        ElementType::Image => image(),
    }
}

/// Vollständiges Element mit Standardwerten und vorgegebener ID.
pub fn build(element_type: ElementType, id: impl Into<String>) -> Element {
    let mut element = Element::new(id, kind_for(element_type));
    element.name = default_name(element_type).to_string();
    element
}

fn default_name(element_type: ElementType) -> &'static str {
    match element_type {
        ElementType::Document => "Document",
        ElementType::Page => "Page",
        ElementType::Frame => "Frame",
        ElementType::Group => "Group",
        ElementType::Rectangle => "Rectangle",
        ElementType::Ellipse => "Ellipse",
        ElementType::Text => "Text",
        ElementType::Image => "Image",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_defaults() {
        let el = build(ElementType::Rectangle, "r");
        let ElementKind::Rectangle(data) = &el.kind else {
            panic!("Rechteck erwartet");
        };
        assert_eq!(data.geometry.width, 100.0);
        assert_eq!(data.geometry.height, 100.0);
        assert_eq!(data.geometry.transform, DAffine2::IDENTITY);
        assert_eq!(data.fills.len(), 1);
        assert_eq!(data.fills[0].color, DEFAULT_FILL_COLOR);
        assert_eq!(data.corner_radius, [0.0; 4]);
        assert!(data.strokes.is_empty());
    }

    #[test]
    fn test_every_type_builds_matching_kind() {
        for ty in [
            ElementType::Document,
            ElementType::Page,
            ElementType::Frame,
            ElementType::Group,
            ElementType::Rectangle,
            ElementType::Ellipse,
            ElementType::Text,
            ElementType::Image,
        ] {
            let el = build(ty, "x");
            assert_eq!(el.element_type(), ty);
            assert!(el.parent_index.is_none());
            assert!(el.visible);
        }
    }
}
