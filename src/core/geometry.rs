//! Geometrie-Kernel: affine Matrizen, OBB/AABB und Rotation um Pivot.
//!
//! Reine Funktionen ohne Zustand. Alle Berechnungen laufen in `f64`,
//! Rundung (z.B. zwei Nachkommastellen in der Anzeige) ist Sache des Callers.

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

/// Achsen-paralleles Rechteck in absoluten Koordinaten.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// Erstellt ein Rechteck aus Ursprung und Ausdehnung.
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Erstellt ein Rechteck aus Min-/Max-Ecke.
    pub fn from_min_max(min: DVec2, max: DVec2) -> Self {
        Self {
            x: min.x,
            y: min.y,
            w: max.x - min.x,
            h: max.y - min.y,
        }
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x + self.w, self.y + self.h)
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Kleinstes Rechteck, das beide Rechtecke umschließt.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    /// Punkt liegt im Rechteck (Ränder inklusive).
    pub fn contains_point(&self, point: DVec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Überlappung zweier Rechtecke (Berührung an der Kante zählt).
    pub fn intersects(&self, other: &Rect) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x <= b_max.x && b_min.x <= a_max.x && a_min.y <= b_max.y && b_min.y <= a_max.y
    }
}

/// Absolute Transformation eines Nodes aus der absoluten Matrix des Parents
/// und der eigenen relativen Matrix. Ohne Parent gilt absolute = relative.
pub fn compose(parent_absolute: Option<&DAffine2>, local_relative: &DAffine2) -> DAffine2 {
    match parent_absolute {
        Some(parent) => *parent * *local_relative,
        None => *local_relative,
    }
}

/// Ecken des lokalen Rechtecks `(0,0),(w,0),(w,h),(0,h)` nach Transformation.
pub fn obb_points(width: f64, height: f64, matrix: &DAffine2) -> [DVec2; 4] {
    [
        matrix.transform_point2(DVec2::ZERO),
        matrix.transform_point2(DVec2::new(width, 0.0)),
        matrix.transform_point2(DVec2::new(width, height)),
        matrix.transform_point2(DVec2::new(0.0, height)),
    ]
}

/// AABB über eine beliebige Punktmenge (ein Durchlauf, Min/Max-Reduktion).
/// Eine leere Menge ergibt das Null-Rechteck.
pub fn aabb(points: &[DVec2]) -> Rect {
    let Some((first, rest)) = points.split_first() else {
        return Rect::default();
    };
    let (min, max) = rest
        .iter()
        .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
    Rect::from_min_max(min, max)
}

/// Rotation der Matrix in Grad: `atan2(b, a)`, normiert auf `(-180, 180]`.
/// Setzt eine scherungsfreie Matrix voraus.
pub fn rotation_degrees(matrix: &DAffine2) -> f64 {
    let x_axis = matrix.matrix2.x_axis;
    let degrees = x_axis.y.atan2(x_axis.x).to_degrees();
    if degrees <= -180.0 {
        degrees + 360.0
    } else {
        degrees
    }
}

/// Dreht eine Matrix um einen Pivot im Koordinatensystem des Parents:
/// zum Ursprung verschieben, rotieren, zurückverschieben.
pub fn rotate_around(matrix: &DAffine2, degrees: f64, pivot: DVec2) -> DAffine2 {
    DAffine2::from_translation(pivot)
        * DAffine2::from_angle(degrees.to_radians())
        * DAffine2::from_translation(-pivot)
        * *matrix
}

/// Vereinigung mehrerer AABBs (Min der Minima, Max der Maxima) in O(n).
///
/// Nimmt einen Iterator entgegen, damit Hot-Paths (Multi-Select-Drag bei jedem
/// Pointer-Move) ohne Heap-Allokation auskommen.
pub fn max_aabb<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    let mut iter = rects.into_iter();
    let first = iter.next()?;
    let (min, max) = iter.fold((first.min(), first.max()), |(min, max), r| {
        (min.min(r.min()), max.max(r.max()))
    });
    Some(Rect::from_min_max(min, max))
}

/// Translationsanteil der Matrix.
pub fn translation(matrix: &DAffine2) -> DVec2 {
    matrix.translation
}

/// Baut eine Matrix aus Position und Rotation in Grad (ohne Skalierung).
pub fn from_translation_rotation(position: DVec2, degrees: f64) -> DAffine2 {
    DAffine2::from_angle_translation(degrees.to_radians(), position)
}

/// Alle sechs Matrix-Komponenten sind endlich (kein NaN/∞).
pub fn is_finite(matrix: &DAffine2) -> bool {
    matrix.to_cols_array().iter().all(|v| v.is_finite())
}
