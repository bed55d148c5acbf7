//! Core-Domänentypen: Elemente, Changes, Store, Change-Algebra, Szenenbaum, Geometrie.

pub mod algebra;
pub mod change;
/// Default-Datentabelle je Elementtyp
pub mod defaults;
pub mod element;
pub mod error;
pub mod fractional;
pub mod geometry;
pub mod scene;
pub mod store;

pub use algebra::{
    covers_element_change, fast_merge_transaction, harmless_element_change,
    interchangeable_element_change, merge_transaction,
};
pub use change::{ElementChange, Prop, PropCategory, PropKey, PropPatch, Transaction};
pub use element::{
    Color, Element, ElementId, ElementKind, ElementType, Geometry, Paint, ParentIndex, Stroke,
    StrokeAlign,
};
pub use error::{SceneError, TransactionError};
pub use geometry::Rect;
pub use scene::{InvariantViolation, Node, NodeBounds, NodeRevision, Scene};
pub use store::{AppliedTransaction, ChangeOutcome, ElementStore};
