//! Vecdoc Engine Library.
//! Transaktionale Szenengraph-Engine eines Vektorgrafik-Editors, als Library
//! exportiert für Tests und Wiederverwendung.

pub mod app;
pub mod core;
pub mod shared;

pub use app::{ActionHistory, CompressionMode, DataSync, FollowerId, StateCompressor};
pub use core::{
    Element, ElementChange, ElementId, ElementKind, ElementStore, ElementType, ParentIndex, Prop,
    PropKey, PropPatch, Rect, Scene, SceneError, Transaction, TransactionError,
};
pub use shared::{Document, EngineOptions};
