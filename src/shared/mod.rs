//! Geteilte Typen für layer-übergreifende Verträge.
//!
//! Konfiguration und persistierte Dokumentform, die von `app` und der
//! Binary gleichermaßen genutzt werden.

pub mod document;
pub mod options;

pub use document::{Document, DOCUMENT_VERSION};
pub use options::EngineOptions;
