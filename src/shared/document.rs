//! Persistierte Form eines Dokuments: flache Elementliste.
//!
//! Die Baumstruktur steckt allein in den `parentIndex`-Werten.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::Element;

/// Aktuelle Formatversion.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub elements: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Document {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            elements,
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let document: Document =
            serde_json::from_str(json).context("Dokument-JSON nicht lesbar")?;
        if document.version > DOCUMENT_VERSION {
            log::warn!(
                "Dokumentversion {} ist neuer als unterstützt ({})",
                document.version,
                DOCUMENT_VERSION
            );
        }
        Ok(document)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Lädt ein Dokument aus einer JSON-Datei.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Dokument nicht lesbar: {}", path.display()))?;
        let document = Self::from_json(&content)?;
        log::info!(
            "Dokument geladen: {} ({} Elemente)",
            path.display(),
            document.elements.len()
        );
        Ok(document)
    }

    /// Speichert das Dokument als JSON-Datei.
    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Dokument nicht schreibbar: {}", path.display()))?;
        log::info!("Dokument gespeichert nach: {}", path.display());
        Ok(())
    }
}
