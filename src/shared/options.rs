//! Zentrale Konfiguration der Engine.
//!
//! `EngineOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::app::history::DEFAULT_HISTORY_LIMIT;
use crate::core::store::{DEFAULT_ID_LENGTH, DEFAULT_ID_MAX_ATTEMPTS};

/// Dateiname der Optionen-Datei neben der Binary.
pub const CONFIG_FILE_NAME: &str = "vecdoc_engine.toml";
/// Umgebungsvariable, die den Pfad der Optionen-Datei überschreibt.
pub const CONFIG_ENV_VAR: &str = "VECDOC_ENGINE_CONFIG";

/// Alle zur Laufzeit änderbaren Engine-Optionen.
/// Wird als `vecdoc_engine.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    // ── History ─────────────────────────────────────────────────
    /// Maximale Tiefe von Undo- und Redo-Stack
    pub history_limit: usize,

    // ── IDs ─────────────────────────────────────────────────────
    /// Länge neu vergebener Element-IDs
    pub id_length: usize,
    /// Versuche pro Länge, bevor eine kollidierende ID länger wird
    pub id_max_attempts: usize,

    // ── Diagnose ────────────────────────────────────────────────
    /// Baum-Invarianten nach jeder Transaktion prüfen (teuer)
    #[serde(default)]
    pub validate_after_apply: bool,
    /// Jede angewendete Transaktion als JSON loggen
    #[serde(default)]
    pub log_transactions: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,

            id_length: DEFAULT_ID_LENGTH,
            id_max_attempts: DEFAULT_ID_MAX_ATTEMPTS,

            validate_after_apply: false,
            log_transactions: false,
        }
    }
}

impl EngineOptions {
    /// Liest Optionen aus `path`. Eine fehlende Datei ist kein Fehler,
    /// alles andere (unlesbar, kein gültiges TOML) schon.
    pub fn try_load(path: &Path) -> anyhow::Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Optionen nicht lesbar: {}", path.display())
                })
            }
        };
        let opts = toml::from_str(&content)
            .with_context(|| format!("Optionen-Datei fehlerhaft: {}", path.display()))?;
        Ok(Some(opts))
    }

    /// Wie [`Self::try_load`], fällt aber bei jedem Problem auf die
    /// Standardwerte zurück.
    pub fn load_from_file(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(opts)) => {
                log::info!("Optionen geladen aus: {}", path.display());
                opts
            }
            Ok(None) => {
                log::info!("Keine Optionen-Datei unter {}, Standardwerte", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("{:#}, verwende Standardwerte", e);
                Self::default()
            }
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self).context("Optionen nicht serialisierbar")?;
        std::fs::write(path, content)
            .with_context(|| format!("Optionen nicht schreibbar: {}", path.display()))?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Pfad der Optionen-Datei: `VECDOC_ENGINE_CONFIG`, sonst neben der Binary.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        exe_dir.unwrap_or_else(|| PathBuf::from(".")).join(CONFIG_FILE_NAME)
    }
}
