//! Verdichtung einer Geste (vieler Teil-Transaktionen) zu einem Undo-Eintrag.

use serde::{Deserialize, Serialize};

use crate::core::{merge_transaction, Transaction};

/// Art der Verdichtung während einer Geste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompressionMode {
    /// Nur die erste Umkehrung zählt; alle weiteren Teil-Transaktionen
    /// laufen ohne Reverse-Berechnung.
    Single,
    /// Jede Umkehrung wird in die laufende Gesamt-Umkehrung gemerged.
    Continuous,
}

/// Zustand `Idle` ↔ `Compressing` mit dem ausstehenden Undo-Eintrag.
#[derive(Debug, Clone, Default)]
pub struct StateCompressor {
    mode: Option<CompressionMode>,
    pending: Option<Transaction>,
    steps: usize,
}

impl StateCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Beginnt eine Geste. Eine laufende, nicht committete Geste wird verworfen.
    pub fn start(&mut self, mode: CompressionMode) {
        if self.is_compressing() {
            log::debug!(
                "Kompression neu gestartet, {} Teilschritte verworfen",
                self.steps
            );
        }
        self.mode = Some(mode);
        self.pending = None;
        self.steps = 0;
    }

    pub fn is_compressing(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<CompressionMode> {
        self.mode
    }

    /// Anzahl der bisher aufgenommenen Teil-Transaktionen.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn pending(&self) -> Option<&Transaction> {
        self.pending.as_ref()
    }

    /// Bei `Single` ist nach der ersten Umkehrung jede weitere überflüssig.
    pub fn ignore_reverse(&self) -> bool {
        self.mode == Some(CompressionMode::Single) && self.pending.is_some()
    }

    /// Nimmt die Umkehrung einer Teil-Transaktion auf.
    ///
    /// Die neue Umkehrung muss vor der bisherigen angewendet werden, daher
    /// ist sie die Basis des Merges.
    pub fn record(&mut self, reverse: Transaction) {
        let Some(mode) = self.mode else {
            return;
        };
        self.steps += 1;
        if reverse.is_empty() {
            return;
        }
        self.pending = match (mode, self.pending.take()) {
            (_, None) => Some(reverse),
            (CompressionMode::Single, Some(first)) => Some(first),
            (CompressionMode::Continuous, Some(pending)) => {
                Some(merge_transaction(&reverse, &pending))
            }
        };
    }

    /// Beendet die Geste und liefert den ausstehenden Undo-Eintrag.
    pub fn take(&mut self) -> Option<Transaction> {
        self.mode = None;
        self.steps = 0;
        self.pending.take()
    }

    /// Verwirft die Geste ohne History-Eintrag.
    pub fn reset(&mut self) {
        if self.pending.is_some() {
            log::debug!("Kompression verworfen ({} Teilschritte)", self.steps);
        }
        self.mode = None;
        self.pending = None;
        self.steps = 0;
    }
}
