//! Fehlertypen der Engine.
//!
//! Referenzielle Fehler (fehlende IDs) sind keine Fehler, sondern No-ops.
//! Hier stehen nur die transaktionalen Fehler, die zum Rollback führen.

use thiserror::Error;

use super::element::ElementId;

/// Der Szenenbaum lehnt einen bereits im Store angewendeten Change ab.
/// Der Baum bleibt dabei unverändert.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("Transform von '{id}' ist nicht endlich")]
    NonFiniteTransform { id: ElementId },
    #[error("Größe von '{id}' ist nicht endlich")]
    NonFiniteSize { id: ElementId },
    #[error("'{id}' unter '{parent}' würde einen Zyklus erzeugen")]
    CyclicParent { id: ElementId, parent: ElementId },
}

/// Eine Transaktion wurde vollständig zurückgerollt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransactionError {
    #[error("Change #{index} ({op} '{id}') abgelehnt, Transaktion zurückgerollt: {source}")]
    Rejected {
        index: usize,
        op: &'static str,
        id: ElementId,
        #[source]
        source: SceneError,
        /// `false`, wenn der Folger auch beim Rollback einen Change abgelehnt
        /// hat und nicht mehr zum Store passt
        follower_in_sync: bool,
    },
}
