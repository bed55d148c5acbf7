//! Element-Store: flache Map ID → Element mit umkehrbaren Changes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use rand::distr::Alphanumeric;
use rand::Rng;

use super::change::{ElementChange, PropPatch, Transaction};
use super::defaults;
use super::element::{Element, ElementId, ElementType, ParentIndex};
use super::error::{SceneError, TransactionError};

/// Standardlänge neu vergebener IDs.
pub const DEFAULT_ID_LENGTH: usize = 10;
/// Versuche pro ID-Länge, bevor die Länge wächst.
pub const DEFAULT_ID_MAX_ATTEMPTS: usize = 32;

/// Ergebnis eines einzelnen Changes. Beide Seiten leer = No-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeOutcome {
    /// Tatsächlich angewendeter (normalisierter) Change
    pub applied: Option<ElementChange>,
    /// Change, der `applied` rückgängig macht
    pub reverse: Option<ElementChange>,
}

impl ChangeOutcome {
    pub fn is_empty(&self) -> bool {
        self.applied.is_none()
    }

    fn new(applied: ElementChange, reverse: ElementChange, ignore_reverse: bool) -> Self {
        Self {
            applied: Some(applied),
            reverse: (!ignore_reverse).then_some(reverse),
        }
    }
}

/// Ergebnis einer erfolgreich angewendeten Transaktion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedTransaction {
    /// Angewendete Changes in Anwendungsreihenfolge (No-ops entfallen)
    pub applied: Transaction,
    /// Umkehr-Transaktion: Reverse von Change k steht vor dem von k-1
    pub reverse: Transaction,
}

/// Flacher Element-Store eines geöffneten Dokuments.
#[derive(Debug, Clone)]
pub struct ElementStore {
    elements: IndexMap<ElementId, Arc<Element>>,
    /// Letzter Map-Index gelöschter Elemente; ein erneutes Add derselben ID
    /// landet wieder dort, damit Undo die Dokument-Reihenfolge erhält.
    removed_slots: HashMap<ElementId, usize>,
    version: u64,
    id_length: usize,
    id_max_attempts: usize,
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementStore {
    pub fn new() -> Self {
        Self::with_id_policy(DEFAULT_ID_LENGTH, DEFAULT_ID_MAX_ATTEMPTS)
    }

    /// Store mit eigener ID-Länge und Versuchszahl für `create_id`.
    pub fn with_id_policy(id_length: usize, id_max_attempts: usize) -> Self {
        Self {
            elements: IndexMap::new(),
            removed_slots: HashMap::new(),
            version: 0,
            id_length: id_length.max(1),
            id_max_attempts: id_max_attempts.max(1),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id).map(|e| e.as_ref())
    }

    /// Geteilte Referenz, wie sie die Nodes des Szenenbaums halten.
    pub fn get_arc(&self, id: &str) -> Option<&Arc<Element>> {
        self.elements.get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Epoch-Zähler: steigt mit jedem angewendeten Change einer Transaktion.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn elements(&self) -> impl Iterator<Item = &Arc<Element>> {
        self.elements.values()
    }

    /// Direkte Kinder eines Elements, sortiert nach Position. O(n).
    pub fn children_of(&self, id: &str) -> Vec<&Element> {
        let mut children: Vec<&Element> = self
            .elements
            .values()
            .filter(|e| e.parent_id() == Some(id))
            .map(|e| e.as_ref())
            .collect();
        children.sort_by(|a, b| a.position().cmp(&b.position()));
        children
    }

    /// Leert den Store (Dokument schließen / neu laden).
    pub fn clear(&mut self) {
        self.elements.clear();
        self.removed_slots.clear();
        self.version += 1;
    }

    /// Wendet einen einzelnen Change an.
    ///
    /// Fehlende IDs (Ziel oder Move-Parent) führen zu einem leeren Ergebnis,
    /// niemals zu einem Fehler, ebenso ein Element, das sich selbst als
    /// Parent nennt. Mit `ignore_reverse` bleibt `reverse` leer.
    pub fn apply_change(&mut self, change: &ElementChange, ignore_reverse: bool) -> ChangeOutcome {
        match change {
            ElementChange::Props { id, props } => self.apply_props(id, props, ignore_reverse),
            ElementChange::Add { id, data } => {
                if self.elements.contains_key(id) || data.parent_id() == Some(id.as_str()) {
                    return ChangeOutcome::default();
                }
                let mut element = (**data).clone();
                element.id = id.clone();
                let applied = ElementChange::Add {
                    id: id.clone(),
                    data: Box::new(element.clone()),
                };
                let element = Arc::new(element);
                match self.removed_slots.remove(id) {
                    Some(slot) if slot < self.elements.len() => {
                        self.elements.shift_insert(slot, id.clone(), element);
                    }
                    _ => {
                        self.elements.insert(id.clone(), element);
                    }
                }
                ChangeOutcome::new(applied, ElementChange::delete(id.clone()), ignore_reverse)
            }
            ElementChange::Delete { id } => {
                let Some((slot, _, removed)) = self.elements.shift_remove_full(id) else {
                    return ChangeOutcome::default();
                };
                self.removed_slots.insert(id.clone(), slot);
                let reverse = ElementChange::Add {
                    id: id.clone(),
                    data: Box::new(Arc::unwrap_or_clone(removed)),
                };
                ChangeOutcome::new(ElementChange::delete(id.clone()), reverse, ignore_reverse)
            }
            ElementChange::Move { id, parent_index } => {
                self.apply_move(id, parent_index, ignore_reverse)
            }
        }
    }

    fn apply_props(&mut self, id: &str, props: &PropPatch, ignore_reverse: bool) -> ChangeOutcome {
        if props.is_empty() {
            return ChangeOutcome::default();
        }
        let Some(current) = self.elements.get_mut(id) else {
            return ChangeOutcome::default();
        };

        let mut updated = (**current).clone();
        let mut applied = PropPatch::new();
        let mut reverse = PropPatch::new();
        for prop in props.iter() {
            // Alte Werte nur für genau die geänderten Schlüssel
            let Some(old) = updated.prop(prop.key()) else {
                continue;
            };
            updated.set_prop(prop.clone());
            applied.set(prop.clone());
            reverse.set(old);
        }
        if applied.is_empty() {
            return ChangeOutcome::default();
        }

        *current = Arc::new(updated);
        ChangeOutcome::new(
            ElementChange::props(id, applied),
            ElementChange::props(id, reverse),
            ignore_reverse,
        )
    }

    fn apply_move(
        &mut self,
        id: &str,
        parent_index: &ParentIndex,
        ignore_reverse: bool,
    ) -> ChangeOutcome {
        if parent_index.id == id || !self.elements.contains_key(&parent_index.id) {
            return ChangeOutcome::default();
        }
        let Some(current) = self.elements.get_mut(id) else {
            return ChangeOutcome::default();
        };
        // Root-Elemente haben keinen Parent, den ein Reverse wiederherstellen könnte
        let Some(old) = current.parent_index.clone() else {
            return ChangeOutcome::default();
        };

        let mut updated = (**current).clone();
        updated.parent_index = Some(parent_index.clone());
        *current = Arc::new(updated);
        ChangeOutcome::new(
            ElementChange::move_to(id, parent_index.clone()),
            ElementChange::move_to(id, old),
            ignore_reverse,
        )
    }

    /// Wendet eine Transaktion atomar an.
    ///
    /// `follower` wird nach jedem angewendeten Change aufgerufen. Lehnt er
    /// einen Change ab, werden alle bisherigen Changes in umgekehrter
    /// Reihenfolge zurückgenommen und der Fehler gemeldet. Lehnt der Folger
    /// auch einen Rollback-Change ab, läuft der Rollback im Store trotzdem
    /// vollständig durch; `follower_in_sync` im Fehler ist dann `false` und
    /// der Aufrufer muss den Folger neu aus dem Store aufbauen.
    ///
    /// Reverses werden für den Rollback immer berechnet; `ignore_reverse`
    /// leert nur das zurückgegebene `reverse`.
    pub fn apply_transaction<F>(
        &mut self,
        transaction: &[ElementChange],
        ignore_reverse: bool,
        mut follower: F,
    ) -> Result<AppliedTransaction, TransactionError>
    where
        F: FnMut(&ElementChange, &ElementStore) -> Result<(), SceneError>,
    {
        let mut applied = Vec::with_capacity(transaction.len());
        let mut reverses = Vec::with_capacity(transaction.len());

        for (index, change) in transaction.iter().enumerate() {
            let outcome = self.apply_change(change, false);
            let (Some(done), Some(reverse)) = (outcome.applied, outcome.reverse) else {
                log::trace!("No-op: {} '{}'", change.op_name(), change.id());
                continue;
            };
            reverses.push(reverse);

            if let Err(source) = follower(&done, &*self) {
                log::warn!(
                    "Change #{} ({} '{}') abgelehnt: {}, Rollback von {} Changes",
                    index,
                    change.op_name(),
                    change.id(),
                    source,
                    reverses.len()
                );
                let follower_in_sync = self.rollback(&reverses, &mut follower);
                return Err(TransactionError::Rejected {
                    index,
                    op: change.op_name(),
                    id: change.id().to_string(),
                    source,
                    follower_in_sync,
                });
            }
            self.version += 1;
            applied.push(done);
        }

        reverses.reverse();
        Ok(AppliedTransaction {
            applied,
            reverse: if ignore_reverse { Vec::new() } else { reverses },
        })
    }

    /// Nimmt `reverses` rückwärts zurück. `false`, sobald der Folger einen
    /// Rollback-Change abgelehnt hat.
    fn rollback<F>(&mut self, reverses: &[ElementChange], follower: &mut F) -> bool
    where
        F: FnMut(&ElementChange, &ElementStore) -> Result<(), SceneError>,
    {
        let mut in_sync = true;
        for reverse in reverses.iter().rev() {
            let outcome = self.apply_change(reverse, true);
            let Some(done) = outcome.applied else {
                continue;
            };
            self.version += 1;
            if let Err(e) = follower(&done, &*self) {
                log::error!("Rollback: Folger lehnt {} '{}' ab: {}", done.op_name(), done.id(), e);
                in_sync = false;
            }
        }
        in_sync
    }

    /// Neue ID, die weder im Store noch in `exclude` vorkommt.
    ///
    /// `exclude` nimmt IDs auf, die bereits vergeben, aber noch nicht
    /// eingefügt sind (mehrere `create_element` vor einer Transaktion).
    pub fn create_id(&self, exclude: Option<&HashSet<ElementId>>) -> ElementId {
        create_id(self.id_length, self.id_max_attempts, |id| {
            self.has(id) || exclude.is_some_and(|taken| taken.contains(id))
        })
    }

    /// Element mit Typ-Defaults, Caller-Overrides und frischer ID.
    /// Overrides, die der Typ nicht trägt, werden ignoriert.
    pub fn create_element(
        &self,
        element_type: ElementType,
        overrides: PropPatch,
        parent_index: Option<ParentIndex>,
    ) -> Element {
        let mut element = defaults::build(element_type, self.create_id(None));
        element.parent_index = parent_index;
        for prop in overrides {
            let key = prop.key();
            if !element.set_prop(prop) {
                log::debug!("Override {:?} passt nicht zu {:?}, ignoriert", key, element_type);
            }
        }
        element
    }
}

/// Kurze Zufalls-ID (alphanumerisch).
///
/// Bei Kollision mit `is_taken` wird neu gewürfelt; nach `max_attempts`
/// Fehlversuchen wächst die Länge um ein Zeichen.
pub fn create_id<F>(length: usize, max_attempts: usize, is_taken: F) -> ElementId
where
    F: Fn(&str) -> bool,
{
    let mut rng = rand::rng();
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0usize;
    loop {
        let len = length.max(1) + attempt / max_attempts;
        let id: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        if !is_taken(&id) {
            return id;
        }
        attempt += 1;
    }
}
