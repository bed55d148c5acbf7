//! DataSync: hält Store, Szenenbaum und History eines geöffneten Dokuments
//! synchron und verteilt angewendete Changes an registrierte Folger.

use crate::core::fractional;
use crate::core::{
    AppliedTransaction, Element, ElementChange, ElementId, ElementStore, ElementType,
    ParentIndex, PropPatch, Scene, Transaction, TransactionError,
};
use crate::shared::{Document, EngineOptions};

use super::compressor::{CompressionMode, StateCompressor};
use super::history::ActionHistory;

/// Handle eines registrierten Change-Folgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FollowerId(u64);

type Follower = Box<dyn FnMut(&ElementChange)>;
type SaveHook = Box<dyn FnMut()>;

/// Orchestrierung eines Dokuments: Store + Szene + History + Folger.
///
/// Alle Mutationen laufen über `&mut self`; ein Folger kann daher während
/// einer Transaktion nicht erneut mutieren. Folger erhalten die Changes erst,
/// nachdem die Transaktion vollständig angewendet oder zurückgerollt wurde.
pub struct DataSync {
    store: ElementStore,
    scene: Scene,
    history: ActionHistory,
    compressor: StateCompressor,
    followers: Vec<(FollowerId, Follower)>,
    next_follower: u64,
    save_pending: Option<SaveHook>,
    options: EngineOptions,
}

impl Default for DataSync {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl DataSync {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            store: ElementStore::with_id_policy(options.id_length, options.id_max_attempts),
            scene: Scene::new(),
            history: ActionHistory::new_with_capacity(options.history_limit),
            compressor: StateCompressor::new(),
            followers: Vec::new(),
            next_follower: 0,
            save_pending: None,
            options,
        }
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_compressing(&self) -> bool {
        self.compressor.is_compressing()
    }

    // ── Folger ──────────────────────────────────────────────────

    /// Registriert einen Folger, der jeden angewendeten Change in Reihenfolge erhält.
    pub fn subscribe<F>(&mut self, follower: F) -> FollowerId
    where
        F: FnMut(&ElementChange) + 'static,
    {
        let id = FollowerId(self.next_follower);
        self.next_follower += 1;
        self.followers.push((id, Box::new(follower)));
        id
    }

    /// Entfernt einen Folger. `false`, wenn die ID unbekannt war.
    pub fn unsubscribe(&mut self, id: FollowerId) -> bool {
        let before = self.followers.len();
        self.followers.retain(|(fid, _)| *fid != id);
        before != self.followers.len()
    }

    /// Hook, der nach jeder erfolgreichen Mutation aufgerufen wird.
    pub fn on_save_pending<F>(&mut self, hook: F)
    where
        F: FnMut() + 'static,
    {
        self.save_pending = Some(Box::new(hook));
    }

    // ── Laden / Speichern ───────────────────────────────────────

    /// Ersetzt den Dokumentinhalt. Entspricht einer Folge von `Add`s ohne
    /// Reverse; History und laufende Kompression werden verworfen.
    ///
    /// Jedes Element durchläuft dieselben Prüfungen wie ein lokales `Add`.
    /// Abgelehnte Elemente (nicht endliche Geometrie, Parent-Ring) werden
    /// mit Warnung übersprungen. Liefert die Anzahl geladener Elemente.
    pub fn load_document(&mut self, document: &Document) -> usize {
        self.load_elements(document.elements.iter().cloned())
    }

    pub fn load_elements<I>(&mut self, elements: I) -> usize
    where
        I: IntoIterator<Item = Element>,
    {
        self.store.clear();
        self.scene = Scene::new();
        self.history.clear();
        self.compressor.reset();

        let mut applied: Transaction = Vec::new();
        let mut skipped = 0usize;
        for element in elements {
            let add = [ElementChange::add(element)];
            let scene = &mut self.scene;
            match self
                .store
                .apply_transaction(&add, true, |change, store| scene.on_change(change, store))
            {
                Ok(done) => applied.extend(done.applied),
                Err(e) => {
                    log::warn!("Element beim Laden übersprungen: {}", e);
                    skipped += 1;
                }
            }
        }
        log::info!(
            "Dokument geladen: {} Elemente, {} Nodes, {} übersprungen",
            self.store.len(),
            self.scene.len(),
            skipped
        );
        self.validate();
        self.dispatch(&applied);
        applied.len()
    }

    /// Persistierbare Form des aktuellen Stands (Store-Reihenfolge).
    pub fn to_document(&self) -> Document {
        Document::new(self.store.elements().map(|e| e.as_ref().clone()).collect())
    }

    // ── Transaktionen ───────────────────────────────────────────

    /// Wendet eine Transaktion an, ohne die History zu berühren.
    pub fn apply_transaction(
        &mut self,
        transaction: &[ElementChange],
        ignore_reverse: bool,
    ) -> Result<AppliedTransaction, TransactionError> {
        let scene = &mut self.scene;
        let result =
            self.store
                .apply_transaction(transaction, ignore_reverse, |change, store| {
                    scene.on_change(change, store)
                });
        let done = match result {
            Ok(done) => done,
            Err(e) => {
                log::warn!("Transaktion verworfen: {}", e);
                let TransactionError::Rejected {
                    follower_in_sync, ..
                } = &e;
                if !follower_in_sync {
                    log::warn!("Szenenbaum nach Rollback neu aufgebaut");
                    self.scene = Scene::build(&self.store);
                }
                return Err(e);
            }
        };

        log::debug!(
            "Transaktion angewendet: {} von {} Changes, Version {}",
            done.applied.len(),
            transaction.len(),
            self.store.version()
        );
        if self.options.log_transactions {
            match serde_json::to_string(&done.applied) {
                Ok(json) => log::info!("Transaktion: {}", json),
                Err(e) => log::warn!("Transaktion nicht serialisierbar: {}", e),
            }
        }
        self.validate();
        self.dispatch(&done.applied);
        Ok(done)
    }

    /// Lokale Benutzeraktion: anwenden und in History bzw. laufende
    /// Kompression aufnehmen. Liefert die angewendeten Changes.
    pub fn transact_local(
        &mut self,
        transaction: &[ElementChange],
    ) -> Result<Transaction, TransactionError> {
        let ignore_reverse = self.compressor.ignore_reverse();
        let done = self.apply_transaction(transaction, ignore_reverse)?;
        if self.compressor.is_compressing() {
            self.compressor.record(done.reverse);
        } else {
            self.history.record(done.reverse);
        }
        Ok(done.applied)
    }

    /// Beginnt eine Geste; alle folgenden `transact_local` bilden einen Undo-Eintrag.
    pub fn start_compression(&mut self, mode: CompressionMode) {
        log::debug!("Kompression gestartet: {:?}", mode);
        self.compressor.start(mode);
    }

    /// Schließt die Geste ab und legt ihren Undo-Eintrag auf den Stack.
    pub fn commit_history(&mut self) {
        let steps = self.compressor.steps();
        if let Some(entry) = self.compressor.take() {
            log::debug!(
                "Geste committet: {} Teilschritte → {} Umkehr-Changes",
                steps,
                entry.len()
            );
            self.history.record(entry);
        }
    }

    /// Verwirft die laufende Geste ohne History-Eintrag. Bereits angewendete
    /// Changes bleiben im Dokument.
    pub fn reset_compression(&mut self) {
        self.compressor.reset();
    }

    /// Macht den letzten Undo-Eintrag rückgängig und liefert die dabei
    /// angewendeten Changes.
    pub fn undo(&mut self) -> Option<Transaction> {
        self.compressor.reset();
        let Some(entry) = self.history.pop_undo() else {
            log::debug!("Undo: nichts zu tun");
            return None;
        };
        match self.apply_transaction(&entry, false) {
            Ok(done) => {
                self.history.push_redo(done.reverse);
                log::info!("Undo ausgeführt ({} Changes)", done.applied.len());
                Some(done.applied)
            }
            Err(e) => {
                log::warn!("Undo fehlgeschlagen, Eintrag bleibt erhalten: {}", e);
                self.history.push_undo(entry);
                None
            }
        }
    }

    /// Stellt den zuletzt rückgängig gemachten Eintrag wieder her.
    pub fn redo(&mut self) -> Option<Transaction> {
        self.compressor.reset();
        let Some(entry) = self.history.pop_redo() else {
            log::debug!("Redo: nichts zu tun");
            return None;
        };
        match self.apply_transaction(&entry, false) {
            Ok(done) => {
                self.history.push_undo(done.reverse);
                log::info!("Redo ausgeführt ({} Changes)", done.applied.len());
                Some(done.applied)
            }
            Err(e) => {
                log::warn!("Redo fehlgeschlagen, Eintrag bleibt erhalten: {}", e);
                self.history.push_redo(entry);
                None
            }
        }
    }

    // ── Erzeugung ───────────────────────────────────────────────

    /// Element mit Typ-Defaults, Overrides und frischer ID (nicht eingefügt).
    pub fn create_element(
        &self,
        element_type: ElementType,
        overrides: PropPatch,
        parent_index: Option<ParentIndex>,
    ) -> Element {
        self.store
            .create_element(element_type, overrides, parent_index)
    }

    /// Hängt `element` als letztes Kind an `parent_id` an (eigene Transaktion).
    pub fn append_child(
        &mut self,
        parent_id: &str,
        mut element: Element,
    ) -> Result<ElementId, TransactionError> {
        let position = fractional::key_between(self.last_child_position(parent_id), None);
        element.parent_index = Some(ParentIndex::new(parent_id, position));
        let id = element.id.clone();
        self.transact_local(&[ElementChange::add(element)])?;
        Ok(id)
    }

    /// Erzeugt ein Element mit Defaults und hängt es an `parent_id` an.
    pub fn insert_element(
        &mut self,
        element_type: ElementType,
        overrides: PropPatch,
        parent_id: &str,
    ) -> Result<ElementId, TransactionError> {
        let element = self.create_element(element_type, overrides, None);
        self.append_child(parent_id, element)
    }

    fn last_child_position(&self, parent_id: &str) -> Option<&str> {
        self.scene
            .children(parent_id)
            .last()
            .and_then(|id| self.store.get(id))
            .and_then(Element::position)
    }

    // ── intern ──────────────────────────────────────────────────

    /// Verteilt die Changes einer abgeschlossenen Transaktion.
    fn dispatch(&mut self, applied: &[ElementChange]) {
        if applied.is_empty() {
            return;
        }
        for (_, follower) in &mut self.followers {
            for change in applied {
                follower(change);
            }
        }
        if let Some(hook) = self.save_pending.as_mut() {
            hook();
        }
    }

    fn validate(&self) {
        if !self.options.validate_after_apply {
            return;
        }
        for violation in self.scene.validate(&self.store) {
            log::warn!("Baum-Invariante verletzt: {:?}", violation);
        }
    }
}
