use crate::core::Transaction;

/// Standard-Obergrenze für Undo- und Redo-Stack.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Begrenzte Undo/Redo-Stacks aus Umkehr-Transaktionen.
///
/// Jeder Eintrag ist eine Transaktion, die angewendet den vorherigen Zustand
/// wiederherstellt. Beim Anwenden entsteht eine frische Umkehrung, die der
/// Aufrufer auf den jeweils anderen Stack legt.
#[derive(Debug, Clone)]
pub struct ActionHistory {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    max_depth: usize,
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new_with_capacity(DEFAULT_HISTORY_LIMIT)
    }
}

impl ActionHistory {
    /// Erstellt eine History mit maximaler Tiefe (mindestens 1).
    pub fn new_with_capacity(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(64)),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Neuer Undo-Eintrag aus einer Benutzeraktion. Leert den Redo-Stack.
    /// Leere Transaktionen werden nicht aufgenommen.
    pub fn record(&mut self, entry: Transaction) {
        if entry.is_empty() {
            return;
        }
        push_bounded(&mut self.undo_stack, entry, self.max_depth);
        self.redo_stack.clear();
    }

    /// Legt einen Eintrag auf den Undo-Stack, ohne Redo zu verwerfen (nach Redo).
    pub fn push_undo(&mut self, entry: Transaction) {
        if !entry.is_empty() {
            push_bounded(&mut self.undo_stack, entry, self.max_depth);
        }
    }

    /// Legt einen Eintrag auf den Redo-Stack (nach Undo).
    pub fn push_redo(&mut self, entry: Transaction) {
        if !entry.is_empty() {
            push_bounded(&mut self.redo_stack, entry, self.max_depth);
        }
    }

    pub fn pop_undo(&mut self) -> Option<Transaction> {
        self.undo_stack.pop()
    }

    pub fn pop_redo(&mut self) -> Option<Transaction> {
        self.redo_stack.pop()
    }

    /// Prüft ob Undo möglich ist.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Prüft ob Redo möglich ist.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Ältesten Eintrag verwerfen, sobald die Tiefe erreicht ist.
fn push_bounded(stack: &mut Vec<Transaction>, entry: Transaction, max_depth: usize) {
    if stack.len() >= max_depth {
        stack.remove(0);
    }
    stack.push(entry);
}
