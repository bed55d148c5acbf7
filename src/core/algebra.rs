//! Change-Algebra: Prädikate und Merge-Regeln für die History-Kompression.
//!
//! Wird ausschließlich zum Verdichten von Undo-Einträgen genutzt, nie für
//! die eigentliche Anwendung von Changes.

use std::collections::HashMap;

use super::change::{ElementChange, Transaction};

/// `more` nach `base` angewendet macht `base` überflüssig.
///
/// - `Props` + `Props` gleicher ID, wenn `more` alle Schlüssel von `base` setzt
/// - `Delete` + `Delete` gleicher ID
/// - `Props` + `Delete` gleicher ID
/// - `Move` + `Move` gleicher ID
pub fn covers_element_change(base: &ElementChange, more: &ElementChange) -> bool {
    if base.id() != more.id() {
        return false;
    }
    match (base, more) {
        (
            ElementChange::Props { props: base_props, .. },
            ElementChange::Props { props: more_props, .. },
        ) => more_props.covers_keys_of(base_props),
        (ElementChange::Delete { .. }, ElementChange::Delete { .. }) => true,
        (ElementChange::Props { .. }, ElementChange::Delete { .. }) => true,
        (ElementChange::Move { .. }, ElementChange::Move { .. }) => true,
        _ => false,
    }
}

/// Berührt keinen identitätsbestimmenden Schlüssel.
///
/// Der Typ eines Elements ist keine Property und kann über `Props` nicht
/// geändert werden; damit ist jeder `Props`-Change harmlos.
pub fn harmless_element_change(change: &ElementChange) -> bool {
    matches!(change, ElementChange::Props { .. })
}

/// Zwei Changes dürfen ohne Ergebnisänderung vertauscht werden:
/// beide harmlos und entweder verschiedene IDs oder disjunkte Schlüssel.
pub fn interchangeable_element_change(a: &ElementChange, b: &ElementChange) -> bool {
    if !harmless_element_change(a) || !harmless_element_change(b) {
        return false;
    }
    if a.id() != b.id() {
        return true;
    }
    match (a, b) {
        (ElementChange::Props { props: pa, .. }, ElementChange::Props { props: pb, .. }) => {
            pa.is_disjoint(pb)
        }
        _ => false,
    }
}

/// Schnellpfad: gleiche Länge und jeder `more[i]` überdeckt `base[i]`.
/// Typisch für Drag-Gesten, die pro Frame dieselben Properties setzen.
pub fn fast_merge_transaction(base: &[ElementChange], more: &[ElementChange]) -> Option<Transaction> {
    if base.len() != more.len() || base.is_empty() {
        return None;
    }
    base.iter()
        .zip(more)
        .all(|(b, m)| covers_element_change(b, m))
        .then(|| more.to_vec())
}

/// Transaktion äquivalent zu `base` gefolgt von `more`, ohne die Einträge
/// von `base`, die `more` vollständig überdeckt.
///
/// Ein überdeckter Eintrag wird nur verworfen, wenn alle späteren Einträge
/// von `base` mit derselben ID mit ihm vertauschbar sind.
pub fn merge_transaction(base: &[ElementChange], more: &[ElementChange]) -> Transaction {
    if base.is_empty() {
        return more.to_vec();
    }
    if more.is_empty() {
        return base.to_vec();
    }
    if let Some(merged) = fast_merge_transaction(base, more) {
        return merged;
    }

    let mut more_by_id: HashMap<&str, Vec<&ElementChange>> = HashMap::new();
    for change in more {
        more_by_id.entry(change.id()).or_default().push(change);
    }

    let mut merged = Vec::with_capacity(base.len() + more.len());
    for (index, change) in base.iter().enumerate() {
        let covered = more_by_id
            .get(change.id())
            .is_some_and(|later| later.iter().any(|m| covers_element_change(change, m)));
        let reorder_safe = base[index + 1..]
            .iter()
            .filter(|later| later.id() == change.id())
            .all(|later| interchangeable_element_change(change, later));
        if !(covered && reorder_safe) {
            merged.push(change.clone());
        }
    }
    merged.extend(more.iter().cloned());
    merged
}
