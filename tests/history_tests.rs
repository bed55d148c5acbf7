//! Integrationstests für Undo/Redo und Gesten-Kompression über `DataSync`:
//! - Rechteck-Szenario (Größenänderung, AABB, Undo)
//! - Continuous- und Single-Kompression
//! - Redo, History-Grenze, Folger

use approx::assert_relative_eq;
use glam::{DAffine2, DVec2};
use std::cell::RefCell;
use std::rc::Rc;
use vecdoc_engine::core::defaults;
use vecdoc_engine::{
    CompressionMode, DataSync, ElementChange, ElementType, EngineOptions, ParentIndex, Prop,
    PropKey, PropPatch, Rect,
};

/// Dokument → Page → Rechteck `5` (100×100, Identität).
fn sync_with_rect() -> DataSync {
    let mut sync = DataSync::new(EngineOptions {
        validate_after_apply: true,
        ..EngineOptions::default()
    });
    sync.load_elements([
        defaults::build(ElementType::Document, "doc"),
        defaults::build(ElementType::Page, "page").with_parent(ParentIndex::new("doc", "V")),
        defaults::build(ElementType::Rectangle, "5").with_parent(ParentIndex::new("page", "V")),
    ]);
    sync
}

fn move_x(x: f64) -> ElementChange {
    ElementChange::props(
        "5",
        PropPatch::new().with(Prop::Transform(DAffine2::from_translation(DVec2::new(x, 0.0)))),
    )
}

fn translation_x(sync: &DataSync) -> f64 {
    match sync.store().get("5").and_then(|e| e.prop(PropKey::Transform)) {
        Some(Prop::Transform(m)) => m.translation.x,
        other => panic!("Transform erwartet, war {:?}", other),
    }
}

// ─── Szenario ────────────────────────────────────────────────────────────────

#[test]
fn test_rechteck_breite_aendern_und_undo() {
    let mut sync = sync_with_rect();

    sync.transact_local(&[ElementChange::props(
        "5",
        PropPatch::new().with(Prop::Width(50.0)),
    )])
    .expect("Props gültig");

    assert_eq!(sync.scene().aabb("5"), Some(Rect::new(0.0, 0.0, 50.0, 100.0)));

    let applied = sync.undo().expect("Undo vorhanden");
    assert_eq!(applied.len(), 1);
    assert_eq!(
        sync.store().get("5").and_then(|e| e.prop(PropKey::Width)),
        Some(Prop::Width(100.0))
    );
    assert_eq!(sync.scene().aabb("5"), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
}

// ─── Kompression ─────────────────────────────────────────────────────────────

#[test]
fn test_continuous_kompression_undo_in_einem_schritt() {
    let mut sync = sync_with_rect();

    sync.start_compression(CompressionMode::Continuous);
    for x in [1.0, 2.0, 3.0] {
        sync.transact_local(&[move_x(x)]).expect("Schritt gültig");
    }
    sync.commit_history();

    assert_eq!(sync.history().undo_len(), 1);
    assert_relative_eq!(translation_x(&sync), 3.0);

    sync.undo().expect("Undo vorhanden");
    assert_relative_eq!(translation_x(&sync), 0.0);
    assert!(!sync.can_undo());
    assert_eq!(sync.scene().aabb("5").map(|r| r.x), Some(0.0));
}

#[test]
fn test_single_kompression_behaelt_erste_umkehrung() {
    let mut sync = sync_with_rect();

    sync.start_compression(CompressionMode::Single);
    for x in [5.0, 6.0, 7.0, 8.0] {
        sync.transact_local(&[move_x(x)]).expect("Schritt gültig");
    }
    sync.commit_history();

    assert_eq!(sync.history().undo_len(), 1);
    sync.undo().expect("Undo vorhanden");
    assert_relative_eq!(translation_x(&sync), 0.0);
}

#[test]
fn test_continuous_mit_mehreren_elementen() {
    let mut sync = sync_with_rect();
    let other = sync
        .insert_element(ElementType::Ellipse, PropPatch::new(), "page")
        .expect("Einfügen");
    let undo_before = sync.history().undo_len();

    sync.start_compression(CompressionMode::Continuous);
    sync.transact_local(&[move_x(10.0)]).expect("Schritt 1");
    sync.transact_local(&[
        move_x(20.0),
        ElementChange::props(&other, PropPatch::new().with(Prop::Width(5.0))),
    ])
    .expect("Schritt 2");
    sync.transact_local(&[ElementChange::props(
        &other,
        PropPatch::new().with(Prop::Name("Kreis".into())),
    )])
    .expect("Schritt 3");
    sync.commit_history();

    assert_eq!(sync.history().undo_len(), undo_before + 1);
    sync.undo().expect("Undo vorhanden");

    let ellipse = sync.store().get(&other).expect("Ellipse existiert");
    assert_eq!(ellipse.prop(PropKey::Width), Some(Prop::Width(100.0)));
    assert_eq!(ellipse.name, "Ellipse");
    assert_relative_eq!(translation_x(&sync), 0.0);
}

#[test]
fn test_reset_compression_verwirft_geste_ohne_eintrag() {
    let mut sync = sync_with_rect();

    sync.start_compression(CompressionMode::Continuous);
    sync.transact_local(&[move_x(4.0)]).expect("Schritt");
    sync.reset_compression();
    sync.commit_history();

    // Änderung bleibt, ist aber nicht rückgängig machbar
    assert_relative_eq!(translation_x(&sync), 4.0);
    assert!(!sync.can_undo());
}

// ─── Redo / Grenzen ──────────────────────────────────────────────────────────

#[test]
fn test_redo_stellt_rueckgaengig_gemachten_zustand_her() {
    let mut sync = sync_with_rect();
    sync.transact_local(&[move_x(3.0)]).expect("gültig");
    sync.transact_local(&[ElementChange::delete("5")]).expect("gültig");

    sync.undo().expect("Undo Delete");
    sync.undo().expect("Undo Move");
    assert_relative_eq!(translation_x(&sync), 0.0);
    assert!(sync.can_redo());

    sync.redo().expect("Redo Move");
    assert_relative_eq!(translation_x(&sync), 3.0);
    let applied = sync.redo().expect("Redo Delete");
    assert_eq!(applied, vec![ElementChange::delete("5")]);
    assert!(!sync.store().has("5"));
    assert!(!sync.scene().contains("5"));
    assert!(sync.redo().is_none());
}

#[test]
fn test_neue_aktion_verwirft_redo() {
    let mut sync = sync_with_rect();
    sync.transact_local(&[move_x(1.0)]).expect("gültig");
    sync.undo().expect("Undo");
    assert!(sync.can_redo());

    sync.transact_local(&[move_x(2.0)]).expect("gültig");
    assert!(!sync.can_redo());
}

#[test]
fn test_history_grenze_aus_optionen() {
    let mut sync = DataSync::new(EngineOptions {
        history_limit: 3,
        ..EngineOptions::default()
    });
    sync.load_elements([
        defaults::build(ElementType::Document, "doc"),
        defaults::build(ElementType::Rectangle, "5").with_parent(ParentIndex::new("doc", "V")),
    ]);

    for x in 1..=5 {
        sync.transact_local(&[move_x(x as f64)]).expect("gültig");
    }

    let mut undos = 0;
    while sync.undo().is_some() {
        undos += 1;
    }
    assert_eq!(undos, 3);
    assert_relative_eq!(translation_x(&sync), 2.0);
}

// ─── Folger ──────────────────────────────────────────────────────────────────

#[test]
fn test_folger_erhalten_undo_und_redo_changes() {
    let mut sync = sync_with_rect();
    let seen: Rc<RefCell<Vec<ElementChange>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    sync.subscribe(move |c| sink.borrow_mut().push(c.clone()));

    sync.transact_local(&[move_x(9.0)]).expect("gültig");
    let undone = sync.undo().expect("Undo");

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], move_x(9.0));
    assert_eq!(seen[1..], undone[..]);
}

#[test]
fn test_fehlgeschlagene_transaktion_aendert_nichts() {
    let mut sync = sync_with_rect();
    let before = sync.to_document();

    let result = sync.transact_local(&[
        move_x(1.0),
        ElementChange::move_to("page", ParentIndex::new("5", "V")),
        ElementChange::props(
            "5",
            PropPatch::new().with(Prop::Transform(DAffine2::from_translation(DVec2::new(
                f64::NAN,
                0.0,
            )))),
        ),
    ]);

    assert!(result.is_err());
    assert_eq!(sync.to_document(), before);
    assert!(!sync.can_undo());
    assert!(sync.scene().validate(sync.store()).is_empty());
}
