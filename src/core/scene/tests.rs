use super::*;
use crate::core::change::{Prop, PropPatch};
use crate::core::defaults;
use crate::core::element::ElementType;
use approx::assert_relative_eq;

/// Wendet eine Transaktion auf Store und Szene an.
fn apply(store: &mut ElementStore, scene: &mut Scene, tx: &[ElementChange]) {
    store
        .apply_transaction(tx, false, |c, s| scene.on_change(c, s))
        .expect("Transaktion muss gelingen");
}

fn rect(id: &str, parent: &str, position: &str) -> Element {
    defaults::build(ElementType::Rectangle, id).with_parent(ParentIndex::new(parent, position))
}

fn group_at(id: &str, parent: &str, position: &str, transform: DAffine2) -> Element {
    let mut el =
        defaults::build(ElementType::Group, id).with_parent(ParentIndex::new(parent, position));
    el.set_prop(Prop::Transform(transform));
    el
}

fn base_store() -> ElementStore {
    let mut store = ElementStore::new();
    store.apply_change(
        &ElementChange::add(defaults::build(ElementType::Document, "doc")),
        true,
    );
    store.apply_change(
        &ElementChange::add(
            defaults::build(ElementType::Page, "page").with_parent(ParentIndex::new("doc", "V")),
        ),
        true,
    );
    store
}

#[test]
fn test_build_links_children_in_position_order() {
    let mut store = base_store();
    // Kinder vor dem Parent einfügen: Aufbau darf nicht von der Reihenfolge abhängen
    for (id, pos) in [("c", "c"), ("a", "a"), ("b", "b")] {
        store.apply_change(&ElementChange::add(rect(id, "frame", pos)), true);
    }
    store.apply_change(
        &ElementChange::add(
            defaults::build(ElementType::Frame, "frame").with_parent(ParentIndex::new("page", "V")),
        ),
        true,
    );

    let scene = Scene::build(&store);

    assert_eq!(scene.len(), 6);
    assert_eq!(scene.roots(), ["doc".to_string()]);
    assert_eq!(scene.children("frame"), ["a", "b", "c"]);
    assert_eq!(scene.parent("a"), Some("frame"));
    assert!(scene.validate(&store).is_empty());
}

#[test]
fn test_incremental_inserts_keep_siblings_sorted() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);

    let order = ["m", "b", "y", "a", "n", "z", "c", "0"];
    for (i, pos) in order.iter().enumerate() {
        let id = format!("r{}", i);
        apply(&mut store, &mut scene, &[ElementChange::add(rect(&id, "page", pos))]);
    }

    let positions: Vec<&str> = scene
        .children("page")
        .iter()
        .map(|id| store.get(id).and_then(|e| e.position()).unwrap_or(""))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
    assert_eq!(positions.len(), order.len());
}

#[test]
fn test_insertion_index_rules() {
    let siblings: Vec<ElementId> = vec!["b".into(), "d".into(), "f".into()];
    let pos = |s: &str| -> &'static str {
        match s {
            "b" => "b",
            "d" => "d",
            _ => "f",
        }
    };
    assert_eq!(insertion_index(&[], "x", pos), 0);
    assert_eq!(insertion_index(&siblings, "a", pos), 0);
    assert_eq!(insertion_index(&siblings, "z", pos), 3);
    assert_eq!(insertion_index(&siblings, "c", pos), 1);
    assert_eq!(insertion_index(&siblings, "d", pos), 1);
    assert_eq!(insertion_index(&siblings, "e", pos), 2);
}

#[test]
fn test_absolute_transform_composes_through_ancestors() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    let a = DAffine2::from_angle(90f64.to_radians());
    let b = DAffine2::from_translation(DVec2::new(10.0, 0.0));
    let c = DAffine2::from_translation(DVec2::new(0.0, 5.0));

    apply(
        &mut store,
        &mut scene,
        &[
            ElementChange::add(group_at("A", "page", "V", a)),
            ElementChange::add(group_at("B", "A", "V", b)),
            ElementChange::add(group_at("C", "B", "V", c)),
        ],
    );

    let abs = scene.absolute_transform("C").expect("C existiert");
    assert_relative_eq!(abs.translation.x, -5.0, epsilon = 1e-9);
    assert_relative_eq!(abs.translation.y, 10.0, epsilon = 1e-9);
    assert_relative_eq!(geometry::rotation_degrees(&abs), 90.0, epsilon = 1e-9);
}

#[test]
fn test_transform_change_cascades_to_descendants() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    apply(
        &mut store,
        &mut scene,
        &[
            ElementChange::add(group_at("G", "page", "V", DAffine2::IDENTITY)),
            ElementChange::add(rect("R", "G", "V")),
        ],
    );
    assert_eq!(scene.aabb("R"), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));

    let moved = DAffine2::from_translation(DVec2::new(20.0, 30.0));
    apply(
        &mut store,
        &mut scene,
        &[ElementChange::props("G", PropPatch::new().with(Prop::Transform(moved)))],
    );

    assert_eq!(scene.aabb("R"), Some(Rect::new(20.0, 30.0, 100.0, 100.0)));
}

#[test]
fn test_size_change_refreshes_only_bounds_and_paint_bumps_revision() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    apply(&mut store, &mut scene, &[ElementChange::add(rect("5", "page", "V"))]);
    let before = scene.node("5").map(Node::revision).expect("Node existiert");

    apply(
        &mut store,
        &mut scene,
        &[ElementChange::props("5", PropPatch::new().with(Prop::Width(50.0)))],
    );
    assert_eq!(scene.aabb("5"), Some(Rect::new(0.0, 0.0, 50.0, 100.0)));
    let after_size = scene.node("5").map(Node::revision).expect("Node existiert");
    assert_eq!(after_size.geometry, before.geometry + 1);
    assert_eq!(after_size.paint, before.paint);

    apply(
        &mut store,
        &mut scene,
        &[ElementChange::props(
            "5",
            PropPatch::new().with(Prop::Fills(Vec::new())),
        )],
    );
    let after_paint = scene.node("5").map(Node::revision).expect("Node existiert");
    assert_eq!(after_paint.paint, before.paint + 1);
    assert_eq!(after_paint.geometry, after_size.geometry);
    assert!(Arc::ptr_eq(
        scene.node("5").expect("Node").element(),
        store.get_arc("5").expect("Element")
    ));
}

#[test]
fn test_delete_parent_parks_children_and_readd_adopts_them() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    let shifted = DAffine2::from_translation(DVec2::new(10.0, 0.0));
    apply(
        &mut store,
        &mut scene,
        &[
            ElementChange::add(group_at("G", "page", "V", shifted)),
            ElementChange::add(rect("R", "G", "V")),
        ],
    );
    assert_eq!(scene.aabb("R").map(|r| r.x), Some(10.0));

    let group = store.get("G").cloned().expect("G existiert");
    apply(&mut store, &mut scene, &[ElementChange::delete("G")]);
    assert!(!scene.contains("G"));
    assert!(scene.children("page").is_empty());
    assert_eq!(scene.parent("R"), None);
    assert_eq!(scene.aabb("R").map(|r| r.x), Some(0.0));

    apply(&mut store, &mut scene, &[ElementChange::add(group)]);
    assert_eq!(scene.children("G"), ["R"]);
    assert_eq!(scene.aabb("R").map(|r| r.x), Some(10.0));
    assert!(scene.validate(&store).is_empty());
}

#[test]
fn test_move_reparents_and_reorders() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    apply(
        &mut store,
        &mut scene,
        &[
            ElementChange::add(group_at(
                "G",
                "page",
                "a",
                DAffine2::from_translation(DVec2::new(100.0, 0.0)),
            )),
            ElementChange::add(rect("R1", "page", "b")),
            ElementChange::add(rect("R2", "page", "c")),
        ],
    );

    apply(
        &mut store,
        &mut scene,
        &[ElementChange::move_to("R2", ParentIndex::new("page", "0V"))],
    );
    assert_eq!(scene.children("page"), ["R2", "G", "R1"]);

    apply(
        &mut store,
        &mut scene,
        &[ElementChange::move_to("R1", ParentIndex::new("G", "V"))],
    );
    assert_eq!(scene.children("page"), ["R2", "G"]);
    assert_eq!(scene.children("G"), ["R1"]);
    assert_eq!(scene.aabb("R1").map(|r| r.x), Some(100.0));
    assert!(scene.validate(&store).is_empty());
}

#[test]
fn test_cyclic_move_is_rejected_and_rolled_back() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    apply(
        &mut store,
        &mut scene,
        &[
            ElementChange::add(group_at("G1", "page", "V", DAffine2::IDENTITY)),
            ElementChange::add(group_at("G2", "G1", "V", DAffine2::IDENTITY)),
        ],
    );

    let result = store.apply_transaction(
        &[ElementChange::move_to("G1", ParentIndex::new("G2", "V"))],
        false,
        |c, s| scene.on_change(c, s),
    );

    assert!(matches!(
        result,
        Err(crate::core::error::TransactionError::Rejected {
            source: SceneError::CyclicParent { .. },
            ..
        })
    ));
    assert_eq!(store.get("G1").and_then(|e| e.parent_id()), Some("page"));
    assert_eq!(scene.children("page"), ["G1"]);
    assert_eq!(scene.children("G1"), ["G2"]);
    assert!(scene.validate(&store).is_empty());
}

#[test]
fn test_non_finite_size_is_rejected() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    apply(&mut store, &mut scene, &[ElementChange::add(rect("R", "page", "V"))]);

    let result = store.apply_transaction(
        &[
            ElementChange::props("R", PropPatch::new().with(Prop::Name("ok".into()))),
            ElementChange::props("R", PropPatch::new().with(Prop::Width(f64::NAN))),
        ],
        false,
        |c, s| scene.on_change(c, s),
    );

    assert!(result.is_err());
    assert_eq!(store.get("R").map(|e| e.name.as_str()), Some("Rectangle"));
    assert_eq!(scene.aabb("R"), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
    assert!(scene.validate(&store).is_empty());
}

#[test]
fn test_selection_bounds_and_descendants() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    let mut far = rect("R2", "page", "b");
    far.set_prop(Prop::Transform(DAffine2::from_translation(DVec2::new(200.0, 50.0))));
    apply(
        &mut store,
        &mut scene,
        &[ElementChange::add(rect("R1", "page", "a")), ElementChange::add(far)],
    );

    let bounds = scene.selection_bounds(["R1", "R2", "missing"]);
    assert_eq!(bounds, Some(Rect::new(0.0, 0.0, 300.0, 150.0)));
    assert_eq!(scene.selection_bounds(["page"]), None);
    assert_eq!(scene.descendants("doc"), ["page", "R1", "R2"]);
}

#[test]
fn test_validator_reports_duplicate_positions() {
    let mut store = base_store();
    store.apply_change(&ElementChange::add(rect("R1", "page", "a")), true);
    store.apply_change(&ElementChange::add(rect("R2", "page", "a")), true);
    let scene = Scene::build(&store);

    let violations = scene.validate(&store);
    assert!(violations.contains(&InvariantViolation::DuplicatePosition {
        parent: "page".into(),
        position: "a".into(),
    }));
}

#[test]
fn test_mixed_patch_bumps_geometry_and_paint() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    apply(&mut store, &mut scene, &[ElementChange::add(rect("a", "page", "V"))]);
    let before = scene.node("a").map(Node::revision).expect("Node existiert");

    apply(
        &mut store,
        &mut scene,
        &[ElementChange::props(
            "a",
            PropPatch::new()
                .with(Prop::Transform(DAffine2::from_translation(DVec2::new(5.0, 0.0))))
                .with(Prop::Fills(Vec::new())),
        )],
    );

    let after = scene.node("a").map(Node::revision).expect("Node existiert");
    assert_eq!(after.paint, before.paint + 1);
    assert!(after.geometry > before.geometry);
    assert_eq!(scene.aabb("a").map(|r| r.x), Some(5.0));
}

#[test]
fn test_add_under_itself_is_a_noop() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);

    let result = store
        .apply_transaction(
            &[ElementChange::add(group_at("x", "x", "a", DAffine2::IDENTITY))],
            false,
            |c, s| scene.on_change(c, s),
        )
        .expect("No-op ist kein Fehler");

    assert!(result.applied.is_empty());
    assert!(!store.has("x"));
    assert!(!scene.contains("x"));
}

#[test]
fn test_add_adopting_its_own_ancestor_is_rejected() {
    let mut store = base_store();
    let mut scene = Scene::build(&store);
    // "p" wartet als Waise auf "x"
    apply(
        &mut store,
        &mut scene,
        &[ElementChange::add(group_at("p", "x", "a", DAffine2::IDENTITY))],
    );

    let result = store.apply_transaction(
        &[ElementChange::add(group_at("x", "p", "a", DAffine2::IDENTITY))],
        false,
        |c, s| scene.on_change(c, s),
    );

    assert!(matches!(
        result,
        Err(crate::core::error::TransactionError::Rejected {
            source: SceneError::CyclicParent { .. },
            ..
        })
    ));
    assert!(!store.has("x"));
    assert!(!scene.contains("x"));
    assert_eq!(scene.parent("p"), None);
}

#[test]
fn test_build_parks_cyclic_parents_instead_of_looping() {
    let mut store = base_store();
    store.apply_change(&ElementChange::add(group_at("a", "b", "V", DAffine2::IDENTITY)), true);
    store.apply_change(&ElementChange::add(group_at("b", "a", "V", DAffine2::IDENTITY)), true);

    let mut scene = Scene::build(&store);
    assert_eq!(scene.len(), 4);
    assert!(scene.children("a").len() + scene.children("b").len() <= 1);

    // Ein Transform auf einem der beiden darf nicht endlos kaskadieren
    let shifted = DAffine2::from_translation(DVec2::new(1.0, 0.0));
    apply(
        &mut store,
        &mut scene,
        &[ElementChange::props("a", PropPatch::new().with(Prop::Transform(shifted)))],
    );
    assert!(scene.contains("a"));
}
