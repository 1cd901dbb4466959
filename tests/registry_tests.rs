// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registry persistence, import/export and merge tests.

mod common;

use common::feature_collection;
use mushy_map::db::LocalStore;
use mushy_map::models::PortalType;
use mushy_map::services::{DomainEvent, EventBus, PortalRegistry};

fn registry_with(store: &LocalStore) -> PortalRegistry {
    PortalRegistry::load(store.clone(), EventBus::new()).expect("load")
}

#[test]
fn test_empty_store_loads_empty_registry() {
    let registry = registry_with(&LocalStore::new_mock());
    assert!(registry.is_empty());
}

#[test]
fn test_save_and_reload_is_idempotent() {
    let store = LocalStore::new_mock();
    let mut registry = registry_with(&store);
    registry
        .import_geojson(&feature_collection(&[
            ("a.16", "Flower", None),
            ("b", "Mushroom", Some(true)),
        ]))
        .unwrap();

    let first = registry_with(&store);
    first.save().unwrap();
    let second = registry_with(&store);

    let mut a: Vec<_> = first.iter().cloned().collect();
    let mut b: Vec<_> = second.iter().cloned().collect();
    a.sort_by(|x, y| x.guid.cmp(&y.guid));
    b.sort_by(|x, y| x.guid.cmp(&y.guid));
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
}

#[test]
fn test_legacy_records_are_normalized() {
    let store = LocalStore::new_mock();
    store
        .set(
            "portals",
            r#"[{"guid":"x.16","lat":1,"lng":2},{"guid":"y","lat":3,"lng":4,"name":"","type":"mushroom"}]"#,
        )
        .unwrap();

    let registry = registry_with(&store);

    let x = registry.get("x.16").unwrap();
    assert_eq!(x.name, "x.16");
    assert_eq!(x.portal_type, PortalType::Unknown);
    assert!(!x.manual);

    let y = registry.get("y").unwrap();
    assert_eq!(y.name, "y");
    assert_eq!(y.portal_type, PortalType::Mushroom);
    assert!(y.manual);
}

#[test]
fn test_corrupt_store_loads_empty() {
    let store = LocalStore::new_mock();
    store.set("portals", "{not json").unwrap();

    let registry = registry_with(&store);
    assert!(registry.is_empty());
}

#[test]
fn test_export_import_round_trip_preserves_manual() {
    let mut source = registry_with(&LocalStore::new_mock());
    source
        .import_geojson(&feature_collection(&[
            // A directory-style guid explicitly flagged as hand-placed.
            ("kept.16", "Flower", Some(true)),
            ("plain.16", "Mushroom", None),
        ]))
        .unwrap();

    let export = source.export_geojson(&[]);
    assert_eq!(export.filename, "markers.geojson");
    assert_eq!(export.count, 2);

    let mut target = registry_with(&LocalStore::new_mock());
    assert_eq!(target.import_geojson(&export.body).unwrap(), 2);

    assert!(target.get("kept.16").unwrap().manual);
    assert!(!target.get("plain.16").unwrap().manual);
    assert_eq!(target.get("plain.16").unwrap().portal_type, PortalType::Mushroom);
}

#[test]
fn test_export_selected_types() {
    let mut registry = registry_with(&LocalStore::new_mock());
    registry
        .import_geojson(&feature_collection(&[
            ("a", "Flower", None),
            ("b", "Mushroom", None),
            ("c", "Unavailable", None),
        ]))
        .unwrap();

    let export = registry.export_geojson(&[PortalType::Mushroom, PortalType::Flower]);
    assert_eq!(export.count, 2);
    assert_eq!(export.filename, "Flower,Mushroom.geojson");

    let all = registry.export_geojson(&PortalType::ALL);
    assert_eq!(all.count, 3);
    assert_eq!(all.filename, "markers.geojson");
}

#[test]
fn test_import_overwrites_existing() {
    let mut registry = registry_with(&LocalStore::new_mock());
    registry
        .import_geojson(&feature_collection(&[("a", "Flower", None)]))
        .unwrap();
    registry
        .import_geojson(&feature_collection(&[("a", "Mushroom", None)]))
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("a").unwrap().portal_type, PortalType::Mushroom);
}

#[test]
fn test_invalid_import_changes_nothing() {
    let mut registry = registry_with(&LocalStore::new_mock());
    registry
        .import_geojson(&feature_collection(&[("a", "Flower", None)]))
        .unwrap();

    let err = registry.import_geojson("{\"type\": \"Point\"").unwrap_err();
    assert!(matches!(err, mushy_map::error::AppError::InvalidGeoJson(_)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_delete_by_types() {
    let store = LocalStore::new_mock();
    let mut registry = registry_with(&store);
    registry
        .import_geojson(&feature_collection(&[
            ("a", "Flower", None),
            ("b", "Mushroom", None),
            ("c", "Unknown", None),
        ]))
        .unwrap();

    assert_eq!(registry.delete_by_types(&[]).unwrap(), 0);
    assert_eq!(registry.len(), 3);

    assert_eq!(
        registry
            .delete_by_types(&[PortalType::Flower, PortalType::Unknown])
            .unwrap(),
        2
    );
    assert!(registry.contains("b"));

    // The deletion was persisted.
    assert_eq!(registry_with(&store).len(), 1);
}

#[tokio::test]
async fn test_import_publishes_change() {
    let events = EventBus::new();
    let mut receiver = events.subscribe();
    let mut registry = PortalRegistry::load(LocalStore::new_mock(), events).unwrap();

    registry
        .import_geojson(&feature_collection(&[("a", "Flower", None), ("b", "Flower", None)]))
        .unwrap();

    assert_eq!(
        receiver.recv().await.unwrap(),
        DomainEvent::PortalsChanged { count: 2 }
    );
}

#[test]
fn test_directory_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = LocalStore::open(dir.path()).unwrap();
        let mut registry = registry_with(&store);
        registry
            .create_manual(10.0, 20.0, Some("Bench"), PortalType::Flower)
            .unwrap();
    }

    let store = LocalStore::open(dir.path()).unwrap();
    let registry = registry_with(&store);
    let portals = registry.list();
    assert_eq!(portals.len(), 1);
    assert_eq!(portals[0].name, "Bench");
    assert!(portals[0].manual);
}

#[test]
fn test_failed_save_leaves_registry_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let mut registry = registry_with(&store);
    registry
        .import_geojson(&feature_collection(&[
            ("a.16", "Flower", None),
            ("b.16", "Mushroom", None),
        ]))
        .unwrap();

    std::fs::remove_dir_all(dir.path()).unwrap();

    assert!(registry.set_type("a.16", PortalType::Unavailable).is_err());
    assert_eq!(registry.get("a.16").unwrap().portal_type, PortalType::Flower);

    assert!(registry
        .create_manual(1.0, 2.0, Some("Lost"), PortalType::Flower)
        .is_err());
    assert_eq!(registry.len(), 2);

    assert!(registry.delete_by_types(&[PortalType::Mushroom]).is_err());
    assert!(registry.contains("b.16"));

    assert!(registry
        .import_geojson(&feature_collection(&[("c.16", "Unknown", None)]))
        .is_err());
    assert!(!registry.contains("c.16"));
    assert_eq!(registry.len(), 2);
}
