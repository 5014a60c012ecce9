//! tests/manager_tests.rs

mod common;
use common::TestStore;

use std::thread;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use encrypted_kv_catalog::consts::KEY_LENGTH;
use encrypted_kv_catalog::secrets::db_key_name;
use encrypted_kv_catalog::{EventType, SecretStore, StoreError};

#[test]
fn orders_entry_lifecycle() {
    let store = TestStore::new();
    let manager = store.manager();

    manager.create_database("orders", true).unwrap();
    manager.insert_entry("orders", b"o1", b"v1").unwrap();
    manager.update_entry("orders", b"o1", b"v2").unwrap();
    assert_eq!(manager.get_entry("orders", b"o1").unwrap(), b"v2");

    manager.remove_entry("orders", b"o1").unwrap();
    assert!(matches!(
        manager.get_entry("orders", b"o1"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn created_databases_are_listed_active() {
    let store = TestStore::new();
    let manager = store.manager();

    for name in ["orders", "users", "audit"] {
        manager.create_database(name, name != "users").unwrap();
    }

    let descriptors = manager.list_descriptors().unwrap();
    assert_eq!(descriptors.len(), 3);
    for (name, descriptor) in &descriptors {
        assert!(descriptor.active, "{name} should be active");
        assert!(descriptor.db_file.starts_with(&format!("{name}-")));
        assert!(descriptor.location().join("store.db").is_file());
    }
    assert!(!descriptors["users"].secure);
    assert_eq!(manager.list_databases().unwrap(), vec!["audit", "orders", "users"]);
}

#[test]
fn secure_database_files_a_base64_key() {
    let store = TestStore::new();
    let manager = store.manager();

    manager.create_database("secure", true).unwrap();
    manager.create_database("plain", false).unwrap();

    assert!(!store.secrets.contains(&db_key_name("plain")));
    let encoded = manager.secrets().get(&db_key_name("secure")).unwrap();
    let raw = STANDARD.decode(encoded.expose_secret()).unwrap();
    assert_eq!(raw.len(), KEY_LENGTH);
}

#[test]
fn default_database_follows_catalog_config() {
    let store = TestStore::new();
    let manager = store.manager_with(false);

    let descriptor = manager.create_default_database("plain").unwrap();
    assert!(!descriptor.secure);

    let mut config = manager.read_configuration().unwrap();
    config.secure_new_db = true;
    manager.update_configuration(config).unwrap();

    let descriptor = manager.create_default_database("secure").unwrap();
    assert!(descriptor.secure);
    assert!(store.secrets.contains(&db_key_name("secure")));
}

#[test]
fn batch_insert_then_count_and_read_back() {
    let store = TestStore::new();
    let manager = store.manager();

    for n in [0usize, 1, 1000] {
        let name = format!("batch{n}");
        manager.create_database(&name, true).unwrap();

        let entries: Vec<(String, String)> = (0..n)
            .map(|i| (format!("key:{i:04}"), format!("value:{i}")))
            .collect();
        assert_eq!(manager.batch_insert(&name, entries.clone()).unwrap(), n);
        assert_eq!(manager.count_entries(&name, b"").unwrap(), n);

        for (key, value) in &entries {
            assert_eq!(
                manager.get_entry(&name, key.as_bytes()).unwrap(),
                value.as_bytes()
            );
        }
    }
}

#[test]
fn scan_entries_by_prefix() {
    let store = TestStore::new();
    let manager = store.manager();
    manager.create_database("orders", false).unwrap();

    manager
        .batch_insert(
            "orders",
            [("eu:2", "b"), ("us:1", "x"), ("eu:1", "a")].map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap();

    let eu = manager.scan_entries("orders", b"eu:").unwrap();
    assert_eq!(
        eu,
        vec![
            (b"eu:1".to_vec(), b"a".to_vec()),
            (b"eu:2".to_vec(), b"b".to_vec())
        ]
    );
    assert_eq!(manager.count_entries("orders", b"us:").unwrap(), 1);
}

#[test]
fn deactivated_database_rejects_operations() {
    let store = TestStore::new();
    let manager = store.manager();

    manager.create_database("orders", true).unwrap();
    manager.insert_entry("orders", b"o1", b"v1").unwrap();

    let descriptor = manager.deactivate_database("orders").unwrap();
    assert!(!descriptor.active);
    assert!(descriptor.deleted > 0);

    assert!(matches!(
        manager.get_entry("orders", b"o1"),
        Err(StoreError::Inactive(_))
    ));
    assert!(matches!(
        manager.insert_entry("orders", b"o2", b"v2"),
        Err(StoreError::Inactive(_))
    ));
    assert!(matches!(
        manager.deactivate_database("orders"),
        Err(StoreError::Inactive(_))
    ));

    // Soft delete: descriptor, files and key all remain
    let descriptors = manager.list_descriptors().unwrap();
    let kept = &descriptors["orders"];
    assert!(!kept.active);
    assert!(kept.location().is_dir());
    assert!(store.secrets.contains(&db_key_name("orders")));

    let last = manager.catalog().list_events().unwrap().pop().unwrap();
    assert_eq!(last.event_type, EventType::Delete);
}

#[test]
fn inactive_name_can_be_created_again() {
    let store = TestStore::new();
    let manager = store.manager();

    let first = manager.create_database("orders", true).unwrap();
    assert!(matches!(
        manager.create_database("orders", true),
        Err(StoreError::InvalidArgument(_))
    ));

    manager.deactivate_database("orders").unwrap();
    let second = manager.create_database("orders", true).unwrap();
    assert_ne!(first.db_file, second.db_file);
    assert!(second.active);
    manager.insert_entry("orders", b"o1", b"fresh").unwrap();
}

#[test]
fn unknown_database_is_not_found() {
    let store = TestStore::new();
    let manager = store.manager();
    assert!(matches!(
        manager.get_entry("nope", b"k"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn invalid_names_are_rejected() {
    let store = TestStore::new();
    let manager = store.manager();

    for name in ["", "a/b", "a\\b", "..", "x..y", "meta", "meta-x"] {
        assert!(
            matches!(
                manager.create_database(name, true),
                Err(StoreError::InvalidArgument(_))
            ),
            "{name:?} should be rejected"
        );
    }
    assert!(manager.list_databases().unwrap().is_empty());
}

#[test]
fn database_key_rotation_keeps_entries() {
    let store = TestStore::new();
    let manager = store.manager();

    let before = manager.create_database("orders", true).unwrap();
    manager
        .batch_insert("orders", (0..500).map(|i| (format!("o{i}"), format!("v{i}"))))
        .unwrap();
    let old_secret = manager.secrets().get(&db_key_name("orders")).unwrap();
    let old_secret = old_secret.expose_secret().clone();

    let after = manager.rotate_database_key("orders").unwrap();
    assert_ne!(after.db_file, before.db_file);
    assert!(after.last_rotated > 0);
    assert!(!before.location().exists());

    let new_secret = manager.secrets().get(&db_key_name("orders")).unwrap();
    assert_ne!(new_secret.expose_secret(), &old_secret);

    assert_eq!(manager.count_entries("orders", b"").unwrap(), 500);
    assert_eq!(manager.get_entry("orders", b"o42").unwrap(), b"v42");
    assert_eq!(manager.list_descriptors().unwrap()["orders"], after);
}

#[test]
fn writes_during_database_rotation_are_refused_or_kept() {
    let store = TestStore::new();
    let manager = store.manager();
    manager.create_database("orders", true).unwrap();
    manager
        .batch_insert("orders", (0..20_000).map(|i| (format!("seed:{i:05}"), "v")))
        .unwrap();
    manager.create_database("users", true).unwrap();

    let (rotated, acknowledged) = thread::scope(|s| {
        let rotation = s.spawn(|| manager.rotate_database_key("orders"));

        let mut acknowledged = Vec::new();
        let mut i = 0;
        while !rotation.is_finished() {
            let key = format!("live:{i:05}");
            match manager.insert_entry("orders", key.as_bytes(), b"v") {
                Ok(()) => acknowledged.push(key),
                Err(StoreError::RotationInProgress) => {}
                Err(err) => panic!("unexpected insert error: {err}"),
            }
            i += 1;
        }
        (rotation.join().unwrap(), acknowledged)
    });
    rotated.unwrap();

    for key in &acknowledged {
        assert!(
            manager.get_entry("orders", key.as_bytes()).is_ok(),
            "{key} was acknowledged but lost"
        );
    }
    assert_eq!(
        manager.count_entries("orders", b"live:").unwrap(),
        acknowledged.len()
    );
    assert_eq!(manager.count_entries("orders", b"seed:").unwrap(), 20_000);
    // Other databases are not held up by the rotation
    manager.insert_entry("users", b"u1", b"v1").unwrap();
}

#[test]
fn unsecured_database_cannot_be_rekeyed() {
    let store = TestStore::new();
    let manager = store.manager();
    manager.create_database("plain", false).unwrap();

    assert!(matches!(
        manager.rotate_database_key("plain"),
        Err(StoreError::InvalidArgument(_))
    ));
}

#[test]
fn manager_state_survives_reopen() {
    let store = TestStore::new();
    {
        let manager = store.manager();
        manager.create_database("orders", true).unwrap();
        manager.insert_entry("orders", b"o1", b"v1").unwrap();
    }

    let manager = store.manager();
    assert_eq!(manager.list_databases().unwrap(), vec!["orders"]);
    assert_eq!(manager.get_entry("orders", b"o1").unwrap(), b"v1");
}
