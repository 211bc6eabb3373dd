//! Tests for merging lister reports into devices.

use super::test_support::{DriverLog, FakeDevice, Harness, record};
use super::*;

#[test]
fn test_new_device_adds_a_row() {
    let mut h = Harness::new();
    let lister = h.add_lister(1);

    lister.add("X1", FakeDevice::named("Cruzer").with_capacity(16_000_000_000));
    let events = h.pump();

    assert_eq!(h.manager.row_count(), 1);
    assert_eq!(events, vec![CatalogEvent::RowsInserted { first: 0, last: 0 }]);
    assert_eq!(h.manager.state(0), Some(DeviceState::NotConnected));
    assert_eq!(
        h.manager.data(0, Role::Display),
        Some(AttributeValue::Text("Cruzer (16.0 GB)".to_string()))
    );
}

#[test]
fn test_unsaved_device_disappears_when_unplugged() {
    let mut h = Harness::new();
    let lister = h.add_lister(1);
    lister.add("X1", FakeDevice::named("Cruzer"));
    h.pump();

    lister.remove("X1");
    let events = h.pump();

    assert_eq!(h.manager.row_count(), 0);
    assert_eq!(events, vec![CatalogEvent::RowsRemoved { first: 0, last: 0 }]);
}

#[test]
fn test_remembered_device_stays_when_unplugged() {
    let mut h = Harness::with_records(&[record("X1", "Walkman")]);
    let lister = h.add_lister(1);
    assert_eq!(h.manager.state(0), Some(DeviceState::Remembered));

    lister.add("X1", FakeDevice::named("WALKMAN NW-A45"));
    let events = h.pump();
    assert_eq!(h.manager.row_count(), 1);
    assert_eq!(events, vec![CatalogEvent::RowChanged { row: 0 }]);
    assert_eq!(h.manager.state(0), Some(DeviceState::NotConnected));
    // The saved name wins over the lister's.
    assert_eq!(
        h.manager.data(0, Role::FriendlyName),
        Some(AttributeValue::Text("Walkman".to_string()))
    );

    lister.remove("X1");
    let events = h.pump();
    assert_eq!(h.manager.row_count(), 1);
    assert_eq!(h.manager.state(0), Some(DeviceState::Remembered));
    assert_eq!(
        events,
        vec![
            CatalogEvent::RowChanged { row: 0 },
            CatalogEvent::DeviceDisconnected { row: 0 }
        ]
    );
    assert_eq!(
        h.manager.data(0, Role::UniqueId),
        Some(AttributeValue::Text("X1".to_string()))
    );
}

#[test]
fn test_repeated_add_and_remove_tracks_last_event() {
    let mut h = Harness::with_records(&[record("X1", "Walkman")]);
    let lister = h.add_lister(1);

    for _ in 0..3 {
        lister.add("X1", FakeDevice::named("Walkman"));
        lister.remove("X1");
    }
    lister.add("X1", FakeDevice::named("Walkman"));
    h.pump();
    assert_eq!(h.manager.state(0), Some(DeviceState::NotConnected));

    lister.remove("X1");
    h.pump();
    assert_eq!(h.manager.state(0), Some(DeviceState::Remembered));
    assert_eq!(h.manager.row_count(), 1);
}

#[test]
fn test_unsaved_add_remove_cycles_leave_no_rows() {
    let mut h = Harness::new();
    let lister = h.add_lister(1);

    for _ in 0..3 {
        lister.add("X1", FakeDevice::named("Stick"));
        lister.remove("X1");
    }
    h.pump();
    assert_eq!(h.manager.row_count(), 0);
}

#[test]
fn test_same_device_through_two_listers_is_one_row() {
    let mut h = Harness::new();
    let udisks = h.add_lister(1);
    let gio = h.add_lister(2);

    udisks.add(
        "/org/freedesktop/UDisks2/block_devices/sdb1",
        FakeDevice::named("sdb1").with_urls(&["file:///media/usb"]),
    );
    h.pump();
    gio.add(
        "Cruzer Blade",
        FakeDevice::named("Cruzer Blade").with_urls(&["ipod:///media/usb", "file:///media/usb"]),
    );
    let events = h.pump();

    assert_eq!(h.manager.row_count(), 1);
    assert_eq!(events, vec![CatalogEvent::RowChanged { row: 0 }]);
    // The higher-priority lister now names the unsaved device.
    assert_eq!(
        h.manager.data(0, Role::FriendlyName),
        Some(AttributeValue::Text("Cruzer Blade".to_string()))
    );
    assert_eq!(
        h.manager.data(0, Role::UniqueId),
        Some(AttributeValue::Text("Cruzer Blade".to_string()))
    );
}

#[test]
fn test_lower_priority_lister_does_not_rename() {
    let mut h = Harness::new();
    let gio = h.add_lister(2);
    let udisks = h.add_lister(1);

    gio.add("Cruzer Blade", FakeDevice::named("Cruzer Blade").with_urls(&["file:///media/usb"]));
    h.pump();
    udisks.add("sdb1", FakeDevice::named("sdb1").with_urls(&["file:///media/usb"]));
    h.pump();

    assert_eq!(h.manager.row_count(), 1);
    assert_eq!(
        h.manager.data(0, Role::FriendlyName),
        Some(AttributeValue::Text("Cruzer Blade".to_string()))
    );
}

#[test]
fn test_merged_device_survives_losing_one_backend() {
    let mut h = Harness::new();
    let a = h.add_lister(1);
    let b = h.add_lister(2);
    a.add("A", FakeDevice::named("a").with_urls(&["file:///media/x"]));
    b.add("B", FakeDevice::named("b").with_urls(&["file:///media/x"]));
    h.pump();

    b.remove("B");
    h.pump();
    assert_eq!(h.manager.row_count(), 1);
    assert_eq!(
        h.manager.data(0, Role::UniqueId),
        Some(AttributeValue::Text("A".to_string()))
    );

    a.remove("A");
    h.pump();
    assert_eq!(h.manager.row_count(), 0);
}

#[test]
fn test_devices_without_shared_urls_stay_separate() {
    let mut h = Harness::new();
    let a = h.add_lister(1);
    let b = h.add_lister(1);
    a.add("A", FakeDevice::named("a").with_urls(&["file:///media/x"]));
    b.add("B", FakeDevice::named("b").with_urls(&["file:///media/y"]));
    a.add("C", FakeDevice::named("c"));
    h.pump();

    assert_eq!(h.manager.row_count(), 3);
}

#[test]
fn test_unknown_removal_and_change_are_ignored() {
    let mut h = Harness::new();
    let lister = h.add_lister(1);
    lister.remove("ghost");
    lister.change("ghost");
    assert_eq!(h.pump(), vec![]);
    assert_eq!(h.manager.row_count(), 0);
}

#[test]
fn test_change_keeps_device_as_is() {
    let mut h = Harness::new();
    let lister = h.add_lister(1);
    lister.add("X1", FakeDevice::named("Cruzer"));
    h.pump();

    lister.change("X1");
    assert_eq!(h.pump(), vec![]);
    assert_eq!(h.manager.row_count(), 1);
}

#[test]
fn test_row_refs_follow_removals() {
    let mut h = Harness::new();
    let lister = h.add_lister(1);
    lister.add("A", FakeDevice::named("a"));
    lister.add("B", FakeDevice::named("b"));
    lister.add("C", FakeDevice::named("c"));
    h.pump();
    let a = h.manager.row_ref(0).unwrap();
    let b = h.manager.row_ref(1).unwrap();
    let c = h.manager.row_ref(2).unwrap();

    lister.remove("B");
    h.pump();

    assert_eq!(h.manager.resolve(&a), Some(0));
    assert_eq!(h.manager.resolve(&b), None);
    assert_eq!(h.manager.resolve(&c), Some(1));
}

#[test]
fn test_remembered_devices_load_from_registry() {
    let h = Harness::with_records(&[record("A,B", "iPod"), record("C", "Stick")]);
    assert_eq!(h.manager.row_count(), 2);
    assert_eq!(h.manager.state(0), Some(DeviceState::Remembered));
    assert!(h.manager.database_id(0).is_some());
    // Best backend of a fully absent device is its first one.
    assert_eq!(
        h.manager.data(0, Role::UniqueId),
        Some(AttributeValue::Text("A".to_string()))
    );
}

#[test]
fn test_remembered_device_reappears_under_second_id() {
    let mut h = Harness::with_records(&[record("A,B", "iPod")]);
    let lister = h.add_lister(1);
    lister.add("B", FakeDevice::named("Apple iPod"));
    h.pump();

    assert_eq!(h.manager.row_count(), 1);
    assert_eq!(h.manager.state(0), Some(DeviceState::NotConnected));
    assert_eq!(
        h.manager.data(0, Role::UniqueId),
        Some(AttributeValue::Text("B".to_string()))
    );
}

#[test]
fn test_other_backend_leaving_keeps_driver() {
    let mut h = Harness::new();
    let gio = h.add_lister(2);
    let udisks = h.add_lister(1);
    gio.add("Cruzer Blade", FakeDevice::named("Cruzer Blade").with_urls(&["dev:///media/usb"]));
    udisks.add("sdb1", FakeDevice::named("sdb1").with_urls(&["dev:///media/usb"]));
    h.pump();
    let log = DriverLog::default();
    log.register(&mut h.manager, "dev", h.registry.clone(), false);
    let driver = h.manager.connect(0).unwrap();
    h.drain();

    // The driver was created through the higher-priority lister.
    udisks.remove("sdb1");
    let events = h.pump();

    assert_eq!(events, vec![CatalogEvent::RowChanged { row: 0 }]);
    assert!(driver.is_connected());
    assert_eq!(h.manager.state(0), Some(DeviceState::Connected));
}

#[test]
fn test_saved_device_keeps_identity_when_better_lister_appears() {
    let mut h = Harness::new();
    let udisks = h.add_lister(1);
    let gio = h.add_lister(2);
    let mut stick = FakeDevice::named("sdb1")
        .with_urls(&["dev:///media/usb"])
        .with_capacity(8_000_000_000);
    stick.icons = vec!["drive-harddisk-usb".to_string()];
    udisks.add("sdb1", stick);
    h.pump();
    let log = DriverLog::default();
    log.register(&mut h.manager, "dev", h.registry.clone(), false);
    h.manager.connect(0).unwrap();
    let icon_before = h.manager.data(0, Role::IconName);

    let mut blade = FakeDevice::named("Cruzer Blade")
        .with_urls(&["dev:///media/usb"])
        .with_capacity(16_000_000_000);
    blade.icons = vec!["phone".to_string()];
    gio.add("Cruzer Blade", blade);
    h.pump();

    assert_eq!(h.manager.row_count(), 1);
    assert_eq!(
        h.manager.data(0, Role::FriendlyName),
        Some(AttributeValue::Text("sdb1".to_string()))
    );
    assert_eq!(h.manager.data(0, Role::Capacity), Some(AttributeValue::Bytes(8_000_000_000)));
    assert_eq!(h.manager.data(0, Role::IconName), icon_before);
    // The new path is still used for lookups.
    assert_eq!(
        h.manager.data(0, Role::UniqueId),
        Some(AttributeValue::Text("Cruzer Blade".to_string()))
    );
}
