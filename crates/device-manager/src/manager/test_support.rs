//! Fakes shared by the manager tests.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use super::{CatalogEvent, DeviceManager};
use crate::config::DeviceManagerConfig;
use crate::driver::{ConnectedDevice, DriverArgs, DriverError, DriverSignals};
use crate::icons::NoIconTheme;
use crate::lister::{DeviceLister, ListerEvents, ListerId};
use crate::registry::{DeviceRecord, DeviceRegistry, RegistryError, RegistryHandle};
use crate::tasks::{Task, TaskTracker};
use crate::url::DeviceUrl;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// What a [`FakeLister`] reports for one device ID.
#[derive(Clone, Default)]
pub struct FakeDevice {
    pub name: String,
    pub capacity: u64,
    pub free_space: Option<u64>,
    pub icons: Vec<String>,
    pub urls: Vec<&'static str>,
}

impl FakeDevice {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_urls(mut self, urls: &[&'static str]) -> Self {
        self.urls = urls.to_vec();
        self
    }

    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Lister driven by the test: `add`/`remove` emit events like a real detection thread would.
pub struct FakeLister {
    priority: i32,
    devices: Mutex<HashMap<String, FakeDevice>>,
    events: Mutex<Option<ListerEvents>>,
    pub unmounted: Mutex<Vec<String>>,
}

impl FakeLister {
    pub fn new(priority: i32) -> Arc<Self> {
        Arc::new(Self {
            priority,
            devices: Mutex::new(HashMap::new()),
            events: Mutex::new(None),
            unmounted: Mutex::new(Vec::new()),
        })
    }

    pub fn set_device(&self, id: &str, device: FakeDevice) {
        self.devices.lock().unwrap().insert(id.to_string(), device);
    }

    /// Describes the device and reports it as added.
    pub fn add(&self, id: &str, device: FakeDevice) {
        self.set_device(id, device);
        self.events().device_added(id);
    }

    pub fn remove(&self, id: &str) {
        self.events().device_removed(id);
    }

    pub fn change(&self, id: &str) {
        self.events().device_changed(id);
    }

    fn events(&self) -> ListerEvents {
        self.events.lock().unwrap().clone().expect("lister not started")
    }

    fn device(&self, id: &str) -> FakeDevice {
        self.devices.lock().unwrap().get(id).cloned().unwrap_or_default()
    }
}

impl DeviceLister for FakeLister {
    fn start(&self, events: ListerEvents) {
        *self.events.lock().unwrap() = Some(events);
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn make_friendly_name(&self, id: &str) -> String {
        self.device(id).name
    }

    fn device_capacity(&self, id: &str) -> u64 {
        self.device(id).capacity
    }

    fn device_free_space(&self, id: &str) -> Option<u64> {
        self.device(id).free_space
    }

    fn device_icons(&self, id: &str) -> Vec<String> {
        self.device(id).icons
    }

    fn make_device_urls(&self, id: &str) -> Vec<DeviceUrl> {
        self.device(id)
            .urls
            .iter()
            .map(|url| DeviceUrl::parse(url).unwrap())
            .collect()
    }

    fn unmount_device(&self, id: &str) {
        self.unmounted.lock().unwrap().push(id.to_string());
    }
}

pub struct FakeDriver {
    pub url: DeviceUrl,
}

impl ConnectedDevice for FakeDriver {
    fn url(&self) -> &DeviceUrl {
        &self.url
    }
}

/// What a driver factory saw when it was called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construction {
    pub url: String,
    pub lister_id: ListerId,
    pub unique_id: String,
    pub database_id: i64,
    pub first_time: bool,
    /// Number of records in the registry at construction time.
    pub registry_size: usize,
}

/// Driver factories that record every call and keep the created drivers' signal channels.
#[derive(Clone, Default)]
pub struct DriverLog {
    pub constructions: Arc<Mutex<Vec<Construction>>>,
    pub signals: Arc<Mutex<Vec<DriverSignals>>>,
}

impl DriverLog {
    pub fn register(&self, manager: &mut DeviceManager, scheme: &str, registry: RegistryHandle, fail: bool) {
        let log = self.clone();
        manager.register_driver(scheme, move |args: DriverArgs| {
            log.constructions.lock().unwrap().push(Construction {
                url: args.url.to_string(),
                lister_id: args.lister_id,
                unique_id: args.unique_id.clone(),
                database_id: args.database_id,
                first_time: args.first_time,
                registry_size: registry.get_all_devices().map(|d| d.len()).unwrap_or(0),
            });
            if fail {
                return Err(DriverError::Unavailable("device did not respond".to_string()));
            }
            log.signals.lock().unwrap().push(args.catalog.clone());
            Ok(Arc::new(FakeDriver { url: args.url }) as Arc<dyn ConnectedDevice>)
        });
    }

    pub fn last_signals(&self) -> DriverSignals {
        self.signals.lock().unwrap().last().cloned().expect("no driver created")
    }

    pub fn count(&self) -> usize {
        self.constructions.lock().unwrap().len()
    }
}

pub struct FakeTasks(pub Vec<Task>);

impl TaskTracker for FakeTasks {
    fn get_tasks(&self) -> Vec<Task> {
        self.0.clone()
    }
}

pub fn task(id: u64, progress: u64, progress_max: u64) -> Task {
    Task {
        id,
        name: format!("task {id}"),
        progress,
        progress_max,
    }
}

/// A manager over an in-memory registry, plus a second handle to that registry for assertions.
pub struct Harness {
    pub manager: DeviceManager,
    pub registry: RegistryHandle,
    pub events: Receiver<CatalogEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_records(&[])
    }

    /// Starts with `records` already remembered.
    pub fn with_records(records: &[DeviceRecord]) -> Self {
        Self::build(records, |registry| Box::new(registry) as Box<dyn DeviceRegistry>)
    }

    /// Like [`with_records`](Self::with_records), but deleting from the registry always fails.
    pub fn with_failing_removes(records: &[DeviceRecord]) -> Self {
        Self::build(records, |registry| Box::new(FailingRemoves(registry)) as Box<dyn DeviceRegistry>)
    }

    fn build(records: &[DeviceRecord], wrap: impl FnOnce(RegistryHandle) -> Box<dyn DeviceRegistry>) -> Self {
        init_logging();
        let registry = RegistryHandle::spawn_in_memory().unwrap();
        for record in records {
            registry.add_device(record).unwrap();
        }
        let mut manager = DeviceManager::new(
            wrap(registry.clone()),
            Box::new(NoIconTheme),
            DeviceManagerConfig::default(),
        );
        let events = manager.subscribe();
        Self {
            manager,
            registry,
            events,
        }
    }

    pub fn add_lister(&mut self, priority: i32) -> Arc<FakeLister> {
        let lister = FakeLister::new(priority);
        self.manager.add_lister(lister.clone());
        lister
    }

    /// Applies queued events and returns the notifications they produced.
    pub fn pump(&mut self) -> Vec<CatalogEvent> {
        self.manager.process_events();
        self.drain()
    }

    pub fn drain(&self) -> Vec<CatalogEvent> {
        self.events.try_iter().collect()
    }

    pub fn saved_devices(&self) -> Vec<DeviceRecord> {
        self.registry.get_all_devices().unwrap()
    }
}

/// Registry that can read and write but never delete.
struct FailingRemoves(RegistryHandle);

impl DeviceRegistry for FailingRemoves {
    fn get_all_devices(&self) -> Result<Vec<DeviceRecord>, RegistryError> {
        self.0.get_all_devices()
    }

    fn add_device(&self, record: &DeviceRecord) -> Result<i64, RegistryError> {
        self.0.add_device(record)
    }

    fn remove_device(&self, _id: i64) -> Result<(), RegistryError> {
        Err(RegistryError::WorkerGone)
    }

    fn set_device_identity(&self, id: i64, friendly_name: &str, icon_name: &str) -> Result<(), RegistryError> {
        self.0.set_device_identity(id, friendly_name, icon_name)
    }
}

pub fn record(unique_id: &str, name: &str) -> DeviceRecord {
    DeviceRecord {
        id: -1,
        unique_id: unique_id.to_string(),
        friendly_name: name.to_string(),
        size: 0,
        icon_name: String::new(),
    }
}
