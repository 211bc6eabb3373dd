//! Registry worker thread.
//!
//! The SQLite connection lives on a dedicated `std::thread`. The device manager reaches it
//! through an mpsc channel and blocks on a oneshot reply. Registry calls are rare (startup,
//! first connection, forget, rename), so a short stall on the caller's thread is acceptable.

use log::{debug, warn};
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::oneshot;

use super::store::DeviceStore;
use super::{DeviceRecord, DeviceRegistry, RegistryError};

type Reply<T> = oneshot::Sender<Result<T, RegistryError>>;

enum RegistryMessage {
    GetAllDevices(Reply<Vec<DeviceRecord>>),
    AddDevice(DeviceRecord, Reply<i64>),
    RemoveDevice(i64, Reply<()>),
    /// Fire-and-forget: renames don't need to hold up the UI.
    SetDeviceIdentity {
        id: i64,
        friendly_name: String,
        icon_name: String,
    },
    Shutdown,
}

/// Handle for sending requests to the registry thread.
///
/// Cloneable; all clones share the same thread. The thread exits on [`RegistryHandle::shutdown`]
/// or once every handle is dropped.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryMessage>,
    thread_handle: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
}

impl RegistryHandle {
    /// Open the registry at `db_path` and spawn its worker thread.
    pub fn spawn(db_path: &Path) -> Result<Self, RegistryError> {
        let store = DeviceStore::open(db_path)?;
        debug!("Opened device registry at {}", db_path.display());
        Self::spawn_with_store(store)
    }

    /// Worker over an in-memory registry.
    pub fn spawn_in_memory() -> Result<Self, RegistryError> {
        Self::spawn_with_store(DeviceStore::open_in_memory()?)
    }

    fn spawn_with_store(store: DeviceStore) -> Result<Self, RegistryError> {
        let (sender, receiver) = mpsc::channel::<RegistryMessage>();

        let handle = thread::Builder::new()
            .name("device-registry".into())
            .spawn(move || worker_loop(store, receiver))?;

        Ok(Self {
            sender,
            thread_handle: Arc::new(Mutex::new(Some(handle))),
        })
    }

    /// Send a `Shutdown` message and wait for the worker to finish pending requests.
    ///
    /// After this call further requests fail with [`RegistryError::WorkerGone`].
    pub fn shutdown(&self) {
        let _ = self.sender.send(RegistryMessage::Shutdown);
        if let Ok(mut guard) = self.thread_handle.lock()
            && let Some(handle) = guard.take()
            && let Err(e) = handle.join()
        {
            warn!("Device registry thread panicked on shutdown: {e:?}");
        }
    }

    fn request<T>(&self, make_message: impl FnOnce(Reply<T>) -> RegistryMessage) -> Result<T, RegistryError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make_message(reply))
            .map_err(|_| RegistryError::WorkerGone)?;
        response.blocking_recv().map_err(|_| RegistryError::WorkerGone)?
    }
}

impl DeviceRegistry for RegistryHandle {
    fn get_all_devices(&self) -> Result<Vec<DeviceRecord>, RegistryError> {
        self.request(RegistryMessage::GetAllDevices)
    }

    fn add_device(&self, record: &DeviceRecord) -> Result<i64, RegistryError> {
        let record = record.clone();
        self.request(|reply| RegistryMessage::AddDevice(record, reply))
    }

    fn remove_device(&self, id: i64) -> Result<(), RegistryError> {
        self.request(|reply| RegistryMessage::RemoveDevice(id, reply))
    }

    fn set_device_identity(&self, id: i64, friendly_name: &str, icon_name: &str) -> Result<(), RegistryError> {
        self.sender
            .send(RegistryMessage::SetDeviceIdentity {
                id,
                friendly_name: friendly_name.to_string(),
                icon_name: icon_name.to_string(),
            })
            .map_err(|_| RegistryError::WorkerGone)
    }
}

fn worker_loop(store: DeviceStore, receiver: mpsc::Receiver<RegistryMessage>) {
    // Ends on Shutdown, or when every handle is dropped.
    while let Ok(message) = receiver.recv() {
        match message {
            RegistryMessage::GetAllDevices(reply) => {
                // If the requester went away, that's fine; ignore the send error
                let _ = reply.send(store.get_all_devices());
            }
            RegistryMessage::AddDevice(record, reply) => {
                let _ = reply.send(store.add_device(&record));
            }
            RegistryMessage::RemoveDevice(id, reply) => {
                let _ = reply.send(store.remove_device(id));
            }
            RegistryMessage::SetDeviceIdentity {
                id,
                friendly_name,
                icon_name,
            } => {
                if let Err(e) = store.set_device_identity(id, &friendly_name, &icon_name) {
                    warn!("Device registry: set_device_identity({id}) failed: {e}");
                }
            }
            RegistryMessage::Shutdown => break,
        }
    }
    debug!("Device registry thread exiting");
}
