use crate::translate::Family;
use crate::points::{NAMES, Point, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

/// The latest known view of the device, as maintained by the device communication layer.
pub trait Snapshot: Send + Sync {
    /// The latest value of `point`, or `None` if it has never been read.
    fn get(&self, point: Point) -> Option<Value>;
    /// Request a write of `value` to `point`.
    ///
    /// Returns without waiting for the device. The new value shows up in [`Snapshot::get`] only
    /// once the device layer has read it back.
    fn set(&self, point: Point, value: Value);
}

/// Live states of entities that do not belong to the ISG, looked up by their ID.
pub trait ForeignStates: Send + Sync {
    fn state(&self, entity_id: &str) -> Option<String>;
}

pub struct PointBitmask(u64);

const _ASSERT_BITMASK_FITS: () = assert!(NAMES.len() <= u64::BITS as usize);

impl PointBitmask {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn is_set(&self, point: Point) -> bool {
        (self.0 & (1 << point.index())) != 0
    }

    pub fn set(&mut self, point: Point) {
        self.0 |= 1 << point.index();
    }
}

pub struct SnapshotValues {
    values: Vec<Value>,
    have_value: PointBitmask,
}

impl SnapshotValues {
    pub fn new() -> Self {
        Self {
            values: vec![Value::U16(0); NAMES.len()],
            have_value: PointBitmask::new(),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        self.have_value.is_set(point)
    }

    pub fn value_of(&self, point: Point) -> Option<Value> {
        if !self.contains(point) {
            return None;
        }
        Some(self.values[point.index()])
    }

    /// Set the newly read value with our cached view of the device.
    ///
    /// Returns `true` if the value has changed.
    pub fn set_value(&mut self, point: Point, value: Value) -> bool {
        let index = point.index();
        let changed = value != self.values[index] || !self.have_value.is_set(point);
        self.values[index] = value;
        self.have_value.set(point);
        changed
    }
}

/// A write requested through [`Snapshot::set`], waiting for the device layer to carry it out.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Write {
    pub point: Point,
    pub value: Value,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not read the snapshot file at {1:?}")]
    ReadFile(#[source] std::io::Error, PathBuf),
    #[error("snapshot file at {1:?} is not valid JSON")]
    DecodeJson(#[source] serde_json::Error, PathBuf),
}

/// Snapshot shared between the poller, which records values, and any number of entities.
pub struct SharedSnapshot {
    values: Mutex<SnapshotValues>,
    foreign: Mutex<BTreeMap<String, String>>,
    write_queue: UnboundedSender<Write>,
}

impl SharedSnapshot {
    /// Create an empty snapshot along with the queue of the writes requested through it.
    pub fn new() -> (Self, UnboundedReceiver<Write>) {
        let (write_queue, writes) = tokio::sync::mpsc::unbounded_channel();
        let snapshot = Self {
            values: Mutex::new(SnapshotValues::new()),
            foreign: Mutex::new(BTreeMap::new()),
            write_queue,
        };
        (snapshot, writes)
    }

    /// Record a value read from the device.
    ///
    /// Returns `true` if the value has changed.
    pub fn record(&self, point: Point, value: Value) -> bool {
        let mut guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        let changed = guard.set_value(point, value);
        drop(guard);
        if changed {
            trace!(point = point.name(), %value, "point value changed");
        }
        changed
    }

    pub fn record_foreign(&self, entity_id: impl Into<String>, state: impl Into<String>) {
        let mut guard = self.foreign.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(entity_id.into(), state.into());
    }

    pub fn load(&self, file: SnapshotFile) {
        for (name, value) in file.points {
            let Some(point) = Point::from_name(&name) else {
                warn!(%name, "snapshot contains an unknown point, skipping");
                continue;
            };
            let Some(value) = point.data_type().from_json(&value) else {
                warn!(%name, %value, data_type = %point.data_type(), "snapshot value does not fit the point, skipping");
                continue;
            };
            self.record(point, value);
        }
        for (entity_id, state) in file.foreign {
            self.record_foreign(entity_id, state);
        }
    }

    pub fn from_path(path: &Path) -> Result<(Self, UnboundedReceiver<Write>), Error> {
        let data = std::fs::read(path).map_err(|e| Error::ReadFile(e, path.to_path_buf()))?;
        let file: SnapshotFile =
            serde_json::from_slice(&data).map_err(|e| Error::DecodeJson(e, path.to_path_buf()))?;
        let (snapshot, writes) = Self::new();
        snapshot.load(file);
        debug!(?path, "loaded snapshot");
        Ok((snapshot, writes))
    }
}

impl Snapshot for SharedSnapshot {
    fn get(&self, point: Point) -> Option<Value> {
        let guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        guard.value_of(point)
    }

    fn set(&self, point: Point, value: Value) {
        if self.write_queue.send(Write { point, value }).is_err() {
            warn!(point = point.name(), %value, "device layer is gone, dropping the write");
        }
    }
}

impl ForeignStates for SharedSnapshot {
    fn state(&self, entity_id: &str) -> Option<String> {
        let guard = self.foreign.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(entity_id).cloned()
    }
}

/// On-disk form of a snapshot, as dumped by a poller.
#[derive(serde::Deserialize, Default)]
pub struct SnapshotFile {
    #[serde(default)]
    pub points: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub foreign: BTreeMap<String, String>,
}

#[derive(clap::Parser, Clone)]
#[group(id = "snapshot::Args")]
pub struct Args {
    /// The product family of the heat pump behind the ISG.
    #[arg(long, value_enum)]
    pub family: Family,

    /// JSON file with the latest point values read from the ISG.
    ///
    /// Point values go under `points`, keyed by point name (see `points`). Live readings of
    /// foreign sensors go under `foreign`, keyed by entity ID.
    #[arg(long, short = 's')]
    pub snapshot: PathBuf,

    /// Name of the ISG device, used as part of the unique entity IDs.
    #[arg(long, default_value = "isg")]
    pub name: String,
}

impl Args {
    pub fn to_snapshot(&self) -> Result<(SharedSnapshot, UnboundedReceiver<Write>), Error> {
        SharedSnapshot::from_path(&self.snapshot)
    }
}
