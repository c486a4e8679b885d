use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use log::{debug, info, warn};
use serde_json::Value;

use crate::runtime::Runtime;

use super::attribute::AttrClass;
use super::error::SnapshotError;
use super::serializer::{deserialize_object, serialize_object};

/// Depth of the parallel restore queue. Enqueue blocks the reader thread
/// when full, throttling snapshot parsing to worker speed.
const RESTORE_QUEUE_DEPTH: usize = 25_000;

/// Upper bound on a single record; longer length prefixes are treated as
/// framing corruption.
const MAX_RECORD_LEN: usize = 64 * 1024 * 1024;

fn io_error(call: &'static str, path: &Path) -> impl FnOnce(io::Error) -> SnapshotError {
    let path = path.to_path_buf();
    move |source| SnapshotError::Io { call, path, source }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Writes one net-string frame: `<decimal-length> ':' <payload> ','`.
pub fn write_netstring(out: &mut impl Write, payload: &[u8]) -> io::Result<()> {
    write!(out, "{}:", payload.len())?;
    out.write_all(payload)?;
    out.write_all(b",")
}

/// Streaming net-string decoder. A truncated or corrupt trailing record ends
/// the stream instead of failing it.
pub struct NetstringReader<R: Read> {
    input: R,
}

impl<R: Read> NetstringReader<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        self.input.read_exact(&mut byte).ok()?;
        Some(byte[0])
    }

    pub fn next_record(&mut self) -> Option<Vec<u8>> {
        let mut len: usize = 0;
        let mut saw_digit = false;

        loop {
            let byte = self.read_byte()?;
            match byte {
                b'0'..=b'9' => {
                    len = len.checked_mul(10)?.checked_add((byte - b'0') as usize)?;
                    if len > MAX_RECORD_LEN {
                        warn!("discarding oversized state record ({} bytes)", len);
                        return None;
                    }
                    saw_digit = true;
                }
                b':' if saw_digit => break,
                _ => {
                    warn!("state file framing error, discarding remainder");
                    return None;
                }
            }
        }

        let mut payload = vec![0u8; len];
        self.input.read_exact(&mut payload).ok()?;

        if self.read_byte()? != b',' {
            warn!("state file framing error, discarding remainder");
            return None;
        }

        Some(payload)
    }
}

/// Outcome counters of a restore pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct RestoreStats {
    /// Records read from the snapshot and handed to workers.
    pub restored: usize,
    /// Registered objects finalized without snapshot state.
    pub fresh: usize,
}

/// Writes every registered object's fields matching `mask` to a net-string
/// framed state file. The file is written to `<path>.tmp` and renamed over
/// the target; a partial write never becomes visible.
pub fn dump_objects(runtime: &Runtime, path: &Path, mask: AttrClass) -> Result<(), SnapshotError> {
    info!("dumping program state to '{}'", path.display());

    let temp = temp_path(path);
    let file = File::create(&temp).map_err(io_error("open", &temp))?;
    let mut out = BufWriter::new(file);

    for descriptor in runtime.types.all() {
        for object in descriptor.objects() {
            let Some(update) = serialize_object(object.as_ref(), mask) else {
                continue;
            };

            let record = serde_json::json!({
                "type": descriptor.name(),
                "name": object.core().name(),
                "update": update,
            });
            let payload = serde_json::to_vec(&record)?;
            write_netstring(&mut out, &payload).map_err(io_error("write", &temp))?;
        }
    }

    out.flush().map_err(io_error("write", &temp))?;
    drop(out);

    #[cfg(windows)]
    let _ = fs::remove_file(path);

    fs::rename(&temp, path).map_err(io_error("rename", &temp))?;
    Ok(())
}

fn restore_record(runtime: &Runtime, payload: &[u8], mask: AttrClass) {
    let record: Value = match serde_json::from_slice(payload) {
        Ok(record) => record,
        Err(err) => {
            debug!("skipping malformed state record: {}", err);
            return;
        }
    };

    let Some(type_name) = record.get("type").and_then(Value::as_str) else {
        return;
    };
    // a stale snapshot may reference types or objects that no longer exist
    let Some(descriptor) = runtime.types.type_by_name(type_name) else {
        return;
    };
    let Some(name) = record.get("name").and_then(Value::as_str) else {
        return;
    };
    let Some(object) = descriptor.object(name) else {
        return;
    };

    assert!(
        !object.core().is_active(),
        "state restored into active object '{}'",
        name
    );

    let Some(update) = record.get("update").and_then(Value::as_object) else {
        return;
    };

    if deserialize_object(object.as_ref(), update, true, mask).is_err() {
        return;
    }

    object.on_state_loaded();
    object.core().set_state_loaded(true);
}

/// Restores object state from a snapshot file written by [`dump_objects`].
///
/// Records are parsed and applied by a bounded pool of worker threads. A
/// missing file is a fresh start and returns zero stats; an unreadable file
/// is fatal. Individual bad records are skipped. After the queue drains,
/// every object the snapshot did not touch still receives its
/// `on_state_loaded` hook exactly once.
pub fn restore_objects(
    runtime: &Runtime,
    path: &Path,
    mask: AttrClass,
) -> Result<RestoreStats, SnapshotError> {
    if !path.exists() {
        return Ok(RestoreStats::default());
    }

    info!("restoring program state from '{}'", path.display());

    let file = File::open(path).map_err(io_error("open", path))?;
    let mut reader = NetstringReader::new(BufReader::new(file));

    let workers = runtime.config.concurrency.max(1);
    let mut restored = 0usize;

    let (sender, receiver) = mpsc::sync_channel::<Vec<u8>>(RESTORE_QUEUE_DEPTH);
    let receiver = Mutex::new(receiver);
    let receiver = &receiver;

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(move || loop {
                let payload = {
                    let guard = receiver.lock().expect("restore queue poisoned");
                    guard.recv()
                };
                match payload {
                    Ok(payload) => restore_record(runtime, &payload, mask),
                    Err(_) => break,
                }
            });
        }

        while let Some(payload) = reader.next_record() {
            if sender.send(payload).is_err() {
                break;
            }
            restored += 1;
        }
        drop(sender);
    });

    let mut fresh = 0usize;
    for descriptor in runtime.types.all() {
        for object in descriptor.objects() {
            if object.core().state_loaded() {
                continue;
            }
            object.on_state_loaded();
            object.core().set_state_loaded(true);
            fresh += 1;
        }
    }

    info!(
        "restored {} objects, {} objects had no snapshot state",
        restored, fresh
    );

    Ok(RestoreStats { restored, fresh })
}
