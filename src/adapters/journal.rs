//! History journals: in-memory, JSON-lines, and a background forwarder.
//!
//! | Journal              | Backing                     | Use |
//! |----------------------|-----------------------------|-----|
//! | `MemoryJournal`      | `Arc<Mutex<..>>`            | tests, `history()` / `stats()` queries |
//! | `JsonLinesJournal`   | any `io::Write`             | append-only file on the device |
//! | `BackgroundJournal`  | bounded channel + worker    | keeps slow writers off the trigger path |

use std::collections::{BTreeMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use anyhow::Context;
use crossbeam_channel::{Sender, TrySendError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::outcome::{StateRecord, unix_millis};
use crate::app::ports::{PersistenceError, PersistencePort};

/// One journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalEntry {
    State(StateRecord),
    Stat { emotion: String, timestamp_ms: u64 },
}

/// Per-emotion counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmotionStat {
    pub count: u64,
    pub last_triggered_ms: u64,
}

// ── MemoryJournal ─────────────────────────────────────────────

#[derive(Default)]
struct Memory {
    history: VecDeque<StateRecord>,
    stats: BTreeMap<String, EmotionStat>,
}

/// Bounded in-memory history.  Clones share the same store.
#[derive(Clone)]
pub struct MemoryJournal {
    inner: Arc<Mutex<Memory>>,
    capacity: usize,
}

impl MemoryJournal {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Keep at most `capacity` history rows; the oldest are evicted.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Memory::default())),
            capacity: capacity.max(1),
        }
    }

    /// Most recent records first.
    pub fn history(&self, limit: usize) -> Vec<StateRecord> {
        let mem = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        mem.history.iter().rev().take(limit).cloned().collect()
    }

    pub fn stats(&self) -> BTreeMap<String, EmotionStat> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
            .clone()
    }
}

impl Default for MemoryJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistencePort for MemoryJournal {
    fn record_state(&mut self, record: &StateRecord) -> Result<(), PersistenceError> {
        let mut mem = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if mem.history.len() == self.capacity {
            mem.history.pop_front();
        }
        mem.history.push_back(record.clone());
        Ok(())
    }

    fn increment_stat(&mut self, emotion: &str) -> Result<(), PersistenceError> {
        let mut mem = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let stat = mem.stats.entry(emotion.to_owned()).or_default();
        stat.count += 1;
        stat.last_triggered_ms = unix_millis();
        Ok(())
    }
}

// ── JsonLinesJournal ──────────────────────────────────────────

/// One JSON object per line.
pub struct JsonLinesJournal<W> {
    out: W,
}

impl<W: Write> JsonLinesJournal<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn append(&mut self, entry: &JournalEntry) -> Result<(), PersistenceError> {
        serde_json::to_writer(&mut self.out, entry).map_err(|_| PersistenceError::WriteFailed)?;
        self.out
            .write_all(b"\n")
            .and_then(|()| self.out.flush())
            .map_err(|_| PersistenceError::WriteFailed)
    }
}

impl JsonLinesJournal<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening journal {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> PersistencePort for JsonLinesJournal<W> {
    fn record_state(&mut self, record: &StateRecord) -> Result<(), PersistenceError> {
        self.append(&JournalEntry::State(record.clone()))
    }

    fn increment_stat(&mut self, emotion: &str) -> Result<(), PersistenceError> {
        self.append(&JournalEntry::Stat {
            emotion: emotion.to_owned(),
            timestamp_ms: unix_millis(),
        })
    }
}

// ── BackgroundJournal ─────────────────────────────────────────

/// Forwards entries to another journal on a worker thread.
///
/// Producers never block: a full channel drops the entry and reports
/// [`PersistenceError::QueueFull`].  Dropping the journal closes the
/// channel and joins the worker after it drains.
pub struct BackgroundJournal {
    tx: Option<Sender<JournalEntry>>,
    worker: Option<JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl BackgroundJournal {
    pub fn spawn<J>(mut inner: J, capacity: usize) -> anyhow::Result<Self>
    where
        J: PersistencePort + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded::<JournalEntry>(capacity.max(1));
        let worker = thread::Builder::new()
            .name("journal".into())
            .spawn(move || {
                for entry in rx {
                    let result = match &entry {
                        JournalEntry::State(record) => inner.record_state(record),
                        JournalEntry::Stat { emotion, .. } => inner.increment_stat(emotion),
                    };
                    if let Err(e) = result {
                        warn!("JOURNAL | {}", e);
                    }
                }
                debug!("JOURNAL | worker exiting");
            })
            .context("spawning journal worker")?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Entries discarded because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, entry: JournalEntry) -> Result<(), PersistenceError> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(PersistenceError::Unavailable);
        };
        match tx.try_send(entry) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(PersistenceError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(PersistenceError::Unavailable),
        }
    }
}

impl PersistencePort for BackgroundJournal {
    fn record_state(&mut self, record: &StateRecord) -> Result<(), PersistenceError> {
        self.send(JournalEntry::State(record.clone()))
    }

    fn increment_stat(&mut self, emotion: &str) -> Result<(), PersistenceError> {
        self.send(JournalEntry::Stat {
            emotion: emotion.to_owned(),
            timestamp_ms: unix_millis(),
        })
    }
}

impl Drop for BackgroundJournal {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
