//! Log-based persistence adapter.
//!
//! Implements [`PersistencePort`] by writing each state change and stat
//! bump to the `log` facade.  The default sink when no history store is
//! configured; a database-backed adapter would implement the same trait.

use log::info;

use crate::app::outcome::StateRecord;
use crate::app::ports::{PersistenceError, PersistencePort};

/// Adapter that logs every record to the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogJournal;

impl LogJournal {
    pub fn new() -> Self {
        Self
    }
}

impl PersistencePort for LogJournal {
    fn record_state(&mut self, record: &StateRecord) -> Result<(), PersistenceError> {
        info!(
            "STATE | emotion={} | trigger={} | duration={}ms | at={}",
            record.emotion, record.trigger, record.duration_ms, record.timestamp_ms,
        );
        Ok(())
    }

    fn increment_stat(&mut self, emotion: &str) -> Result<(), PersistenceError> {
        info!("STAT | emotion={} +1", emotion);
        Ok(())
    }
}
