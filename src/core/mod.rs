//! Business procedures of the ward service.
//!
//! [`WardService`] owns the store and the ward thresholds; each submodule adds
//! one group of procedures to it. Every public procedure starts with an
//! explicit [`authorize`](crate::auth::authorize) call.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::config::WardConfig;
use crate::db::Database;

pub mod administration;
pub mod inventory;
pub mod prescriptions;
pub mod records;
pub mod timeline;

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

#[derive(Clone)]
pub struct WardService {
    db: Database,
    config: WardConfig,
    clock: Clock,
}

impl WardService {
    pub fn new(db: Database, config: WardConfig) -> Self {
        Self {
            db,
            config,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Replaces the wall clock used to stamp new records.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &WardConfig {
        &self.config
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }
}

impl fmt::Debug for WardService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WardService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
