//! One open classroom: the store it came from, the event bus and the RNG.

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use seatplan_core::interchange::{ImportData, ImportReport};
use seatplan_core::{Classroom, Command, DispatchOutcome};
use seatplan_events::{ClassroomEvent, EventBus};
use seatplan_store::repositories::{ClassroomRepo, SettingsRepo};
use seatplan_store::JsonFileStore;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use crate::config::AppConfig;

pub struct Session {
    config: AppConfig,
    store: JsonFileStore,
    classroom: Classroom,
    bus: EventBus,
    events: Receiver<ClassroomEvent>,
    rng: StdRng,
}

impl Session {
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store = JsonFileStore::open(&config.data_path)
            .with_context(|| format!("Failed to open {}", config.data_path.display()))?;
        let settings = SettingsRepo::load(&store)?;
        let classroom = ClassroomRepo::load(&store, config.history_config(&settings))
            .with_context(|| format!("Failed to load {}", config.data_path.display()))?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let bus = EventBus::default();
        let events = bus.subscribe();

        Ok(Self {
            config: config.clone(),
            store,
            classroom,
            bus,
            events,
            rng,
        })
    }

    pub fn classroom(&self) -> &Classroom {
        &self.classroom
    }

    pub fn store_mut(&mut self) -> &mut JsonFileStore {
        &mut self.store
    }

    /// Dispatch `command`, publish its events and save unless nothing
    /// changed.
    pub fn execute(&mut self, command: Command) -> Result<DispatchOutcome> {
        let outcome = self.classroom.dispatch(command, &mut self.rng)?;
        self.bus.publish_dispatch(&self.classroom, &outcome);
        if !outcome.is_noop() {
            self.persist()?;
        }
        Ok(outcome)
    }

    pub fn import(&mut self, data: ImportData) -> Result<ImportReport> {
        let report = self.classroom.import(data, &mut self.rng)?;
        for outcome in &report.outcomes {
            self.bus.publish_dispatch(&self.classroom, outcome);
        }
        if report.changed_anything() {
            self.persist()?;
        }
        Ok(report)
    }

    /// Swap in a whole classroom (backup restore) and save it.
    pub fn replace(&mut self, classroom: Classroom) -> Result<()> {
        self.classroom = classroom;
        self.persist()
    }

    /// Delete all stored data and start over with an empty classroom.
    pub fn reset(&mut self) -> Result<()> {
        ClassroomRepo::clear_all(&mut self.store)?;
        let settings = SettingsRepo::load(&self.store)?;
        self.classroom = Classroom::new(self.config.history_config(&settings));
        Ok(())
    }

    /// Events published since the last call.
    pub fn drain_events(&mut self) -> Vec<ClassroomEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Dropped events while draining");
                }
                Err(_) => break,
            }
        }
        events
    }

    fn persist(&mut self) -> Result<()> {
        if !ClassroomRepo::save_reported(&mut self.store, &self.classroom) {
            bail!("Could not save to {}", self.store.path().display());
        }
        Ok(())
    }
}
