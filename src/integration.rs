use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::binary_sensor::{ConnectivitySensor, HeatingSensor};
use crate::client::{ClientFactory, ThermostatApi};
use crate::climate::ThermostatClimate;
use crate::config::ConfigEntry;
use crate::coordinator::Coordinator;
use crate::entity::{Entity, EntityState};
use crate::sensor::TemperatureSensor;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Climate,
    Sensor,
    BinarySensor,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Climate => "climate",
            Platform::Sensor => "sensor",
            Platform::BinarySensor => "binary_sensor",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const PLATFORMS: [Platform; 3] = [Platform::Climate, Platform::Sensor, Platform::BinarySensor];

/// Everything that lives for as long as one config entry is loaded.
pub struct EntryContext {
    entry: ConfigEntry,
    coordinator: Coordinator,
    climates: Vec<ThermostatClimate>,
    sensors: Vec<TemperatureSensor>,
    binary_sensors: Vec<Box<dyn Entity + Send + Sync>>,
    entity_ids: HashSet<String>,
    poller: Option<JoinHandle<()>>,
}

impl EntryContext {
    pub fn entry(&self) -> &ConfigEntry {
        &self.entry
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn climates(&self) -> &[ThermostatClimate] {
        &self.climates
    }

    pub fn climate(&self, entity_id: &str) -> Option<&ThermostatClimate> {
        self.climates.iter().find(|c| c.entity_id() == entity_id)
    }

    pub fn sensors(&self) -> &[TemperatureSensor] {
        &self.sensors
    }

    pub fn entities(&self, platform: Platform) -> Vec<&dyn Entity> {
        match platform {
            Platform::Climate => self.climates.iter().map(|e| e as &dyn Entity).collect(),
            Platform::Sensor => self.sensors.iter().map(|e| e as &dyn Entity).collect(),
            Platform::BinarySensor => self
                .binary_sensors
                .iter()
                .map(|e| e.as_ref() as &dyn Entity)
                .collect(),
        }
    }

    pub fn states(&self) -> Vec<EntityState> {
        PLATFORMS
            .iter()
            .flat_map(|p| self.entities(*p))
            .map(|e| e.state())
            .collect()
    }

    pub fn state(&self, entity_id: &str) -> Option<EntityState> {
        PLATFORMS
            .iter()
            .flat_map(|p| self.entities(*p))
            .find(|e| e.entity_id() == entity_id)
            .map(|e| e.state())
    }

    fn setup_platform(&mut self, platform: Platform) {
        let thermostats = self.coordinator.thermostats();
        let taken = &mut self.entity_ids;
        for thermostat in &thermostats {
            match platform {
                Platform::Climate => {
                    let mut climate = ThermostatClimate::new(self.coordinator.clone(), thermostat);
                    climate.claim_entity_id(taken);
                    self.climates.push(climate);
                }
                Platform::Sensor => {
                    let sensors = TemperatureSensor::for_thermostat(&self.coordinator, thermostat);
                    for mut sensor in sensors {
                        sensor.claim_entity_id(taken);
                        self.sensors.push(sensor);
                    }
                }
                Platform::BinarySensor => {
                    let mut heating = HeatingSensor::new(self.coordinator.clone(), thermostat);
                    heating.claim_entity_id(taken);
                    self.binary_sensors.push(Box::new(heating));

                    let mut connectivity =
                        ConnectivitySensor::new(self.coordinator.clone(), thermostat);
                    connectivity.claim_entity_id(taken);
                    self.binary_sensors.push(Box::new(connectivity));
                }
            }
        }
        debug!(platform = %platform, count = thermostats.len(), "platform set up");
    }

    fn unload_platforms(&mut self) {
        self.climates.clear();
        self.sensors.clear();
        self.binary_sensors.clear();
        self.entity_ids.clear();
    }
}

impl Drop for EntryContext {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

/// Loaded config entries, keyed by entry id.
pub struct Integration {
    factory: Arc<ClientFactory>,
    entries: HashMap<String, EntryContext>,
}

impl Integration {
    pub fn new(factory: Arc<ClientFactory>) -> Self {
        Self {
            factory,
            entries: HashMap::new(),
        }
    }

    pub fn entry(&self, entry_id: &str) -> Option<&EntryContext> {
        self.entries.get(entry_id)
    }

    pub fn is_loaded(&self, entry_id: &str) -> bool {
        self.entries.contains_key(entry_id)
    }

    pub fn entry_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Authenticate, fetch the first snapshot, start push monitoring and
    /// create the entities for one entry. Invalid options are rejected before
    /// a client is created; any later failure closes the client.
    pub async fn setup_entry(&mut self, entry: ConfigEntry) -> Result<&EntryContext> {
        if self.entries.contains_key(&entry.entry_id) {
            return Err(Error::InvalidConfig(format!(
                "entry {} is already loaded",
                entry.entry_id
            )));
        }

        let update_interval = entry.options.update_interval()?;
        let client = (self.factory)(&entry.data);

        if let Err(e) = client.authenticate().await {
            close_client(client.as_ref()).await;
            return Err(Error::AuthFailed(e.to_string()));
        }

        let mut builder = Coordinator::builder(client.clone())
            .name(entry.title.clone())
            .update_interval(update_interval);
        if let Some(path) = &entry.options.message_log {
            builder = builder.message_log(entry.options.message_log_mode, path.clone());
        }
        let coordinator = match builder.build() {
            Ok(c) => c,
            Err(e) => {
                close_client(client.as_ref()).await;
                return Err(e);
            }
        };

        if let Err(e) = coordinator.first_refresh().await {
            close_client(client.as_ref()).await;
            return Err(e);
        }

        if let Err(e) = coordinator.start_monitoring().await {
            close_client(client.as_ref()).await;
            return Err(e);
        }

        let mut context = EntryContext {
            entry,
            coordinator: coordinator.clone(),
            climates: Vec::new(),
            sensors: Vec::new(),
            binary_sensors: Vec::new(),
            entity_ids: HashSet::new(),
            poller: None,
        };
        for platform in PLATFORMS {
            context.setup_platform(platform);
        }
        context.poller = Some(tokio::spawn(coordinator.run()));

        let entry_id = context.entry.entry_id.clone();
        info!(entry_id = %entry_id, title = %context.entry.title, "entry loaded");
        let context = self.entries.entry(entry_id).or_insert(context);
        Ok(&*context)
    }

    /// Unload an entry. Returns false when the entry was not loaded.
    pub async fn unload_entry(&mut self, entry_id: &str) -> Result<bool> {
        let Some(mut context) = self.entries.remove(entry_id) else {
            return Ok(false);
        };

        context.unload_platforms();
        if let Some(poller) = context.poller.take() {
            poller.abort();
        }
        context.coordinator.stop_monitoring().await;
        context.coordinator.client().close().await?;

        info!(entry_id = %entry_id, "entry unloaded");
        Ok(true)
    }
}

async fn close_client(client: &dyn ThermostatApi) {
    if let Err(e) = client.close().await {
        warn!("error closing client: {e}");
    }
}
