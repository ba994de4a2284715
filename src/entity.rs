use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{DOMAIN, MANUFACTURER, MODEL};
use crate::coordinator::Coordinator;
use crate::types::Thermostat;

pub const STATE_UNAVAILABLE: &str = "unavailable";
pub const STATE_UNKNOWN: &str = "unknown";
pub const STATE_ON: &str = "on";
pub const STATE_OFF: &str = "off";

/// Device registry information shared by every entity of one thermostat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: (String, String),
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
}

impl DeviceInfo {
    pub fn for_thermostat(thermostat: &Thermostat) -> Self {
        Self {
            identifiers: (DOMAIN.to_string(), thermostat.serial_number.clone()),
            name: thermostat.room.clone(),
            manufacturer: MANUFACTURER.to_string(),
            model: MODEL.to_string(),
            sw_version: thermostat.sw_version.clone(),
        }
    }
}

/// Rendered state of an entity: the state string plus its attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    pub attributes: Map<String, Value>,
}

impl EntityState {
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

pub trait Entity {
    fn unique_id(&self) -> &str;
    fn entity_id(&self) -> String;
    fn device_info(&self) -> &DeviceInfo;
    fn available(&self) -> bool;
    fn state(&self) -> EntityState;
}

/// Shared part of every thermostat entity: which record it shows and how to
/// reach the coordinator.
#[derive(Clone)]
pub(crate) struct ThermostatEntity {
    pub coordinator: Coordinator,
    pub serial_number: String,
    pub unique_id: String,
    pub device: DeviceInfo,
    pub entity_id: String,
}

impl ThermostatEntity {
    pub fn new(
        coordinator: Coordinator,
        thermostat: &Thermostat,
        kind: &str,
        platform: &str,
        suffix: Option<&str>,
    ) -> Self {
        let base = slugify(&thermostat.room);
        let entity_id = match suffix {
            Some(s) => format!("{platform}.{base}_{}", slugify(s)),
            None => format!("{platform}.{base}"),
        };
        Self {
            coordinator,
            serial_number: thermostat.serial_number.clone(),
            unique_id: format!("{}_{kind}", thermostat.serial_number),
            device: DeviceInfo::for_thermostat(thermostat),
            entity_id,
        }
    }

    pub fn thermostat(&self) -> Option<Thermostat> {
        self.coordinator.thermostat(&self.serial_number)
    }

    /// Availability from the coordinator alone.
    pub fn coordinator_available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    /// Coordinator availability and the thermostat reporting itself online.
    pub fn device_available(&self) -> bool {
        self.coordinator_available() && self.thermostat().is_some_and(|t| t.online)
    }

    /// Record the entity id in `taken`, appending `_2`, `_3`, ... when another
    /// entity of the entry already uses it.
    pub fn claim_entity_id(&mut self, taken: &mut HashSet<String>) {
        let mut candidate = self.entity_id.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{}_{n}", self.entity_id);
            n += 1;
        }
        taken.insert(candidate.clone());
        self.entity_id = candidate;
    }
}

/// ASCII slug with underscores, as used in entity ids.
pub(crate) fn slugify(s: &str) -> String {
    let slug = slug::slugify(s).replace('-', "_");
    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug
    }
}
