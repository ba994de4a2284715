use std::collections::HashSet;

use serde_json::{Map, json};

use crate::coordinator::Coordinator;
use crate::entity::{
    DeviceInfo, Entity, EntityState, STATE_OFF, STATE_ON, STATE_UNAVAILABLE, STATE_UNKNOWN,
    ThermostatEntity,
};
use crate::types::Thermostat;

fn render(entity_id: String, available: bool, is_on: Option<bool>, device_class: &str) -> EntityState {
    let mut attributes = Map::new();
    attributes.insert("device_class".into(), json!(device_class));
    let state = match (available, is_on) {
        (false, _) => STATE_UNAVAILABLE,
        (true, Some(true)) => STATE_ON,
        (true, Some(false)) => STATE_OFF,
        (true, None) => STATE_UNKNOWN,
    };
    EntityState {
        entity_id,
        state: state.to_string(),
        attributes,
    }
}

/// On while the thermostat is actively heating. Unavailable while the
/// thermostat is offline.
pub struct HeatingSensor {
    base: ThermostatEntity,
}

impl HeatingSensor {
    pub fn new(coordinator: Coordinator, thermostat: &Thermostat) -> Self {
        Self {
            base: ThermostatEntity::new(
                coordinator,
                thermostat,
                "heating",
                "binary_sensor",
                Some("Heating"),
            ),
        }
    }

    pub(crate) fn claim_entity_id(&mut self, taken: &mut HashSet<String>) {
        self.base.claim_entity_id(taken);
    }

    pub fn is_on(&self) -> Option<bool> {
        self.base.thermostat().map(|t| t.heating)
    }
}

impl Entity for HeatingSensor {
    fn unique_id(&self) -> &str {
        &self.base.unique_id
    }

    fn entity_id(&self) -> String {
        self.base.entity_id.clone()
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.base.device
    }

    fn available(&self) -> bool {
        self.base.device_available()
    }

    fn state(&self) -> EntityState {
        render(self.entity_id(), self.available(), self.is_on(), "heat")
    }
}

/// Reports whether the thermostat is online. Only the coordinator gates its
/// availability, so an offline thermostat shows as "off" rather than
/// unavailable.
pub struct ConnectivitySensor {
    base: ThermostatEntity,
}

impl ConnectivitySensor {
    pub fn new(coordinator: Coordinator, thermostat: &Thermostat) -> Self {
        Self {
            base: ThermostatEntity::new(
                coordinator,
                thermostat,
                "connectivity",
                "binary_sensor",
                Some("Connectivity"),
            ),
        }
    }

    pub(crate) fn claim_entity_id(&mut self, taken: &mut HashSet<String>) {
        self.base.claim_entity_id(taken);
    }

    pub fn is_on(&self) -> Option<bool> {
        self.base.thermostat().map(|t| t.online)
    }
}

impl Entity for ConnectivitySensor {
    fn unique_id(&self) -> &str {
        &self.base.unique_id
    }

    fn entity_id(&self) -> String {
        self.base.entity_id.clone()
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.base.device
    }

    fn available(&self) -> bool {
        self.base.coordinator_available()
    }

    fn state(&self) -> EntityState {
        render(self.entity_id(), self.available(), self.is_on(), "connectivity")
    }
}
