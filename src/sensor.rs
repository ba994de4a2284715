use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::coordinator::Coordinator;
use crate::entity::{
    DeviceInfo, Entity, EntityState, STATE_UNAVAILABLE, STATE_UNKNOWN, ThermostatEntity,
};
use crate::types::Thermostat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureKind {
    /// The manual setpoint.
    Target,
    Comfort,
}

impl TemperatureKind {
    fn key(&self) -> &'static str {
        match self {
            TemperatureKind::Target => "target_temperature",
            TemperatureKind::Comfort => "comfort_temperature",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TemperatureKind::Target => "Target temperature",
            TemperatureKind::Comfort => "Comfort temperature",
        }
    }
}

/// Read-only temperature sensor for one thermostat setpoint.
pub struct TemperatureSensor {
    base: ThermostatEntity,
    kind: TemperatureKind,
}

impl TemperatureSensor {
    pub fn new(coordinator: Coordinator, thermostat: &Thermostat, kind: TemperatureKind) -> Self {
        Self {
            base: ThermostatEntity::new(
                coordinator,
                thermostat,
                kind.key(),
                "sensor",
                Some(kind.name()),
            ),
            kind,
        }
    }

    /// Both temperature sensors for a thermostat.
    pub fn for_thermostat(coordinator: &Coordinator, thermostat: &Thermostat) -> [Self; 2] {
        [
            Self::new(coordinator.clone(), thermostat, TemperatureKind::Target),
            Self::new(coordinator.clone(), thermostat, TemperatureKind::Comfort),
        ]
    }

    pub(crate) fn claim_entity_id(&mut self, taken: &mut HashSet<String>) {
        self.base.claim_entity_id(taken);
    }

    pub fn kind(&self) -> TemperatureKind {
        self.kind
    }

    pub fn native_value(&self) -> Option<f64> {
        let t = self.base.thermostat()?;
        let value = match self.kind {
            TemperatureKind::Target => t.manual_temperature_celsius(),
            TemperatureKind::Comfort => t.comfort_temperature_celsius(),
        };
        Some(value.celsius())
    }
}

impl Entity for TemperatureSensor {
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
        let mut attributes = Map::new();
        attributes.insert("device_class".into(), json!("temperature"));
        attributes.insert("unit_of_measurement".into(), json!("\u{00b0}C"));
        attributes.insert(
            "friendly_name".into(),
            json!(format!("{} {}", self.base.device.name, self.kind.name())),
        );

        let state = if !self.available() {
            STATE_UNAVAILABLE.to_string()
        } else {
            match self.native_value() {
                Some(v) => Value::from(v).to_string(),
                None => STATE_UNKNOWN.to_string(),
            }
        };

        EntityState {
            entity_id: self.entity_id(),
            state,
            attributes,
        }
    }
}
