use std::collections::HashSet;
use std::ops::BitOr;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::coordinator::Coordinator;
use crate::entity::{DeviceInfo, Entity, EntityState, STATE_UNAVAILABLE, ThermostatEntity};
use crate::types::{HvacAction, HvacMode, Preset, RegulationMode, Thermostat};
use crate::Result;

const DEFAULT_MIN_TEMP: f64 = 5.0;
const DEFAULT_MAX_TEMP: f64 = 35.0;

pub const HVAC_MODES: [HvacMode; 3] = [HvacMode::Off, HvacMode::Heat, HvacMode::Auto];
pub const PRESET_MODES: [Preset; 1] = [Preset::Boost];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateFeatures(u32);

impl ClimateFeatures {
    pub const TARGET_TEMPERATURE: Self = Self(1);
    pub const PRESET_MODE: Self = Self(16);
    pub const TURN_OFF: Self = Self(128);
    pub const TURN_ON: Self = Self(256);

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ClimateFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Climate entity for one thermostat.
pub struct ThermostatClimate {
    base: ThermostatEntity,
}

impl ThermostatClimate {
    pub fn new(coordinator: Coordinator, thermostat: &Thermostat) -> Self {
        Self {
            base: ThermostatEntity::new(coordinator, thermostat, "climate", "climate", None),
        }
    }

    pub(crate) fn claim_entity_id(&mut self, taken: &mut HashSet<String>) {
        self.base.claim_entity_id(taken);
    }

    pub fn serial_number(&self) -> &str {
        &self.base.serial_number
    }

    pub fn supported_features(&self) -> ClimateFeatures {
        ClimateFeatures::TARGET_TEMPERATURE
            | ClimateFeatures::TURN_OFF
            | ClimateFeatures::TURN_ON
            | ClimateFeatures::PRESET_MODE
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        &HVAC_MODES
    }

    pub fn preset_modes(&self) -> &'static [Preset] {
        &PRESET_MODES
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.base.thermostat().map(|t| t.temperature_celsius().celsius())
    }

    /// In boost the thermostat heats to the boost room temperature, so that
    /// is what gets shown as the target.
    pub fn target_temperature(&self) -> Option<f64> {
        self.base.thermostat().map(|t| match t.regulation_mode {
            RegulationMode::Boost => t.boost_room_temp_celsius().celsius(),
            _ => t.manual_temperature_celsius().celsius(),
        })
    }

    pub fn min_temp(&self) -> f64 {
        self.base
            .thermostat()
            .map_or(DEFAULT_MIN_TEMP, |t| t.min_temp_celsius().celsius())
    }

    pub fn max_temp(&self) -> f64 {
        self.base
            .thermostat()
            .map_or(DEFAULT_MAX_TEMP, |t| t.max_temp_celsius().celsius())
    }

    pub fn hvac_mode(&self) -> HvacMode {
        self.base
            .thermostat()
            .map_or(HvacMode::Off, |t| t.regulation_mode.hvac_mode())
    }

    pub fn hvac_action(&self) -> Option<HvacAction> {
        self.base.thermostat().map(|t| {
            if t.regulation_mode == RegulationMode::Off {
                HvacAction::Off
            } else if t.heating {
                HvacAction::Heating
            } else {
                HvacAction::Idle
            }
        })
    }

    pub fn preset_mode(&self) -> Option<Preset> {
        self.base
            .thermostat()
            .filter(|t| t.regulation_mode == RegulationMode::Boost)
            .map(|_| Preset::Boost)
    }

    /// Set the manual target. `None` (no temperature in the service call) is a no-op.
    pub async fn set_temperature(&self, temperature: Option<f64>) -> Result<()> {
        let Some(temperature) = temperature else {
            return Ok(());
        };
        let serial = &self.base.serial_number;
        debug!(serial = %serial, temperature, "setting temperature");
        self.base
            .coordinator
            .client()
            .set_manual_temperature(serial, temperature)
            .await?;
        self.base.coordinator.request_refresh().await;
        Ok(())
    }

    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<()> {
        let serial = &self.base.serial_number;
        debug!(serial = %serial, mode = %mode, "setting HVAC mode");

        let Some(mut thermostat) = self.base.thermostat() else {
            return Ok(());
        };

        let client = self.base.coordinator.client();
        if mode == HvacMode::Off {
            client.turn_off(serial).await?;
        } else {
            thermostat.regulation_mode = RegulationMode::from_hvac_mode(mode);
            client.update_thermostat(serial, &thermostat).await?;
        }

        self.base.coordinator.request_refresh().await;
        Ok(())
    }

    /// Unknown presets are ignored.
    pub async fn set_preset_mode(&self, preset: &str) -> Result<()> {
        let serial = &self.base.serial_number;
        debug!(serial = %serial, preset, "setting preset mode");

        if self.base.thermostat().is_none() {
            return Ok(());
        }

        if let Ok(Preset::Boost) = preset.parse::<Preset>() {
            self.base.coordinator.client().start_boost(serial).await?;
            self.base.coordinator.request_refresh().await;
        }
        Ok(())
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.set_hvac_mode(HvacMode::Heat).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.set_hvac_mode(HvacMode::Off).await
    }
}

impl Entity for ThermostatClimate {
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
        attributes.insert(
            "hvac_modes".into(),
            json!(HVAC_MODES.iter().map(|m| m.as_str()).collect::<Vec<_>>()),
        );
        attributes.insert(
            "preset_modes".into(),
            json!(PRESET_MODES.iter().map(|p| p.as_str()).collect::<Vec<_>>()),
        );
        attributes.insert("min_temp".into(), json!(self.min_temp()));
        attributes.insert("max_temp".into(), json!(self.max_temp()));
        attributes.insert("supported_features".into(), json!(self.supported_features().bits()));

        let state = if self.available() {
            attributes.insert("current_temperature".into(), json!(self.current_temperature()));
            attributes.insert("temperature".into(), json!(self.target_temperature()));
            attributes.insert(
                "hvac_action".into(),
                json!(self.hvac_action().map(|a| a.as_str())),
            );
            attributes.insert(
                "preset_mode".into(),
                self.preset_mode().map_or(Value::Null, |p| json!(p.as_str())),
            );
            self.hvac_mode().as_str().to_string()
        } else {
            STATE_UNAVAILABLE.to_string()
        };

        EntityState {
            entity_id: self.entity_id(),
            state,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_combine() {
        let f = ClimateFeatures::TARGET_TEMPERATURE | ClimateFeatures::PRESET_MODE;
        assert!(f.contains(ClimateFeatures::PRESET_MODE));
        assert!(!f.contains(ClimateFeatures::TURN_ON));
        assert_eq!(f.bits(), 17);
    }

    #[test]
    fn mode_mapping_both_ways() {
        assert_eq!(RegulationMode::Off.hvac_mode(), HvacMode::Off);
        assert_eq!(RegulationMode::Manual.hvac_mode(), HvacMode::Heat);
        assert_eq!(RegulationMode::Boost.hvac_mode(), HvacMode::Heat);
        assert_eq!(RegulationMode::Schedule.hvac_mode(), HvacMode::Auto);

        assert_eq!(RegulationMode::from_hvac_mode(HvacMode::Off), RegulationMode::Off);
        assert_eq!(RegulationMode::from_hvac_mode(HvacMode::Heat), RegulationMode::Manual);
        assert_eq!(RegulationMode::from_hvac_mode(HvacMode::Auto), RegulationMode::Schedule);
        assert_eq!(RegulationMode::from_hvac_mode(HvacMode::Cool), RegulationMode::Manual);
    }
}
