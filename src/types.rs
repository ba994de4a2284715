use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Temperature stored as Celsius internally.
/// The cloud API carries temperatures as integer hundredths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Temperature(f64);

impl Temperature {
    pub fn from_celsius(c: f64) -> Self {
        Self(c)
    }

    /// Construct from the API's fixed-point representation (`2150` is 21.5°C).
    pub fn from_centi(value: i32) -> Self {
        Self(value as f64 / 100.0)
    }

    pub fn celsius(&self) -> f64 {
        self.0
    }

    /// Round to the API's fixed-point representation.
    pub fn to_centi(&self) -> i32 {
        (self.0 * 100.0).round() as i32
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}\u{00b0}C", self.0)
    }
}

/// Vendor-side operating mode of a thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulationMode {
    #[default]
    Off,
    Manual,
    Boost,
    Schedule,
}

impl RegulationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegulationMode::Off => "off",
            RegulationMode::Manual => "manual",
            RegulationMode::Boost => "boost",
            RegulationMode::Schedule => "schedule",
        }
    }

    /// Host HVAC mode shown for this regulation mode. Boost is a heat preset.
    pub fn hvac_mode(&self) -> HvacMode {
        match self {
            RegulationMode::Off => HvacMode::Off,
            RegulationMode::Manual | RegulationMode::Boost => HvacMode::Heat,
            RegulationMode::Schedule => HvacMode::Auto,
        }
    }

    /// Regulation mode requested by a host HVAC mode. Anything the device has
    /// no equivalent for falls back to manual.
    pub fn from_hvac_mode(mode: HvacMode) -> Self {
        match mode {
            HvacMode::Off => RegulationMode::Off,
            HvacMode::Auto => RegulationMode::Schedule,
            HvacMode::Heat
            | HvacMode::Cool
            | HvacMode::HeatCool
            | HvacMode::Dry
            | HvacMode::FanOnly => RegulationMode::Manual,
        }
    }
}

impl fmt::Display for RegulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host climate vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    HeatCool,
    Auto,
    Dry,
    FanOnly,
}

impl HvacMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::HeatCool => "heat_cool",
            HvacMode::Auto => "auto",
            HvacMode::Dry => "dry",
            HvacMode::FanOnly => "fan_only",
        }
    }
}

impl FromStr for HvacMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(HvacMode::Off),
            "heat" => Ok(HvacMode::Heat),
            "cool" => Ok(HvacMode::Cool),
            "heat_cool" => Ok(HvacMode::HeatCool),
            "auto" => Ok(HvacMode::Auto),
            "dry" => Ok(HvacMode::Dry),
            "fan_only" => Ok(HvacMode::FanOnly),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacAction {
    Off,
    Heating,
    Idle,
}

impl HvacAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacAction::Off => "off",
            HvacAction::Heating => "heating",
            HvacAction::Idle => "idle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Boost,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Boost => "boost",
        }
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boost" => Ok(Preset::Boost),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

/// One thermostat as last reported by the cloud. Temperatures are in
/// hundredths of a degree Celsius.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thermostat {
    pub serial_number: String,
    pub room: String,
    pub group_name: String,
    pub group_id: u32,
    pub online: bool,
    pub heating: bool,
    pub temperature: i32,
    pub regulation_mode: RegulationMode,
    pub manual_temperature: i32,
    pub comfort_temperature: i32,
    pub boost_room_temp: i32,
    pub boost_floor_temp: i32,
    pub frost_temperature: i32,
    pub min_temp: i32,
    pub max_temp: i32,
    pub error_code: i32,
    pub sw_version: String,
}

impl Thermostat {
    pub fn temperature_celsius(&self) -> Temperature {
        Temperature::from_centi(self.temperature)
    }

    pub fn manual_temperature_celsius(&self) -> Temperature {
        Temperature::from_centi(self.manual_temperature)
    }

    pub fn comfort_temperature_celsius(&self) -> Temperature {
        Temperature::from_centi(self.comfort_temperature)
    }

    pub fn boost_room_temp_celsius(&self) -> Temperature {
        Temperature::from_centi(self.boost_room_temp)
    }

    pub fn min_temp_celsius(&self) -> Temperature {
        Temperature::from_centi(self.min_temp)
    }

    pub fn max_temp_celsius(&self) -> Temperature {
        Temperature::from_centi(self.max_temp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub group_name: String,
    pub group_id: u32,
    pub group_color: String,
    pub thermostats: Vec<Thermostat>,
}

/// Every thermostat on the account, grouped as the cloud groups them.
/// Serial numbers are unique across all groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub groups: Vec<Group>,
}

impl Snapshot {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn thermostats(&self) -> impl Iterator<Item = &Thermostat> {
        self.groups.iter().flat_map(|g| g.thermostats.iter())
    }

    pub fn thermostat(&self, serial: &str) -> Option<&Thermostat> {
        self.thermostats().find(|t| t.serial_number == serial)
    }

    /// Replace the first record whose serial matches `record`. Returns false
    /// when no record matches.
    pub fn replace(&mut self, record: Thermostat) -> bool {
        for group in &mut self.groups {
            if let Some(slot) = group
                .thermostats
                .iter_mut()
                .find(|t| t.serial_number == record.serial_number)
            {
                *slot = record;
                return true;
            }
        }
        false
    }

    /// Serial numbers that appear more than once, in first-seen order.
    pub fn duplicate_serials(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut dups = Vec::new();
        for t in self.thermostats() {
            if !seen.insert(t.serial_number.as_str()) && !dups.contains(&t.serial_number) {
                dups.push(t.serial_number.clone());
            }
        }
        dups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(serial: &str) -> Thermostat {
        Thermostat {
            serial_number: serial.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn replace_first_match_only() {
        let mut snapshot = Snapshot::new(vec![
            Group {
                group_id: 1,
                thermostats: vec![record("a"), record("b")],
                ..Default::default()
            },
            Group {
                group_id: 2,
                thermostats: vec![record("b")],
                ..Default::default()
            },
        ]);

        let mut updated = record("b");
        updated.heating = true;
        assert!(snapshot.replace(updated));
        assert!(snapshot.groups[0].thermostats[1].heating);
        assert!(!snapshot.groups[1].thermostats[0].heating);
        assert_eq!(snapshot.duplicate_serials(), vec!["b".to_string()]);
    }

    #[test]
    fn replace_unknown_leaves_snapshot() {
        let mut snapshot = Snapshot::new(vec![Group {
            thermostats: vec![record("a")],
            ..Default::default()
        }]);
        let before = snapshot.clone();
        assert!(!snapshot.replace(record("zzz")));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn regulation_mode_serializes_lowercase() {
        let json = serde_json::to_value(RegulationMode::Schedule).unwrap();
        assert_eq!(json, "schedule");
        let mode: RegulationMode = serde_json::from_value(serde_json::json!("boost")).unwrap();
        assert_eq!(mode, RegulationMode::Boost);
    }

    #[test]
    fn thermostat_missing_fields_default() {
        let t: Thermostat =
            serde_json::from_value(serde_json::json!({"serial_number": "42", "online": true}))
                .unwrap();
        assert_eq!(t.serial_number, "42");
        assert!(t.online);
        assert_eq!(t.regulation_mode, RegulationMode::Off);
    }
}
