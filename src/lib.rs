mod binary_sensor;
mod client;
mod climate;
mod config;
mod coordinator;
mod diff;
mod entity;
mod error;
mod integration;
mod journal;
mod sensor;
mod types;

pub use binary_sensor::{ConnectivitySensor, HeatingSensor};
pub use client::{ClientFactory, ErrorCallback, ThermostatApi, UpdateCallback};
pub use climate::{ClimateFeatures, HVAC_MODES, PRESET_MODES, ThermostatClimate};
pub use config::*;
pub use coordinator::{Coordinator, CoordinatorBuilder, ListenerId, Reconciled};
pub use entity::{DeviceInfo, Entity, EntityState, STATE_OFF, STATE_ON, STATE_UNAVAILABLE, STATE_UNKNOWN};
pub use error::{Error, Result};
pub use integration::{EntryContext, Integration, PLATFORMS, Platform};
pub use journal::JournalMode;
pub use sensor::{TemperatureKind, TemperatureSensor};
pub use types::*;
