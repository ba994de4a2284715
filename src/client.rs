use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Credentials;
use crate::types::{Snapshot, Thermostat};
use crate::{Error, Result};

/// Called with a fresh record each time the cloud pushes a thermostat change.
pub type UpdateCallback = Box<dyn Fn(Thermostat) + Send + Sync>;
/// Called when the push channel reports a transport failure.
pub type ErrorCallback = Box<dyn Fn(Error) + Send + Sync>;

/// Builds a client for a set of credentials. Setup and the config flow go
/// through this so callers decide which implementation backs an entry.
pub type ClientFactory = dyn Fn(&Credentials) -> Arc<dyn ThermostatApi> + Send + Sync;

/// Cloud client for Senz thermostats.
///
/// Authentication, HTTP and the push transport live behind this trait.
/// Failures are reported as [`Error::Authentication`] for rejected credentials
/// and [`Error::Communication`] for everything else.
#[async_trait]
pub trait ThermostatApi: Send + Sync {
    async fn authenticate(&self) -> Result<()>;

    async fn get_thermostats(&self) -> Result<Snapshot>;

    /// Push a complete record, e.g. after changing its regulation mode.
    async fn update_thermostat(&self, serial: &str, thermostat: &Thermostat) -> Result<()>;

    async fn set_manual_temperature(&self, serial: &str, celsius: f64) -> Result<()>;

    async fn turn_off(&self, serial: &str) -> Result<()>;

    async fn start_boost(&self, serial: &str) -> Result<()>;

    async fn start_monitoring(
        &self,
        on_update: UpdateCallback,
        on_error: ErrorCallback,
    ) -> Result<()>;

    async fn stop_monitoring(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
