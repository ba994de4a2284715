#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pentair_senz::{
    ClientFactory, ConfigEntry, Credentials, Error, ErrorCallback, Group, RegulationMode, Result,
    Snapshot, Thermostat, ThermostatApi, UpdateCallback,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Authenticate,
    GetThermostats,
    UpdateThermostat(String, Thermostat),
    SetManualTemperature(String, f64),
    TurnOff(String),
    StartBoost(String),
    StartMonitoring,
    StopMonitoring,
    Close,
}

/// Records every call and serves a fixed snapshot.
#[derive(Default)]
pub struct MockClient {
    calls: Mutex<Vec<Call>>,
    snapshot: Mutex<Snapshot>,
    on_update: Mutex<Option<UpdateCallback>>,
    on_error: Mutex<Option<ErrorCallback>>,
    pub fail_auth: AtomicBool,
    pub fail_connect: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fail_monitoring: AtomicBool,
    pub fail_stop: AtomicBool,
}

impl MockClient {
    pub fn new(snapshot: Snapshot) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(snapshot),
            ..Default::default()
        })
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn fail(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn fetches(&self) -> usize {
        self.count(&Call::GetThermostats)
    }

    /// Deliver a push notification through the registered callback.
    pub fn push(&self, record: Thermostat) {
        let guard = self.on_update.lock().unwrap();
        let callback = guard.as_ref().expect("monitoring not started");
        callback(record);
    }

    pub fn push_error(&self, err: Error) {
        let guard = self.on_error.lock().unwrap();
        let callback = guard.as_ref().expect("monitoring not started");
        callback(err);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ThermostatApi for MockClient {
    async fn authenticate(&self) -> Result<()> {
        self.record(Call::Authenticate);
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(Error::Authentication("Invalid credentials".into()));
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(Error::Communication("Connection error".into()));
        }
        Ok(())
    }

    async fn get_thermostats(&self) -> Result<Snapshot> {
        self.record(Call::GetThermostats);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Error::Communication("API Error".into()));
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn update_thermostat(&self, serial: &str, thermostat: &Thermostat) -> Result<()> {
        self.record(Call::UpdateThermostat(serial.to_string(), thermostat.clone()));
        Ok(())
    }

    async fn set_manual_temperature(&self, serial: &str, celsius: f64) -> Result<()> {
        self.record(Call::SetManualTemperature(serial.to_string(), celsius));
        Ok(())
    }

    async fn turn_off(&self, serial: &str) -> Result<()> {
        self.record(Call::TurnOff(serial.to_string()));
        Ok(())
    }

    async fn start_boost(&self, serial: &str) -> Result<()> {
        self.record(Call::StartBoost(serial.to_string()));
        Ok(())
    }

    async fn start_monitoring(&self, on_update: UpdateCallback, on_error: ErrorCallback) -> Result<()> {
        self.record(Call::StartMonitoring);
        if self.fail_monitoring.load(Ordering::SeqCst) {
            return Err(Error::Communication("push channel refused".into()));
        }
        *self.on_update.lock().unwrap() = Some(on_update);
        *self.on_error.lock().unwrap() = Some(on_error);
        Ok(())
    }

    async fn stop_monitoring(&self) -> Result<()> {
        self.record(Call::StopMonitoring);
        self.on_update.lock().unwrap().take();
        self.on_error.lock().unwrap().take();
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(Error::Communication("already disconnected".into()));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}

pub fn factory(client: Arc<MockClient>) -> Arc<ClientFactory> {
    Arc::new(move |_: &Credentials| -> Arc<dyn ThermostatApi> { client.clone() })
}

pub fn thermostat() -> Thermostat {
    Thermostat {
        serial_number: "1234567".to_string(),
        room: "Living Room".to_string(),
        group_name: "Home".to_string(),
        group_id: 1,
        online: true,
        heating: true,
        temperature: 2150,
        regulation_mode: RegulationMode::Manual,
        manual_temperature: 2100,
        comfort_temperature: 2200,
        boost_room_temp: 2200,
        boost_floor_temp: 2700,
        frost_temperature: 500,
        min_temp: 500,
        max_temp: 3500,
        error_code: 0,
        sw_version: "1.2.3".to_string(),
    }
}

pub fn offline_thermostat() -> Thermostat {
    Thermostat {
        online: false,
        heating: false,
        ..thermostat()
    }
}

pub fn boost_thermostat() -> Thermostat {
    Thermostat {
        regulation_mode: RegulationMode::Boost,
        boost_room_temp: 2500,
        ..thermostat()
    }
}

pub fn snapshot(thermostats: Vec<Thermostat>) -> Snapshot {
    Snapshot::new(vec![Group {
        group_name: "Home".to_string(),
        group_id: 1,
        group_color: "#FF0000".to_string(),
        thermostats,
    }])
}

pub fn config_entry() -> ConfigEntry {
    let mut entry = ConfigEntry::new(Credentials::new("test@example.com", "test_password"));
    entry.entry_id = "test_entry_id".to_string();
    entry
}
