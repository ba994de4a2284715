mod common;

use std::sync::Arc;

use common::{MockClient, config_entry, factory, offline_thermostat, snapshot, thermostat};
use pentair_senz::{Entity, Integration, Platform, TemperatureKind, Thermostat};

const TARGET: &str = "sensor.living_room_target_temperature";
const COMFORT: &str = "sensor.living_room_comfort_temperature";
const HEATING: &str = "binary_sensor.living_room_heating";
const CONNECTIVITY: &str = "binary_sensor.living_room_connectivity";

async fn loaded(record: Thermostat) -> (Integration, Arc<MockClient>) {
    let client = MockClient::new(snapshot(vec![record]));
    let mut integration = Integration::new(factory(client.clone()));
    integration.setup_entry(config_entry()).await.unwrap();
    (integration, client)
}

fn state(integration: &Integration, entity_id: &str) -> String {
    integration
        .entry("test_entry_id")
        .unwrap()
        .state(entity_id)
        .unwrap_or_else(|| panic!("no entity {entity_id}"))
        .state
}

#[tokio::test]
async fn sensor_entities() {
    let (integration, _client) = loaded(thermostat()).await;

    assert_eq!(state(&integration, TARGET), "21.0");
    assert_eq!(state(&integration, COMFORT), "22.0");

    let entry = integration.entry("test_entry_id").unwrap();
    let sensors = entry.sensors();
    assert_eq!(sensors.len(), 2);
    assert_eq!(sensors[0].kind(), TemperatureKind::Target);
    assert_eq!(sensors[0].unique_id(), "1234567_target_temperature");
    assert_eq!(sensors[1].native_value(), Some(22.0));

    let attrs = entry.state(TARGET).unwrap().attributes;
    assert_eq!(attrs["device_class"], "temperature");
    assert_eq!(attrs["unit_of_measurement"], "\u{00b0}C");
}

#[tokio::test]
async fn target_sensor_ignores_boost() {
    let (integration, _client) = loaded(common::boost_thermostat()).await;
    assert_eq!(state(&integration, TARGET), "21.0");
}

#[tokio::test]
async fn sensor_unavailable_when_offline() {
    let (integration, _client) = loaded(offline_thermostat()).await;
    assert_eq!(state(&integration, TARGET), "unavailable");
    assert_eq!(state(&integration, COMFORT), "unavailable");
}

#[tokio::test]
async fn binary_sensor_entities() {
    let (integration, _client) = loaded(thermostat()).await;

    assert_eq!(state(&integration, HEATING), "on");
    assert_eq!(state(&integration, CONNECTIVITY), "on");

    let entry = integration.entry("test_entry_id").unwrap();
    let ids: Vec<String> = entry
        .entities(Platform::BinarySensor)
        .iter()
        .map(|e| e.unique_id().to_string())
        .collect();
    assert_eq!(ids, vec!["1234567_heating", "1234567_connectivity"]);
    assert_eq!(entry.state(CONNECTIVITY).unwrap().attributes["device_class"], "connectivity");
}

#[tokio::test]
async fn heating_sensor_off_when_not_heating() {
    let (integration, _client) = loaded(Thermostat {
        heating: false,
        ..thermostat()
    })
    .await;
    assert_eq!(state(&integration, HEATING), "off");
}

#[tokio::test]
async fn connectivity_off_and_heating_unavailable_when_offline() {
    let (integration, _client) = loaded(offline_thermostat()).await;
    assert_eq!(state(&integration, CONNECTIVITY), "off");
    assert_eq!(state(&integration, HEATING), "unavailable");
}

#[tokio::test]
async fn push_flips_heating_sensor() {
    let (integration, client) = loaded(thermostat()).await;
    assert_eq!(state(&integration, HEATING), "on");

    client.push(Thermostat {
        heating: false,
        ..thermostat()
    });

    assert_eq!(state(&integration, HEATING), "off");
    assert_eq!(state(&integration, CONNECTIVITY), "on");
}

#[tokio::test]
async fn everything_unavailable_after_failed_refresh() {
    let (integration, client) = loaded(thermostat()).await;
    MockClient::fail(&client.fail_fetch);
    integration
        .entry("test_entry_id")
        .unwrap()
        .coordinator()
        .request_refresh()
        .await;

    for id in [TARGET, COMFORT, HEATING, CONNECTIVITY, "climate.living_room"] {
        assert_eq!(state(&integration, id), "unavailable", "{id}");
    }
}
