use isg_climate_tools::climate::{ClimateEntity, HeatingCircuit};
use isg_climate_tools::points::{Point, Value};
use isg_climate_tools::snapshot::{ForeignStates, SharedSnapshot, Snapshot, SnapshotFile, Write};
use isg_climate_tools::translate::{Family, HvacMode, Preset};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

fn point(name: &str) -> Point {
    Point::from_name(name).unwrap()
}

fn device(points: serde_json::Value) -> (Arc<SharedSnapshot>, UnboundedReceiver<Write>) {
    let file: SnapshotFile = serde_json::from_value(points).unwrap();
    let (snapshot, writes) = SharedSnapshot::new();
    snapshot.load(file);
    (Arc::new(snapshot), writes)
}

fn circuit(snapshot: &Arc<SharedSnapshot>, family: Family, key: &str) -> ClimateEntity {
    ClimateEntity::new(
        Arc::clone(snapshot) as Arc<dyn Snapshot>,
        Arc::clone(snapshot) as Arc<dyn ForeignStates>,
        family,
        HeatingCircuit::from_key(key).unwrap(),
        "isg",
    )
}

fn drain(writes: &mut UnboundedReceiver<Write>) -> Vec<(String, Value)> {
    std::iter::from_fn(|| writes.try_recv().ok())
        .map(|w| (w.point.name().to_string(), w.value))
        .collect()
}

#[test]
fn eco_setpoint_follows_operation_mode() {
    let (snapshot, mut writes) = device(serde_json::json!({
        "points": {
            "OPERATION_MODE": 4,
            "ECO_TEMPERATURE_TARGET_HK1": 18.5,
            "COMFORT_TEMPERATURE_TARGET_HK1": 21.0,
        }
    }));
    let hk1 = circuit(&snapshot, Family::Wpm, "hk1");
    assert_eq!(hk1.target_temperature(), Some(18.5));
    hk1.set_temperature(19.0);
    assert_eq!(
        drain(&mut writes),
        vec![("ECO_TEMPERATURE_TARGET_HK1".to_string(), Value::Celsius(19.0))]
    );

    // The device switches to "ready"; the comfort setpoint is in effect from then on.
    snapshot.record(point("OPERATION_MODE"), Value::U16(1));
    assert_eq!(hk1.target_temperature(), Some(21.0));
    hk1.set_temperature(21.5);
    assert_eq!(
        drain(&mut writes),
        vec![("COMFORT_TEMPERATURE_TARGET_HK1".to_string(), Value::Celsius(21.5))]
    );
}

#[test]
fn writes_do_not_change_the_snapshot() {
    let (snapshot, mut writes) = device(serde_json::json!({
        "points": { "OPERATION_MODE": 3, "ECO_TEMPERATURE_TARGET_HK2": 17.0 }
    }));
    let hk2 = circuit(&snapshot, Family::Wpm, "climate_hk_2");
    hk2.set_preset_mode(Preset::Eco).unwrap();
    assert_eq!(hk2.current_preset_mode(), Some(Preset::Comfort));
    assert_eq!(
        drain(&mut writes),
        vec![("OPERATION_MODE".to_string(), Value::U16(4))]
    );
    // Until the poller reads the new mode back.
    snapshot.record(point("OPERATION_MODE"), Value::U16(4));
    assert_eq!(hk2.current_preset_mode(), Some(Preset::Eco));
    assert_eq!(hk2.target_temperature(), Some(17.0));
}

#[test]
fn manual_mode_on_lwz() {
    let (snapshot, _writes) = device(serde_json::json!({ "points": { "OPERATION_MODE": 14 } }));
    let hk1 = circuit(&snapshot, Family::Lwz, "hk1");
    assert_eq!(hk1.current_hvac_mode(), Some(HvacMode::Heat));
    assert_eq!(hk1.current_preset_mode(), Some(Preset::Manual));
}

#[test]
fn unrecognized_mode_is_unknown() {
    let (snapshot, _writes) = device(serde_json::json!({ "points": { "OPERATION_MODE": 99 } }));
    for family in [Family::Wpm, Family::Lwz] {
        let state = circuit(&snapshot, family, "hk1").state();
        assert_eq!(state.hvac_mode, None);
        assert_eq!(state.preset_mode, None);
    }
}

#[test]
fn live_temperature_wins_over_remote_unit() {
    let (snapshot, _writes) = device(serde_json::json!({
        "points": { "ACTUAL_TEMPERATURE_FEK": 19.8 },
        "foreign": { "sensor.node_1_network_analog_8": "22.1" },
    }));
    assert_eq!(circuit(&snapshot, Family::Wpm, "hk2").current_temperature(), Some(22.1));
    assert_eq!(circuit(&snapshot, Family::Wpm, "hk1").current_temperature(), Some(19.8));
}

#[test]
fn uninstalled_circuits_start_hidden() {
    let (snapshot, _writes) = device(serde_json::json!({
        "points": {
            "OPERATION_MODE": 3,
            "ECO_TEMPERATURE_TARGET_HK1": 18.0,
            "COMFORT_TEMPERATURE_TARGET_HK1": 21.0,
            "COMFORT_TEMPERATURE_TARGET_HK3": 20.0,
        }
    }));
    let entities = ClimateEntity::for_all_circuits(
        Arc::clone(&snapshot) as Arc<dyn Snapshot>,
        Arc::clone(&snapshot) as Arc<dyn ForeignStates>,
        Family::Wpm,
        "isg",
    );
    let enabled = entities.iter().map(|e| e.enabled_by_default()).collect::<Vec<_>>();
    assert_eq!(enabled, vec![true, false, false]);
    assert_eq!(entities[2].target_temperature(), Some(20.0));
}
