use crate::points::{Point, Value, point};
use crate::snapshot::{ForeignStates, Snapshot};
use crate::translate::{self, FanLevel, Family, HvacMode, Preset};
use std::sync::Arc;
use tracing::debug;

pub const DOMAIN: &str = "stiebel_eltron_isg";
pub const TRANSLATION_KEY: &str = "climate";
pub const TEMPERATURE_UNIT: &str = "°C";
pub const TARGET_TEMPERATURE_MIN: f32 = 5.0;
pub const TARGET_TEMPERATURE_MAX: f32 = 30.0;
pub const TARGET_TEMPERATURE_STEP: f32 = 0.1;

const OPERATION_MODE: Point = point!("OPERATION_MODE");
const ACTUAL_TEMPERATURE_FEK: Point = point!("ACTUAL_TEMPERATURE_FEK");
const ACTUAL_HUMIDITY: Point = point!("ACTUAL_HUMIDITY");
const FAN_LEVEL_DAY: Point = point!("FAN_LEVEL_DAY");

/// One of the heating circuits an ISG can control.
pub struct HeatingCircuit {
    pub key: &'static str,
    pub name: &'static str,
    pub eco_target: Point,
    pub comfort_target: Point,
    /// Entity ID of the live room temperature reading for this circuit.
    pub live_temperature: &'static str,
}

pub static HEATING_CIRCUITS: [HeatingCircuit; 3] = [
    HeatingCircuit {
        key: "climate_hk_1",
        name: "Heat Circuit 1",
        eco_target: point!("ECO_TEMPERATURE_TARGET_HK1"),
        comfort_target: point!("COMFORT_TEMPERATURE_TARGET_HK1"),
        live_temperature: "sensor.node_1_network_analog_7",
    },
    HeatingCircuit {
        key: "climate_hk_2",
        name: "Heat Circuit 2",
        eco_target: point!("ECO_TEMPERATURE_TARGET_HK2"),
        comfort_target: point!("COMFORT_TEMPERATURE_TARGET_HK2"),
        live_temperature: "sensor.node_1_network_analog_8",
    },
    HeatingCircuit {
        key: "climate_hk_3",
        name: "Heat Circuit 3",
        eco_target: point!("ECO_TEMPERATURE_TARGET_HK3"),
        comfort_target: point!("COMFORT_TEMPERATURE_TARGET_HK3"),
        live_temperature: "sensor.node_1_network_analog_9",
    },
];

impl HeatingCircuit {
    /// Find a circuit by its key (`climate_hk_1`) or its short form (`hk1`).
    pub fn from_key(key: &str) -> Option<&'static HeatingCircuit> {
        HEATING_CIRCUITS.iter().find(|circuit| {
            let short = circuit.key.trim_start_matches("climate_").replace('_', "");
            circuit.key == key || short == key
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{family:?} heat pumps do not support the `{mode}` HVAC mode")]
    UnsupportedHvacMode { family: Family, mode: HvacMode },
    #[error("{family:?} heat pumps do not support the `{preset}` preset")]
    UnsupportedPreset { family: Family, preset: Preset },
    #[error("{family:?} heat pumps do not support setting the fan to `{level}`")]
    UnsupportedFanMode { family: Family, level: FanLevel },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, serde::Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    TargetTemperature,
    PresetMode,
    FanMode,
}

/// Everything readable from a [`ClimateEntity`] at one point in time.
#[derive(serde::Serialize, Debug, PartialEq)]
pub struct ClimateState {
    pub unique_id: String,
    pub name: &'static str,
    pub enabled_by_default: bool,
    pub hvac_mode: Option<HvacMode>,
    pub preset_mode: Option<Preset>,
    pub fan_mode: Option<FanLevel>,
    pub target_temperature: Option<f32>,
    pub current_temperature: Option<f32>,
    pub current_humidity: Option<f32>,
}

/// The climate control surface of a single heating circuit.
///
/// Holds no state of its own: every read goes to the snapshot and every change is a single
/// write request, so a read right after a change may still observe the old state.
pub struct ClimateEntity {
    snapshot: Arc<dyn Snapshot>,
    foreign: Arc<dyn ForeignStates>,
    family: Family,
    circuit: &'static HeatingCircuit,
    device_name: String,
}

impl ClimateEntity {
    pub fn new(
        snapshot: Arc<dyn Snapshot>,
        foreign: Arc<dyn ForeignStates>,
        family: Family,
        circuit: &'static HeatingCircuit,
        device_name: impl Into<String>,
    ) -> Self {
        Self {
            snapshot,
            foreign,
            family,
            circuit,
            device_name: device_name.into(),
        }
    }

    pub fn for_all_circuits(
        snapshot: Arc<dyn Snapshot>,
        foreign: Arc<dyn ForeignStates>,
        family: Family,
        device_name: &str,
    ) -> Vec<ClimateEntity> {
        HEATING_CIRCUITS
            .iter()
            .map(|circuit| {
                Self::new(
                    Arc::clone(&snapshot),
                    Arc::clone(&foreign),
                    family,
                    circuit,
                    device_name,
                )
            })
            .collect()
    }

    pub fn unique_id(&self) -> String {
        format!("{DOMAIN}_{}_{}", self.device_name, self.circuit.key)
    }

    pub fn name(&self) -> &'static str {
        self.circuit.name
    }

    pub fn circuit(&self) -> &'static HeatingCircuit {
        self.circuit
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        self.family.hvac_modes()
    }

    pub fn preset_modes(&self) -> &'static [Preset] {
        self.family.presets()
    }

    pub fn fan_modes(&self) -> &'static [FanLevel] {
        self.family.fan_levels()
    }

    pub fn supported_features(&self) -> Vec<Feature> {
        let mut features = vec![Feature::TargetTemperature, Feature::PresetMode];
        if self.family.has_fan() {
            features.push(Feature::FanMode);
        }
        features
    }

    /// Circuits whose eco setpoint was never reported are not installed and start out hidden.
    pub fn enabled_by_default(&self) -> bool {
        self.snapshot.get(self.circuit.eco_target).is_some()
    }

    fn operation_mode(&self) -> Option<u16> {
        let value = self.snapshot.get(OPERATION_MODE)?;
        let code = value.as_code();
        if code.is_none() {
            debug!(%value, circuit = self.circuit.key, "operation mode is not a code");
        }
        code
    }

    /// The setpoint currently in effect.
    ///
    /// Eco applies only while the device reports the eco operation mode. Anything else, including
    /// an operation mode that was never read, selects comfort.
    fn active_setpoint(&self) -> Point {
        if self.operation_mode() == Some(self.family.eco_code()) {
            self.circuit.eco_target
        } else {
            self.circuit.comfort_target
        }
    }

    fn write(&self, point: Point, value: Value) {
        debug!(
            point = point.name(),
            %value,
            circuit = self.circuit.key,
            "requesting a write"
        );
        self.snapshot.set(point, value);
    }

    pub fn current_hvac_mode(&self) -> Option<HvacMode> {
        let code = self.operation_mode()?;
        let mode = translate::hvac_from_device(self.family, code);
        if mode.is_none() {
            debug!(code, family = ?self.family, "unrecognized operation mode for HVAC mode");
        }
        mode
    }

    pub fn set_hvac_mode(&self, mode: HvacMode) -> Result<(), Error> {
        let code = translate::device_from_hvac(self.family, mode).ok_or(
            Error::UnsupportedHvacMode {
                family: self.family,
                mode,
            },
        )?;
        self.write(OPERATION_MODE, Value::U16(code));
        Ok(())
    }

    pub fn current_preset_mode(&self) -> Option<Preset> {
        let code = self.operation_mode()?;
        let preset = translate::preset_from_device(self.family, code);
        if preset.is_none() {
            debug!(code, family = ?self.family, "unrecognized operation mode for preset");
        }
        preset
    }

    pub fn set_preset_mode(&self, preset: Preset) -> Result<(), Error> {
        let code = translate::device_from_preset(self.family, preset).ok_or(
            Error::UnsupportedPreset {
                family: self.family,
                preset,
            },
        )?;
        self.write(OPERATION_MODE, Value::U16(code));
        Ok(())
    }

    /// The day fan level, for families with a ventilation fan.
    pub fn current_fan_mode(&self) -> Option<FanLevel> {
        if !self.family.has_fan() {
            return None;
        }
        let code = self.snapshot.get(FAN_LEVEL_DAY)?.as_code()?;
        let level = translate::fan_from_device(code);
        if level.is_none() {
            debug!(code, "unrecognized fan level");
        }
        level
    }

    pub fn set_fan_mode(&self, level: FanLevel) -> Result<(), Error> {
        if !self.family.fan_levels().contains(&level) {
            return Err(Error::UnsupportedFanMode {
                family: self.family,
                level,
            });
        }
        self.write(FAN_LEVEL_DAY, Value::U16(translate::device_from_fan(level)));
        Ok(())
    }

    pub fn target_temperature(&self) -> Option<f32> {
        self.snapshot.get(self.active_setpoint()).map(|v| v.as_f32())
    }

    /// Change whichever setpoint is currently in effect.
    ///
    /// The value is forwarded as is; limits are enforced by the device.
    pub fn set_temperature(&self, temperature: f32) {
        self.write(self.active_setpoint(), Value::Celsius(temperature));
    }

    /// The live room temperature if available, otherwise the temperature at the remote unit.
    pub fn current_temperature(&self) -> Option<f32> {
        if let Some(state) = self.foreign.state(self.circuit.live_temperature) {
            match state.trim().parse::<f32>() {
                Ok(temperature) if temperature.is_finite() => return Some(temperature),
                _ => debug!(
                    entity_id = self.circuit.live_temperature,
                    %state,
                    "live temperature is not a number"
                ),
            }
        }
        self.snapshot.get(ACTUAL_TEMPERATURE_FEK).map(|v| v.as_f32())
    }

    pub fn current_humidity(&self) -> Option<f32> {
        self.snapshot.get(ACTUAL_HUMIDITY).map(|v| v.as_f32())
    }

    pub fn state(&self) -> ClimateState {
        ClimateState {
            unique_id: self.unique_id(),
            name: self.name(),
            enabled_by_default: self.enabled_by_default(),
            hvac_mode: self.current_hvac_mode(),
            preset_mode: self.current_preset_mode(),
            fan_mode: self.current_fan_mode(),
            target_temperature: self.target_temperature(),
            current_temperature: self.current_temperature(),
            current_humidity: self.current_humidity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDevice {
        values: Mutex<BTreeMap<Point, Value>>,
        foreign: Mutex<BTreeMap<String, String>>,
        writes: Mutex<Vec<(Point, Value)>>,
    }

    impl FakeDevice {
        fn with(values: &[(Point, Value)]) -> Arc<Self> {
            let device = Self::default();
            device.values.lock().unwrap().extend(values.iter().copied());
            Arc::new(device)
        }

        fn writes(&self) -> Vec<(Point, Value)> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl Snapshot for FakeDevice {
        fn get(&self, point: Point) -> Option<Value> {
            self.values.lock().unwrap().get(&point).copied()
        }
        fn set(&self, point: Point, value: Value) {
            self.writes.lock().unwrap().push((point, value));
        }
    }

    impl ForeignStates for FakeDevice {
        fn state(&self, entity_id: &str) -> Option<String> {
            self.foreign.lock().unwrap().get(entity_id).cloned()
        }
    }

    fn entity(device: &Arc<FakeDevice>, family: Family, circuit: usize) -> ClimateEntity {
        ClimateEntity::new(
            Arc::clone(device) as _,
            Arc::clone(device) as _,
            family,
            &HEATING_CIRCUITS[circuit],
            "isg",
        )
    }

    const ECO_HK1: Point = point!("ECO_TEMPERATURE_TARGET_HK1");
    const COMFORT_HK1: Point = point!("COMFORT_TEMPERATURE_TARGET_HK1");

    #[test]
    fn eco_mode_selects_eco_setpoint() {
        for family in [Family::Wpm, Family::Lwz] {
            let device = FakeDevice::with(&[
                (OPERATION_MODE, Value::U16(4)),
                (ECO_HK1, Value::Celsius(18.5)),
                (COMFORT_HK1, Value::Celsius(21.0)),
            ]);
            let climate = entity(&device, family, 0);
            assert_eq!(climate.target_temperature(), Some(18.5));
            climate.set_temperature(19.0);
            assert_eq!(device.writes(), vec![(ECO_HK1, Value::Celsius(19.0))]);
        }
    }

    #[test]
    fn other_modes_select_comfort_setpoint() {
        let cases: [(Family, &[u16]); 2] = [
            (Family::Wpm, &[0, 1, 2, 3, 5]),
            (Family::Lwz, &[0, 1, 3, 5, 11, 14]),
        ];
        for (family, codes) in cases {
            for &code in codes {
                let device = FakeDevice::with(&[
                    (OPERATION_MODE, Value::U16(code)),
                    (ECO_HK1, Value::Celsius(18.5)),
                    (COMFORT_HK1, Value::Celsius(21.0)),
                ]);
                let climate = entity(&device, family, 0);
                assert_eq!(climate.target_temperature(), Some(21.0), "{family:?} {code}");
                climate.set_temperature(22.5);
                assert_eq!(device.writes(), vec![(COMFORT_HK1, Value::Celsius(22.5))]);
            }
        }
    }

    #[test]
    fn missing_operation_mode_selects_comfort() {
        let device = FakeDevice::with(&[
            (ECO_HK1, Value::Celsius(18.5)),
            (COMFORT_HK1, Value::Celsius(21.0)),
        ]);
        let climate = entity(&device, Family::Wpm, 0);
        assert_eq!(climate.current_hvac_mode(), None);
        assert_eq!(climate.current_preset_mode(), None);
        assert_eq!(climate.target_temperature(), Some(21.0));
        climate.set_temperature(20.0);
        assert_eq!(device.writes(), vec![(COMFORT_HK1, Value::Celsius(20.0))]);
    }

    #[test]
    fn missing_setpoint_is_unknown_not_zero() {
        let device = FakeDevice::with(&[(OPERATION_MODE, Value::U16(3))]);
        let climate = entity(&device, Family::Wpm, 0);
        assert_eq!(climate.target_temperature(), None);
    }

    #[test]
    fn manual_code_projects_onto_heat_and_manual() {
        let device = FakeDevice::with(&[(OPERATION_MODE, Value::U16(14))]);
        let climate = entity(&device, Family::Lwz, 0);
        assert_eq!(climate.current_hvac_mode(), Some(HvacMode::Heat));
        assert_eq!(climate.current_preset_mode(), Some(Preset::Manual));
    }

    #[test]
    fn unrecognized_code_is_unknown() {
        let device = FakeDevice::with(&[(OPERATION_MODE, Value::U16(99))]);
        let climate = entity(&device, Family::Wpm, 0);
        assert_eq!(climate.current_hvac_mode(), None);
        assert_eq!(climate.current_preset_mode(), None);
    }

    #[test]
    fn set_modes_write_canonical_codes() {
        let device = FakeDevice::with(&[]);
        let wpm = entity(&device, Family::Wpm, 1);
        wpm.set_hvac_mode(HvacMode::Auto).unwrap();
        wpm.set_hvac_mode(HvacMode::Off).unwrap();
        wpm.set_preset_mode(Preset::Program).unwrap();
        let lwz = entity(&device, Family::Lwz, 1);
        lwz.set_hvac_mode(HvacMode::Auto).unwrap();
        lwz.set_hvac_mode(HvacMode::Heat).unwrap();
        lwz.set_preset_mode(Preset::Auto).unwrap();
        let codes = device
            .writes()
            .into_iter()
            .map(|(point, value)| {
                assert_eq!(point, OPERATION_MODE);
                value
            })
            .collect::<Vec<_>>();
        assert_eq!(
            codes,
            [2, 5, 2, 11, 14, 11].map(Value::U16).to_vec()
        );
    }

    #[test]
    fn unsupported_requests_are_rejected() {
        let device = FakeDevice::with(&[(OPERATION_MODE, Value::U16(3))]);
        let wpm = entity(&device, Family::Wpm, 0);
        assert!(matches!(
            wpm.set_hvac_mode(HvacMode::Heat),
            Err(Error::UnsupportedHvacMode { family: Family::Wpm, mode: HvacMode::Heat })
        ));
        assert!(matches!(
            wpm.set_preset_mode(Preset::Manual),
            Err(Error::UnsupportedPreset { .. })
        ));
        assert!(matches!(
            wpm.set_fan_mode(FanLevel::Low),
            Err(Error::UnsupportedFanMode { .. })
        ));
        let lwz = entity(&device, Family::Lwz, 0);
        assert!(lwz.set_preset_mode(Preset::Program).is_err());
        assert!(device.writes().is_empty());
    }

    #[test]
    fn fan_mode() {
        let device = FakeDevice::with(&[(FAN_LEVEL_DAY, Value::U16(2))]);
        let lwz = entity(&device, Family::Lwz, 0);
        assert_eq!(lwz.current_fan_mode(), Some(FanLevel::Medium));
        lwz.set_fan_mode(FanLevel::High).unwrap();
        assert_eq!(device.writes(), vec![(FAN_LEVEL_DAY, Value::U16(3))]);
        assert_eq!(entity(&device, Family::Wpm, 0).current_fan_mode(), None);
    }

    #[test]
    fn live_temperature_overrides_remote_unit() {
        let device = FakeDevice::with(&[(ACTUAL_TEMPERATURE_FEK, Value::Celsius(20.1))]);
        let climate = entity(&device, Family::Wpm, 0);
        assert_eq!(climate.current_temperature(), Some(20.1));
        device
            .foreign
            .lock()
            .unwrap()
            .insert("sensor.node_1_network_analog_7".into(), "22.4".into());
        assert_eq!(climate.current_temperature(), Some(22.4));
        // Other circuits read their own sensor.
        assert_eq!(entity(&device, Family::Wpm, 1).current_temperature(), Some(20.1));
    }

    #[test]
    fn unparsable_live_temperature_falls_back() {
        let device = FakeDevice::with(&[(ACTUAL_TEMPERATURE_FEK, Value::Celsius(20.1))]);
        device
            .foreign
            .lock()
            .unwrap()
            .insert("sensor.node_1_network_analog_7".into(), "unavailable".into());
        assert_eq!(entity(&device, Family::Wpm, 0).current_temperature(), Some(20.1));
    }

    #[test]
    fn circuits_without_eco_setpoint_are_hidden() {
        let device = FakeDevice::with(&[
            (OPERATION_MODE, Value::U16(3)),
            (COMFORT_HK1, Value::Celsius(21.0)),
            (ACTUAL_HUMIDITY, Value::Percent(45.0)),
        ]);
        let climate = entity(&device, Family::Wpm, 0);
        assert!(!climate.enabled_by_default());
        assert_eq!(climate.target_temperature(), Some(21.0));
        assert_eq!(climate.current_humidity(), Some(45.0));
    }

    #[test]
    fn identity_and_metadata() {
        let device = FakeDevice::with(&[]);
        let climate = entity(&device, Family::Lwz, 2);
        assert_eq!(climate.unique_id(), "stiebel_eltron_isg_isg_climate_hk_3");
        assert_eq!(climate.name(), "Heat Circuit 3");
        assert_eq!(
            climate.supported_features(),
            vec![Feature::TargetTemperature, Feature::PresetMode, Feature::FanMode]
        );
        assert_eq!(climate.hvac_modes().len(), 3);
        let wpm = entity(&device, Family::Wpm, 0);
        assert_eq!(wpm.supported_features().len(), 2);
        assert!(wpm.fan_modes().is_empty());
    }

    #[test]
    fn circuit_lookup() {
        assert_eq!(HeatingCircuit::from_key("climate_hk_2").unwrap().name, "Heat Circuit 2");
        assert_eq!(HeatingCircuit::from_key("hk3").unwrap().key, "climate_hk_3");
        assert!(HeatingCircuit::from_key("hk4").is_none());
    }
}
