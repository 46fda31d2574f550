use crate::climate::DOMAIN;
use crate::points::{DataType, Point, Value, point};
use crate::snapshot::Snapshot;
use crate::translate::Family;
use std::sync::Arc;
use tracing::debug;

/// A point exposed directly as an adjustable number.
pub struct NumberDescription {
    pub point: Point,
    pub name: &'static str,
    pub icon: &'static str,
}

macro_rules! numbers {
    ($({ $name: literal: $point: literal, icon $icon: literal },)*) => {
        &[$(NumberDescription {
            point: point!($point),
            name: $name,
            icon: $icon,
        },)*]
    }
}

pub static NUMBERS_ALL: &[NumberDescription] = numbers![
    { "Comfort Temperature Target HK1": "COMFORT_TEMPERATURE_TARGET_HK1", icon "hass:thermometer" },
    { "Eco Temperature Target HK1": "ECO_TEMPERATURE_TARGET_HK1", icon "hass:thermometer" },
    { "Comfort Temperature Target HK2": "COMFORT_TEMPERATURE_TARGET_HK2", icon "hass:thermometer" },
    { "Eco Temperature Target HK2": "ECO_TEMPERATURE_TARGET_HK2", icon "hass:thermometer" },
    { "Comfort Temperature Target HK3": "COMFORT_TEMPERATURE_TARGET_HK3", icon "hass:thermometer" },
    { "Eco Temperature Target HK3": "ECO_TEMPERATURE_TARGET_HK3", icon "hass:thermometer" },
    { "Comfort Water Temperature Target": "COMFORT_WATER_TEMPERATURE_TARGET", icon "hass:thermometer" },
    { "Eco Water Temperature Target": "ECO_WATER_TEMPERATURE_TARGET", icon "hass:thermometer" },
    { "Area Cooling Room Temperature Target": "AREA_COOLING_TARGET_ROOM_TEMPERATURE", icon "hass:thermometer" },
    { "Area Cooling Flow Temperature Target": "AREA_COOLING_TARGET_FLOW_TEMPERATURE", icon "hass:thermometer" },
    { "Fan Cooling Room Temperature Target": "FAN_COOLING_TARGET_ROOM_TEMPERATURE", icon "hass:thermometer" },
    { "Fan Cooling Flow Temperature Target": "FAN_COOLING_TARGET_FLOW_TEMPERATURE", icon "hass:thermometer" },
];

pub static NUMBERS_WPM: &[NumberDescription] = numbers![
    { "Heating Curve Rise HK1": "HEATING_CURVE_RISE_HK1", icon "hass:thermometer" },
    { "Heating Curve Rise HK2": "HEATING_CURVE_RISE_HK2", icon "hass:thermometer" },
    { "Heating Curve Rise HK3": "HEATING_CURVE_RISE_HK3", icon "hass:thermometer" },
];

pub static NUMBERS_LWZ: &[NumberDescription] = numbers![
    { "Fan Level Day": "FAN_LEVEL_DAY", icon "mdi:fan" },
    { "Fan Level Night": "FAN_LEVEL_NIGHT", icon "mdi:fan" },
];

/// Numbers exposed for `family`.
///
/// The fan levels are exposed regardless of family, WPM installations simply never report them.
pub fn descriptions_for(family: Family) -> impl Iterator<Item = &'static NumberDescription> {
    let wpm: &'static [NumberDescription] = match family {
        Family::Wpm => NUMBERS_WPM,
        Family::Lwz => &[],
    };
    NUMBERS_ALL.iter().chain(wpm).chain(NUMBERS_LWZ)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{point} holds {expected} values, got a {actual} value")]
    WrongDataType {
        point: Point,
        expected: DataType,
        actual: DataType,
    },
    #[error("{0} is read-only")]
    ReadOnly(Point),
}

#[derive(serde::Serialize, Debug, PartialEq)]
pub struct NumberState {
    pub unique_id: String,
    pub name: &'static str,
    pub available: bool,
    pub value: Option<Value>,
    pub minimum: Option<Value>,
    pub maximum: Option<Value>,
    pub step: Option<f32>,
    pub unit: &'static str,
}

pub struct NumberEntity {
    snapshot: Arc<dyn Snapshot>,
    description: &'static NumberDescription,
    device_name: String,
}

impl NumberEntity {
    pub fn new(
        snapshot: Arc<dyn Snapshot>,
        description: &'static NumberDescription,
        device_name: impl Into<String>,
    ) -> Self {
        Self {
            snapshot,
            description,
            device_name: device_name.into(),
        }
    }

    pub fn for_family(
        snapshot: Arc<dyn Snapshot>,
        family: Family,
        device_name: &str,
    ) -> Vec<NumberEntity> {
        descriptions_for(family)
            .map(|description| Self::new(Arc::clone(&snapshot), description, device_name))
            .collect()
    }

    pub fn point(&self) -> Point {
        self.description.point
    }

    pub fn unique_id(&self) -> String {
        let key = self.description.point.name().to_lowercase();
        format!("{DOMAIN}_{}_{key}", self.device_name)
    }

    pub fn native_value(&self) -> Option<Value> {
        self.snapshot.get(self.description.point)
    }

    pub fn available(&self) -> bool {
        self.native_value().is_some()
    }

    /// Request the point to be changed to `value`, which is not checked against the limits.
    pub fn set_native_value(&self, value: Value) -> Result<(), Error> {
        let point = self.description.point;
        if !point.mode().is_writable() {
            return Err(Error::ReadOnly(point));
        }
        if value.data_type() != point.data_type() {
            return Err(Error::WrongDataType {
                point,
                expected: point.data_type(),
                actual: value.data_type(),
            });
        }
        debug!(point = point.name(), %value, "requesting a write");
        self.snapshot.set(point, value);
        Ok(())
    }

    pub fn state(&self) -> NumberState {
        let point = self.description.point;
        let value = self.native_value();
        NumberState {
            unique_id: self.unique_id(),
            name: self.description.name,
            available: value.is_some(),
            value,
            minimum: point.minimum_value(),
            maximum: point.maximum_value(),
            step: point.step(),
            unit: point.data_type().unit(),
        }
    }
}
