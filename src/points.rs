#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// Small unsigned enumeration or level value.
    Code,
    Celsius,
    /// Relative humidity.
    Percent,
    /// Dimensionless decimal, such as the heating curve rise.
    Factor,
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("`{0}` is not a valid unsigned integer")]
    Code(String, #[source] std::num::ParseIntError),
    #[error("`{0}` is not a valid decimal number")]
    Decimal(String, #[source] std::num::ParseFloatError),
}

impl DataType {
    // Convenience aliases for the nicely tabulated `for_each_point` macro definition below.
    pub const CODE: Self = Self::Code;
    pub const CEL: Self = Self::Celsius;
    pub const PCT: Self = Self::Percent;
    pub const FAC: Self = Self::Factor;

    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Code | Self::Factor => "",
            Self::Celsius => "°C",
            Self::Percent => "%",
        }
    }

    pub fn parse(self, value: &str) -> Result<Value, ParseError> {
        let value = value.trim();
        let decimal = || {
            value
                .parse::<f32>()
                .map_err(|e| ParseError::Decimal(value.to_string(), e))
        };
        Ok(match self {
            Self::Code => Value::U16(
                value
                    .parse()
                    .map_err(|e| ParseError::Code(value.to_string(), e))?,
            ),
            Self::Celsius => Value::Celsius(decimal()?),
            Self::Percent => Value::Percent(decimal()?),
            Self::Factor => Value::Factor(decimal()?),
        })
    }

    /// Interpret a number stored in a snapshot file.
    ///
    /// Integral decimals such as `4.0` are accepted for code points.
    pub fn from_json(self, value: &serde_json::Value) -> Option<Value> {
        let number = value.as_f64()?;
        Some(match self {
            Self::Code => {
                if number.fract() != 0.0 || number < 0.0 || number > f64::from(u16::MAX) {
                    return None;
                }
                Value::U16(number as u16)
            }
            Self::Celsius => Value::Celsius(number as f32),
            Self::Percent => Value::Percent(number as f32),
            Self::Factor => Value::Factor(number as f32),
        })
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Code => "code",
            Self::Celsius => "celsius",
            Self::Percent => "percent",
            Self::Factor => "factor",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    U16(u16),
    Celsius(f32),
    Percent(f32),
    Factor(f32),
}

impl Value {
    #[allow(non_snake_case)]
    const fn CODE(val: u16) -> Self {
        Self::U16(val)
    }
    #[allow(non_snake_case)]
    const fn CEL(val: f32) -> Self {
        Self::Celsius(val)
    }
    #[allow(non_snake_case)]
    const fn FAC(val: f32) -> Self {
        Self::Factor(val)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::U16(_) => DataType::Code,
            Value::Celsius(_) => DataType::Celsius,
            Value::Percent(_) => DataType::Percent,
            Value::Factor(_) => DataType::Factor,
        }
    }

    /// The integer code, if this is a code value.
    pub fn as_code(&self) -> Option<u16> {
        match *self {
            Value::U16(n) => Some(n),
            Value::Celsius(_) | Value::Percent(_) | Value::Factor(_) => None,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match *self {
            Value::U16(n) => f32::from(n),
            Value::Celsius(n) | Value::Percent(n) | Value::Factor(n) => n,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Value::U16(n) => f.write_fmt(format_args!("{}", n)),
            Value::Celsius(n) | Value::Percent(n) | Value::Factor(n) => {
                f.write_fmt(format_args!("{}", n))
            }
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Value::U16(n) => serializer.serialize_u16(n),
            Value::Celsius(n) | Value::Percent(n) | Value::Factor(n) => {
                serializer.serialize_f32(n)
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Mode(u8);

impl serde::Serialize for Mode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.0 & Self::R.0 == 0 { "-" } else { "R" })?;
        f.write_str(if self.0 & Self::W.0 == 0 { "-" } else { "W" })?;
        Ok(())
    }
}

impl Mode {
    pub const R: Self = Self(1 << 0);
    pub const W: Self = Self(1 << 1);
    pub const RW: Self = Self(Self::R.0 | Self::W.0);
    const R_: Self = Self::R;

    pub fn is_writable(&self) -> bool {
        self.0 & Self::W.0 != 0
    }
}

/// A named data point of the ISG gateway.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point(usize);

impl Point {
    pub const fn from_name(name: &str) -> Option<Point> {
        let mut index = 0;
        while index < NAMES.len() {
            if str_eq(NAMES[index], name) {
                return Some(Self(index));
            }
            index += 1;
        }
        None
    }

    pub fn all() -> impl Iterator<Item = Point> {
        (0..NAMES.len()).map(Self)
    }

    pub const fn index(&self) -> usize {
        self.0
    }

    pub fn name(&self) -> &'static str {
        NAMES[self.0]
    }

    pub fn data_type(&self) -> DataType {
        DATA_TYPES[self.0]
    }

    pub fn mode(&self) -> Mode {
        MODES[self.0]
    }

    pub fn minimum_value(&self) -> Option<Value> {
        MINIMUM_VALUES[self.0]
    }

    pub fn maximum_value(&self) -> Option<Value> {
        MAXIMUM_VALUES[self.0]
    }

    pub fn step(&self) -> Option<f32> {
        STEPS[self.0]
    }

    pub fn description(&self) -> &'static str {
        DESCRIPTIONS[self.0]
    }
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl serde::Serialize for Point {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut index = 0;
    while index < a.len() {
        if a[index] != b[index] {
            return false;
        }
        index += 1;
    }
    true
}

/// Look up a point by its name at compile time.
macro_rules! point {
    ($name: literal) => {
        const {
            match $crate::points::Point::from_name($name) {
                Some(point) => point,
                None => panic!(concat!("no point named ", $name)),
            }
        }
    };
}

pub(crate) use point;

macro_rules! for_each_point {
    ($m:ident) => {
        $m! {
            CODE, RW, "OPERATION_MODE", "Operating mode of the heat pump";
            CEL, R_, "ACTUAL_TEMPERATURE", "Actual room temperature reported by the heat pump";
            CEL, R_, "ACTUAL_TEMPERATURE_FEK", "Actual temperature at the remote control unit (FEK)";
            PCT, R_, "ACTUAL_HUMIDITY", "Actual relative humidity at the remote control unit";
            CEL, RW, "COMFORT_TEMPERATURE_TARGET_HK1", "Comfort room temperature target of heating circuit 1", min = 5.0, max = 30.0, step = 0.1;
            CEL, RW, "ECO_TEMPERATURE_TARGET_HK1", "Eco room temperature target of heating circuit 1", min = 5.0, max = 30.0, step = 0.1;
            FAC, RW, "HEATING_CURVE_RISE_HK1", "Heating curve rise of heating circuit 1", min = 0.0, max = 3.0, step = 0.01;
            CEL, RW, "COMFORT_TEMPERATURE_TARGET_HK2", "Comfort room temperature target of heating circuit 2", min = 5.0, max = 30.0, step = 0.1;
            CEL, RW, "ECO_TEMPERATURE_TARGET_HK2", "Eco room temperature target of heating circuit 2", min = 5.0, max = 30.0, step = 0.1;
            FAC, RW, "HEATING_CURVE_RISE_HK2", "Heating curve rise of heating circuit 2", min = 0.0, max = 3.0, step = 0.01;
            CEL, RW, "COMFORT_TEMPERATURE_TARGET_HK3", "Comfort room temperature target of heating circuit 3", min = 5.0, max = 30.0, step = 0.1;
            CEL, RW, "ECO_TEMPERATURE_TARGET_HK3", "Eco room temperature target of heating circuit 3", min = 5.0, max = 30.0, step = 0.1;
            FAC, RW, "HEATING_CURVE_RISE_HK3", "Heating curve rise of heating circuit 3", min = 0.0, max = 3.0, step = 0.01;
            CEL, RW, "COMFORT_WATER_TEMPERATURE_TARGET", "Comfort domestic hot water temperature target", min = 10.0, max = 75.0, step = 0.1;
            CEL, RW, "ECO_WATER_TEMPERATURE_TARGET", "Eco domestic hot water temperature target", min = 10.0, max = 75.0, step = 0.1;
            CEL, RW, "AREA_COOLING_TARGET_ROOM_TEMPERATURE", "Room temperature target for area cooling", min = 20.0, max = 30.0, step = 0.1;
            CEL, RW, "AREA_COOLING_TARGET_FLOW_TEMPERATURE", "Flow temperature target for area cooling", min = 7.0, max = 25.0, step = 0.1;
            CEL, RW, "FAN_COOLING_TARGET_ROOM_TEMPERATURE", "Room temperature target for fan cooling", min = 20.0, max = 30.0, step = 0.1;
            CEL, RW, "FAN_COOLING_TARGET_FLOW_TEMPERATURE", "Flow temperature target for fan cooling", min = 7.0, max = 25.0, step = 0.1;
            CODE, RW, "FAN_LEVEL_DAY", "Ventilation fan level during the day. 0=Off, 1=Low, 2=Medium, 3=High", min = 0, max = 3, step = 1.0;
            CODE, RW, "FAN_LEVEL_NIGHT", "Ventilation fan level during the night. 0=Off, 1=Low, 2=Medium, 3=High", min = 0, max = 3, step = 1.0;
        }
    };
}

macro_rules! optional {
    () => {
        None
    };
    ($($lit: tt)+) => {
        Some($($lit)*)
    };
}

macro_rules! make_lists {
    ($($dt: ident, $mode: ident, $name: literal, $description: literal $(, min = $min: literal)? $(, max = $max: literal)? $(, step = $step: literal)?;)+) => {
        pub const NAMES: &[&str] = &[$($name),*];
        pub static MODES: &[Mode] = &[$(Mode::$mode),*];
        pub static DATA_TYPES: &[DataType] = &[$(DataType::$dt),*];
        pub static MINIMUM_VALUES: &[Option<Value>] = &[$(optional!($(Value::$dt($min))?)),*];
        pub static MAXIMUM_VALUES: &[Option<Value>] = &[$(optional!($(Value::$dt($max))?)),*];
        pub static STEPS: &[Option<f32>] = &[$(optional!($($step)?)),*];
        pub static DESCRIPTIONS: &[&str] = &[$($description),*];
    };
}

for_each_point!(make_lists);

const _ASSERT_NAMES_UNIQUE: () = const {
    let mut idx = 0;
    while idx < NAMES.len() {
        let mut other = idx + 1;
        while other < NAMES.len() {
            assert!(!str_eq(NAMES[idx], NAMES[other]), "duplicate point name");
            other += 1;
        }
        idx += 1;
    }
};
