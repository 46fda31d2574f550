use crate::climate::ClimateEntity;
use crate::number::NumberEntity;
use crate::snapshot::{self, ForeignStates, SharedSnapshot, Snapshot, Write};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not load the snapshot")]
    Snapshot(#[source] snapshot::Error),
    #[error("could not output the results")]
    Output(#[source] crate::output::Error),
}

struct Device {
    snapshot: Arc<SharedSnapshot>,
    writes: UnboundedReceiver<Write>,
    args: snapshot::Args,
}

impl Device {
    fn load(args: snapshot::Args) -> Result<Self, Error> {
        let (snapshot, writes) = args.to_snapshot().map_err(Error::Snapshot)?;
        Ok(Self { snapshot: Arc::new(snapshot), writes, args })
    }

    fn climate_entities(&self) -> Vec<ClimateEntity> {
        ClimateEntity::for_all_circuits(
            Arc::clone(&self.snapshot) as Arc<dyn Snapshot>,
            Arc::clone(&self.snapshot) as Arc<dyn ForeignStates>,
            self.args.family,
            &self.args.name,
        )
    }

    fn number_entities(&self) -> Vec<NumberEntity> {
        NumberEntity::for_family(
            Arc::clone(&self.snapshot) as Arc<dyn Snapshot>,
            self.args.family,
            &self.args.name,
        )
    }
}

pub mod points {
    use crate::output::{self, cell};
    use crate::points::{Mode, Point, Value};

    /// Search and output known ISG points.
    #[derive(clap::Parser)]
    pub struct Args {
        /// Only list points whose name or description contains this text.
        filter: Option<String>,
        #[clap(flatten)]
        output: output::Args,
    }

    #[derive(serde::Serialize)]
    pub struct PointSchema {
        pub name: &'static str,
        pub data_type: String,
        pub mode: Mode,
        pub minimum: Option<Value>,
        pub maximum: Option<Value>,
        pub step: Option<f32>,
        pub unit: &'static str,
        pub description: &'static str,
    }

    impl PointSchema {
        pub fn new(point: Point) -> Self {
            PointSchema {
                name: point.name(),
                data_type: point.data_type().to_string(),
                mode: point.mode(),
                minimum: point.minimum_value(),
                maximum: point.maximum_value(),
                step: point.step(),
                unit: point.data_type().unit(),
                description: point.description(),
            }
        }

        pub fn is_match(&self, pattern: &str) -> bool {
            let pattern = pattern.to_uppercase();
            self.name.contains(&pattern) || self.description.to_uppercase().contains(&pattern)
        }
    }

    pub fn run(args: Args) -> Result<(), super::Error> {
        let headers = vec!["Name", "Type", "Mode", "Min", "Max", "Step", "Unit", "Description"];
        let mut output = args.output.to_output(headers).map_err(super::Error::Output)?;
        for schema in Point::all().map(PointSchema::new) {
            if let Some(pattern) = &args.filter {
                if !schema.is_match(pattern) {
                    continue;
                }
            }
            output
                .result(
                    || {
                        vec![
                            schema.name.to_string(),
                            schema.data_type.clone(),
                            schema.mode.to_string(),
                            cell(schema.minimum),
                            cell(schema.maximum),
                            cell(schema.step),
                            schema.unit.to_string(),
                            schema.description.to_string(),
                        ]
                    },
                    || &schema,
                )
                .map_err(super::Error::Output)?;
        }
        output.commit().map_err(super::Error::Output)
    }
}

pub mod climate {
    use super::Device;
    use crate::output::{self, cell};
    use crate::snapshot;

    /// Show the climate state of every heating circuit in a snapshot.
    #[derive(clap::Parser)]
    pub struct Args {
        #[clap(flatten)]
        snapshot: snapshot::Args,
        #[clap(flatten)]
        output: output::Args,
    }

    pub fn run(args: Args) -> Result<(), super::Error> {
        let device = Device::load(args.snapshot)?;
        let headers = vec![
            "Circuit", "Name", "Enabled", "HVAC mode", "Preset", "Fan", "Target", "Current",
            "Humidity",
        ];
        let mut output = args.output.to_output(headers).map_err(super::Error::Output)?;
        for entity in device.climate_entities() {
            let state = entity.state();
            output
                .result(
                    || {
                        vec![
                            entity.circuit().key.to_string(),
                            state.name.to_string(),
                            state.enabled_by_default.to_string(),
                            cell(state.hvac_mode),
                            cell(state.preset_mode),
                            cell(state.fan_mode),
                            cell(state.target_temperature),
                            cell(state.current_temperature),
                            cell(state.current_humidity),
                        ]
                    },
                    || &state,
                )
                .map_err(super::Error::Output)?;
        }
        output.commit().map_err(super::Error::Output)
    }
}

pub mod numbers {
    use super::Device;
    use crate::output::{self, cell};
    use crate::snapshot;

    /// Show the adjustable numbers of the device in a snapshot.
    #[derive(clap::Parser)]
    pub struct Args {
        #[clap(flatten)]
        snapshot: snapshot::Args,
        #[clap(flatten)]
        output: output::Args,
    }

    pub fn run(args: Args) -> Result<(), super::Error> {
        let device = Device::load(args.snapshot)?;
        let headers = vec!["Point", "Name", "Available", "Value", "Min", "Max", "Step", "Unit"];
        let mut output = args.output.to_output(headers).map_err(super::Error::Output)?;
        for entity in device.number_entities() {
            let state = entity.state();
            output
                .result(
                    || {
                        vec![
                            entity.point().to_string(),
                            state.name.to_string(),
                            state.available.to_string(),
                            cell(state.value),
                            cell(state.minimum),
                            cell(state.maximum),
                            cell(state.step),
                            state.unit.to_string(),
                        ]
                    },
                    || &state,
                )
                .map_err(super::Error::Output)?;
        }
        output.commit().map_err(super::Error::Output)
    }
}

pub mod set {
    use super::Device;
    use crate::climate::{self, ClimateEntity, HeatingCircuit};
    use crate::number;
    use crate::output;
    use crate::points::{ParseError, Point};
    use crate::snapshot;
    use crate::translate::{FanLevel, Family, HvacMode, Preset};
    use tracing::info;

    /// Request a change and output the writes it results in.
    ///
    /// Nothing is sent to the device; the writes are what the device layer would carry out.
    #[derive(clap::Parser)]
    pub struct Args {
        #[clap(flatten)]
        snapshot: snapshot::Args,
        #[clap(flatten)]
        output: output::Args,
        #[command(subcommand)]
        change: Change,
    }

    #[derive(clap::Subcommand)]
    pub enum Change {
        /// Switch the HVAC mode of a heating circuit.
        HvacMode { circuit: String, mode: HvacMode },
        /// Switch the preset of a heating circuit.
        Preset { circuit: String, preset: Preset },
        /// Change the target temperature currently in effect for a heating circuit.
        Temperature { circuit: String, temperature: f32 },
        /// Change the ventilation fan level.
        FanMode { circuit: String, level: FanLevel },
        /// Change an adjustable number (see `numbers`).
        Number { point: String, value: String },
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error(transparent)]
        Common(#[from] super::Error),
        #[error("there is no heating circuit `{0}`")]
        UnknownCircuit(String),
        #[error("there is no point named `{0}`")]
        UnknownPoint(String),
        #[error("{0} is not an adjustable number on {1:?} heat pumps")]
        NotANumber(Point, Family),
        #[error("could not parse the value for {1}")]
        ParseValue(#[source] ParseError, Point),
        #[error("the heating circuit refused the change")]
        Climate(#[source] climate::Error),
        #[error("the number refused the change")]
        Number(#[source] number::Error),
    }

    fn circuit<'a>(entities: &'a [ClimateEntity], key: &str) -> Result<&'a ClimateEntity, Error> {
        let circuit =
            HeatingCircuit::from_key(key).ok_or_else(|| Error::UnknownCircuit(key.to_string()))?;
        entities
            .iter()
            .find(|e| std::ptr::eq(e.circuit(), circuit))
            .ok_or_else(|| Error::UnknownCircuit(key.to_string()))
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let mut device = Device::load(args.snapshot)?;
        let entities = device.climate_entities();
        match &args.change {
            Change::HvacMode { circuit: key, mode } => {
                circuit(&entities, key)?.set_hvac_mode(*mode).map_err(Error::Climate)?
            }
            Change::Preset { circuit: key, preset } => {
                circuit(&entities, key)?.set_preset_mode(*preset).map_err(Error::Climate)?
            }
            Change::Temperature { circuit: key, temperature } => {
                circuit(&entities, key)?.set_temperature(*temperature)
            }
            Change::FanMode { circuit: key, level } => {
                circuit(&entities, key)?.set_fan_mode(*level).map_err(Error::Climate)?
            }
            Change::Number { point, value } => {
                let point = Point::from_name(&point.to_uppercase())
                    .ok_or_else(|| Error::UnknownPoint(point.clone()))?;
                let numbers = device.number_entities();
                let entity = numbers
                    .iter()
                    .find(|n| n.point() == point)
                    .ok_or(Error::NotANumber(point, device.args.family))?;
                let value = point
                    .data_type()
                    .parse(value)
                    .map_err(|e| Error::ParseValue(e, point))?;
                entity.set_native_value(value).map_err(Error::Number)?;
            }
        }
        drop(entities);

        let headers = vec!["Point", "Value"];
        let mut output = args
            .output
            .to_output(headers)
            .map_err(|e| Error::Common(super::Error::Output(e)))?;
        while let Ok(write) = device.writes.try_recv() {
            info!(point = write.point.name(), value = %write.value, "write requested");
            output
                .result(
                    || vec![write.point.to_string(), write.value.to_string()],
                    || &write,
                )
                .map_err(|e| Error::Common(super::Error::Output(e)))?;
        }
        output
            .commit()
            .map_err(|e| Error::Common(super::Error::Output(e)))
    }
}
