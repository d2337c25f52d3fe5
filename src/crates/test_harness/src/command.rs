use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

/// Protocol keyword for queueing a vehicle.
pub const ADD_VEHICLE: &str = "ADD_VEHICLE";
/// Protocol keyword for advancing the simulation by one step.
pub const STEP: &str = "STEP";

/// Entry or exit road of the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Road {
    North,
    East,
    South,
    West,
}

impl Road {
    pub const ALL: [Road; 4] = [Road::North, Road::East, Road::South, Road::West];

    pub fn as_str(self) -> &'static str {
        match self {
            Road::North => "north",
            Road::East => "east",
            Road::South => "south",
            Road::West => "west",
        }
    }

    pub fn parse(text: &str) -> Option<Road> {
        Road::ALL.into_iter().find(|road| road.as_str() == text)
    }
}

impl fmt::Display for Road {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single instruction from the input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    AddVehicle {
        #[serde(rename = "vehicleId")]
        vehicle_id: String,
        #[serde(rename = "startRoad")]
        start_road: Road,
        #[serde(rename = "endRoad")]
        end_road: Road,
    },
    Step,
}

impl Command {
    /// Render the command as one line of the simulator's stdin protocol.
    pub fn to_protocol_line(&self) -> String {
        match self {
            Command::AddVehicle {
                vehicle_id,
                start_road,
                end_road,
            } => format!("{ADD_VEHICLE} {vehicle_id} {start_road} {end_road}"),
            Command::Step => STEP.to_string(),
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self, Command::Step)
    }
}

/// Translate commands into protocol lines, one per command, preserving order.
pub fn translate(commands: &[Command]) -> Vec<String> {
    commands.iter().map(Command::to_protocol_line).collect()
}

/// Ordered command list loaded from an input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationInput {
    commands: Vec<Command>,
}

#[derive(Deserialize)]
struct RawInput {
    commands: Vec<serde_json::Value>,
}

impl SimulationInput {
    pub fn new(commands: Vec<Command>) -> HarnessResult<Self> {
        for (index, command) in commands.iter().enumerate() {
            validate(index, command)?;
        }
        Ok(Self { commands })
    }

    /// Decode an input document, naming the first offending command on failure.
    pub fn from_json_str(text: &str) -> HarnessResult<Self> {
        let raw: RawInput = serde_json::from_str(text).map_err(HarnessError::InputDocument)?;
        let commands = raw
            .commands
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value::<Command>(value)
                    .map_err(|err| HarnessError::invalid_command(index, err.to_string()))
            })
            .collect::<HarnessResult<Vec<_>>>()?;
        Self::new(commands)
    }

    /// Read and decode an input document from disk.
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| HarnessError::InputRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of `Step` commands, i.e. the number of result lines to expect.
    pub fn step_count(&self) -> usize {
        self.commands.iter().filter(|command| command.is_step()).count()
    }
}

fn validate(index: usize, command: &Command) -> HarnessResult<()> {
    if let Command::AddVehicle { vehicle_id, .. } = command {
        if vehicle_id.is_empty() {
            return Err(HarnessError::invalid_command(index, "vehicleId is empty"));
        }
        if vehicle_id.chars().any(char::is_whitespace) {
            return Err(HarnessError::invalid_command(
                index,
                format!("vehicleId {vehicle_id:?} contains whitespace"),
            ));
        }
    }
    Ok(())
}
