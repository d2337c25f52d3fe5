//! Utilities for driving a traffic-intersection simulator executable through
//! its line-oriented stdin/stdout protocol.
//!
//! Typical usage:
//! ```no_run
//! use intersection_harness::{run, Command, Road, SimulationInput, SimulatorConfig};
//!
//! let config = SimulatorConfig::new("/path/to/simulator");
//! let input = SimulationInput::new(vec![
//!     Command::AddVehicle {
//!         vehicle_id: "v1".to_string(),
//!         start_road: Road::North,
//!         end_road: Road::South,
//!     },
//!     Command::Step,
//! ])
//! .expect("commands should be valid");
//!
//! let output = run(&config, &input).expect("simulator should run");
//! for (step, status) in output.step_statuses.iter().enumerate() {
//!     println!("step {step}: {:?}", status.left_vehicles);
//! }
//! ```

mod collect;
mod command;
mod config;
mod error;
mod harness;
pub mod logging;
mod pipeline;

pub use collect::{collect_step_statuses, write_output, SimulationOutput, StepStatus};
pub use command::{translate, Command, Road, SimulationInput, ADD_VEHICLE, STEP};
pub use config::{SimulatorConfig, TIMEOUT_ENV};
pub use error::{ErrorClass, HarnessError, HarnessResult};
pub use harness::{run_simulator, CapturedOutput};
pub use pipeline::{run, run_files};
