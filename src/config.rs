// Chassis tables for the robot, and the parameter set built from them
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::swerve::drivetrain::Result;
use crate::swerve::{
    ChassisGeometry, ClosedLoopOutput, DrivetrainAssembler, DrivetrainConstants, ModuleConstantsFactory,
    ModuleIdentity, Slot0Gains, SteerFeedbackType,
};

// Wheel-to-wheel dimensions (inches)
pub const TRACK_WIDTH_INCHES: f64 = 20.0;
pub const WHEEL_BASE_INCHES: f64 = 23.0;

// Both gain sets need to be tuned per robot.
// Steer gains are in the units of STEER_CLOSED_LOOP_OUTPUT.
pub const STEER_GAINS: Slot0Gains = Slot0Gains::new()
    .with_kp(100.0)
    .with_ki(0.0)
    .with_kd(0.05)
    .with_ks(0.0)
    .with_kv(1.5)
    .with_ka(0.0);
// Drive gains are in the units of DRIVE_CLOSED_LOOP_OUTPUT.
pub const DRIVE_GAINS: Slot0Gains = Slot0Gains::new()
    .with_kp(3.0)
    .with_ki(0.0)
    .with_kd(0.0)
    .with_ks(0.0)
    .with_kv(0.0)
    .with_ka(0.0);

pub const STEER_CLOSED_LOOP_OUTPUT: ClosedLoopOutput = ClosedLoopOutput::Voltage;
pub const DRIVE_CLOSED_LOOP_OUTPUT: ClosedLoopOutput = ClosedLoopOutput::Voltage;

// Stator current at which the wheels start to slip
pub const SLIP_CURRENT_AMPS: f64 = 300.0;

// Theoretical free speed at 12 V applied output
pub const SPEED_AT_12_VOLTS_MPS: f64 = 5.0;

// Every azimuth rotation turns the drive motor this many times
pub const COUPLE_RATIO: f64 = 3.5;

pub const DRIVE_GEAR_RATIO: f64 = 6.75;
pub const STEER_GEAR_RATIO: f64 = 150.0 / 7.0;
pub const WHEEL_RADIUS_INCHES: f64 = 2.0; // fudge-factored until odometry matches

pub const STEER_MOTOR_INVERTED: bool = true;
pub const INVERT_LEFT_SIDE: bool = false;
pub const INVERT_RIGHT_SIDE: bool = true;

pub const FEEDBACK_SOURCE: SteerFeedbackType = SteerFeedbackType::FusedCancoder;

pub const CAN_BUS_NAME: &str = "rio";

// Simulation only
pub const STEER_INERTIA: f64 = 0.00001;
pub const DRIVE_INERTIA: f64 = 0.001;
pub const STEER_FRICTION_VOLTAGE: f64 = 0.25;
pub const DRIVE_FRICTION_VOLTAGE: f64 = 0.25;

// Per-module devices. Offsets are in rotations, wrapped into [-0.5, 0.5).
pub const FRONT_LEFT: ModuleIdentity = ModuleIdentity {
    drive_motor_id: 33,
    steer_motor_id: 34,
    encoder_id: 42,
    encoder_offset: 0.16455078125, // measured -0.83544921875
};

pub const FRONT_RIGHT: ModuleIdentity = ModuleIdentity {
    drive_motor_id: 31,
    steer_motor_id: 32,
    encoder_id: 41,
    encoder_offset: -0.15234375,
};

pub const BACK_LEFT: ModuleIdentity = ModuleIdentity {
    drive_motor_id: 35,
    steer_motor_id: 36,
    encoder_id: 43,
    encoder_offset: -0.4794921875,
};

pub const BACK_RIGHT: ModuleIdentity = ModuleIdentity {
    drive_motor_id: 37,
    steer_motor_id: 38,
    encoder_id: 44,
    encoder_offset: 0.15869140625, // measured -0.84130859375
};

/// Error loading a parameter file
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("Cannot read parameter file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse parameter file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Module identities by corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerModules {
    pub front_left: ModuleIdentity,
    pub front_right: ModuleIdentity,
    pub back_left: ModuleIdentity,
    pub back_right: ModuleIdentity,
}

impl Default for CornerModules {
    fn default() -> Self {
        Self {
            front_left: FRONT_LEFT,
            front_right: FRONT_RIGHT,
            back_left: BACK_LEFT,
            back_right: BACK_RIGHT,
        }
    }
}

impl CornerModules {
    /// Identities as [front-left, front-right, back-left, back-right]
    pub fn to_array(&self) -> [ModuleIdentity; 4] {
        [self.front_left, self.front_right, self.back_left, self.back_right]
    }
}

/// Every chassis parameter in one place
///
/// `Default` is the robot described by the constants above. A JSON file only needs
/// the fields it changes; nested gain sets and module identities are replaced whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisParams {
    pub can_bus_name: String,
    pub geometry: ChassisGeometry,

    pub steer_gains: Slot0Gains,
    pub drive_gains: Slot0Gains,
    pub steer_closed_loop_output: ClosedLoopOutput,
    pub drive_closed_loop_output: ClosedLoopOutput,

    pub slip_current_amps: f64,
    pub speed_at_12_volts_mps: f64,
    pub couple_ratio: f64,
    pub drive_gear_ratio: f64,
    pub steer_gear_ratio: f64,
    pub wheel_radius_inches: f64,

    pub steer_motor_inverted: bool,
    pub invert_left_side: bool,
    pub invert_right_side: bool,
    pub feedback_source: SteerFeedbackType,

    pub steer_inertia: f64,
    pub drive_inertia: f64,
    pub steer_friction_voltage: f64,
    pub drive_friction_voltage: f64,

    pub modules: CornerModules,
}

impl Default for ChassisParams {
    fn default() -> Self {
        Self {
            can_bus_name: CAN_BUS_NAME.to_string(),
            geometry: ChassisGeometry {
                track_width: TRACK_WIDTH_INCHES,
                wheel_base: WHEEL_BASE_INCHES,
            },
            steer_gains: STEER_GAINS,
            drive_gains: DRIVE_GAINS,
            steer_closed_loop_output: STEER_CLOSED_LOOP_OUTPUT,
            drive_closed_loop_output: DRIVE_CLOSED_LOOP_OUTPUT,
            slip_current_amps: SLIP_CURRENT_AMPS,
            speed_at_12_volts_mps: SPEED_AT_12_VOLTS_MPS,
            couple_ratio: COUPLE_RATIO,
            drive_gear_ratio: DRIVE_GEAR_RATIO,
            steer_gear_ratio: STEER_GEAR_RATIO,
            wheel_radius_inches: WHEEL_RADIUS_INCHES,
            steer_motor_inverted: STEER_MOTOR_INVERTED,
            invert_left_side: INVERT_LEFT_SIDE,
            invert_right_side: INVERT_RIGHT_SIDE,
            feedback_source: FEEDBACK_SOURCE,
            steer_inertia: STEER_INERTIA,
            drive_inertia: DRIVE_INERTIA,
            steer_friction_voltage: STEER_FRICTION_VOLTAGE,
            drive_friction_voltage: DRIVE_FRICTION_VOLTAGE,
            modules: CornerModules::default(),
        }
    }
}

impl ChassisParams {
    /// Load parameters from a JSON file, filling missing fields from the defaults
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ParamsError> {
        let path = path.as_ref();
        info!("Loading chassis parameters from {}", path.display());

        let text = read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ParamsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Module factory with the chassis-wide defaults bound
    pub fn factory(&self) -> ModuleConstantsFactory {
        ModuleConstantsFactory::new()
            .with_drive_motor_gear_ratio(self.drive_gear_ratio)
            .with_steer_motor_gear_ratio(self.steer_gear_ratio)
            .with_wheel_radius(self.wheel_radius_inches)
            .with_slip_current(self.slip_current_amps)
            .with_steer_motor_gains(self.steer_gains)
            .with_drive_motor_gains(self.drive_gains)
            .with_steer_motor_closed_loop_output(self.steer_closed_loop_output)
            .with_drive_motor_closed_loop_output(self.drive_closed_loop_output)
            .with_speed_at_12_volts_mps(self.speed_at_12_volts_mps)
            .with_steer_inertia(self.steer_inertia)
            .with_drive_inertia(self.drive_inertia)
            .with_steer_friction_voltage(self.steer_friction_voltage)
            .with_drive_friction_voltage(self.drive_friction_voltage)
            .with_feedback_source(self.feedback_source)
            .with_coupling_gear_ratio(self.couple_ratio)
            .with_steer_motor_inverted(self.steer_motor_inverted)
    }

    pub fn assembler(&self) -> DrivetrainAssembler {
        DrivetrainAssembler::new(self.can_bus_name.clone(), self.geometry, self.factory())
            .with_side_inversion(self.invert_left_side, self.invert_right_side)
    }

    /// Assemble and validate the drivetrain described by these parameters
    pub fn build_drivetrain(&self) -> Result<DrivetrainConstants> {
        self.assembler().assemble(&self.modules.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swerve::{ConfigError, Corner};
    use crate::units::{inches_to_meters, wrap_rotations};
    use std::io::Write;
    use tempfile::NamedTempFile;

    // Removed when dropped, including on a failed assertion
    fn params_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_default_robot_builds() {
        let drivetrain = ChassisParams::default()
            .build_drivetrain()
            .expect("Compiled-in robot must pass validation");

        assert_eq!(drivetrain.can_bus_name(), "rio");
        let fl = drivetrain.module(Corner::FrontLeft);
        assert_eq!((fl.drive_motor_id, fl.steer_motor_id, fl.encoder_id), (33, 34, 42));
        assert!((fl.location_x - inches_to_meters(11.5)).abs() < 1e-12);
        assert!((fl.location_y - inches_to_meters(10.0)).abs() < 1e-12);
        assert!(fl.steer_motor_inverted);
        assert_eq!(fl.steer_motor_gains.kp, 100.0);
        assert_eq!(fl.drive_motor_gains.kp, 3.0);

        let fr = drivetrain.module(Corner::FrontRight);
        assert!(!fl.drive_motor_inverted);
        assert!(fr.drive_motor_inverted);
    }

    #[test]
    fn test_stored_offsets_match_measurements() {
        assert_eq!(FRONT_LEFT.encoder_offset, wrap_rotations(-0.83544921875));
        assert_eq!(BACK_RIGHT.encoder_offset, wrap_rotations(-0.84130859375));
        assert_eq!(FRONT_RIGHT.encoder_offset, wrap_rotations(-0.15234375));
        assert_eq!(BACK_LEFT.encoder_offset, wrap_rotations(-0.4794921875));
    }

    #[test]
    fn test_partial_file_overrides_only_given_fields() {
        let file = params_file(
            r#"{ "can_bus_name": "canivore", "slip_current_amps": 120.0, "drive_closed_loop_output": "current" }"#,
        );
        let params = ChassisParams::load(file.path()).unwrap();

        assert_eq!(params.can_bus_name, "canivore");
        assert_eq!(params.slip_current_amps, 120.0);
        assert_eq!(params.drive_closed_loop_output, ClosedLoopOutput::Current);
        assert_eq!(params.geometry, ChassisParams::default().geometry);
        assert_eq!(params.modules, CornerModules::default());
    }

    #[test]
    fn test_single_module_override() {
        let file = params_file(
            r#"{ "modules": { "back_left": { "drive_motor_id": 1, "steer_motor_id": 2, "encoder_id": 3, "encoder_offset": 0.1 } } }"#,
        );
        let params = ChassisParams::load(file.path()).unwrap();

        assert_eq!(params.modules.back_left.drive_motor_id, 1);
        assert_eq!(params.modules.front_left, FRONT_LEFT);

        let drivetrain = params.build_drivetrain().unwrap();
        assert_eq!(drivetrain.module(Corner::BackLeft).encoder_id, 3);
    }

    #[test]
    fn test_loaded_params_are_validated() {
        let file = params_file(r#"{ "geometry": { "track_width": -20.0, "wheel_base": 23.0 } }"#);
        let params = ChassisParams::load(file.path()).unwrap();

        assert!(matches!(
            params.build_drivetrain(),
            Err(ConfigError::NonPositive { name: "track width", .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ChassisParams::load("/nonexistent/swerve-params.json").unwrap_err();
        assert!(matches!(err, ParamsError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/swerve-params.json"));
    }

    #[test]
    fn test_malformed_file() {
        let file = params_file("{ not json");
        let err = ChassisParams::load(file.path()).unwrap_err();
        assert!(matches!(err, ParamsError::Parse { .. }));
    }

    #[test]
    fn test_serialized_defaults_load_back() {
        let json = serde_json::to_string(&ChassisParams::default()).unwrap();
        let file = params_file(&json);
        let params = ChassisParams::load(file.path()).unwrap();

        let defaults = ChassisParams::default();
        assert_eq!(params.can_bus_name, defaults.can_bus_name);
        assert_eq!(params.geometry, defaults.geometry);
        assert_eq!(params.modules, defaults.modules);
        assert_eq!(params.feedback_source, defaults.feedback_source);
        assert!((params.steer_gear_ratio - defaults.steer_gear_ratio).abs() < 1e-12);
        assert!((params.steer_inertia - defaults.steer_inertia).abs() < 1e-15);
    }
}
