// Drivetrain assembly: four corners, one factory, one validated configuration
//
// Corner order [front-left, front-right, back-left, back-right] is a contract with
// the drivetrain consumer, which indexes modules positionally.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::module::{ModuleConstants, ModuleConstantsFactory};
use crate::units::inches_to_meters;

/// Error types for drivetrain configuration
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{motor} motor gain {term} must be non-negative")]
    NegativeGain {
        motor: &'static str,
        term: &'static str,
    },

    #[error("Encoder offset for {corner} is {offset}, expected a value in [-0.5, 0.5)")]
    EncoderOffsetOutOfRange { corner: Corner, offset: f64 },

    #[error("Motor ID {id} is used by both {first} and {second}")]
    DuplicateMotorId { id: i32, first: Corner, second: Corner },

    #[error("Encoder ID {id} is used by both {first} and {second}")]
    DuplicateEncoderId { id: i32, first: Corner, second: Corner },

    #[error("CAN bus name must not be empty")]
    EmptyBusName,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Which side of the robot a module sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Module corners, in the order the drivetrain consumer expects them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::FrontLeft,
        Corner::FrontRight,
        Corner::BackLeft,
        Corner::BackRight,
    ];

    /// Position of this corner in [`DrivetrainConstants::modules`]
    pub const fn index(self) -> usize {
        match self {
            Corner::FrontLeft => 0,
            Corner::FrontRight => 1,
            Corner::BackLeft => 2,
            Corner::BackRight => 3,
        }
    }

    pub const fn side(self) -> Side {
        match self {
            Corner::FrontLeft | Corner::BackLeft => Side::Left,
            Corner::FrontRight | Corner::BackRight => Side::Right,
        }
    }

    pub const fn is_front(self) -> bool {
        matches!(self, Corner::FrontLeft | Corner::FrontRight)
    }

    /// Module offset from robot center, in the geometry's units (inches)
    ///
    /// Front = +X, back = -X, left = +Y, right = -Y.
    pub fn position_inches(self, geometry: &ChassisGeometry) -> (f64, f64) {
        let half_base = geometry.wheel_base / 2.0;
        let half_track = geometry.track_width / 2.0;

        let x = if self.is_front() { half_base } else { -half_base };
        let y = match self.side() {
            Side::Left => half_track,
            Side::Right => -half_track,
        };
        (x, y)
    }

    /// Module offset from robot center in meters
    pub fn position_meters(self, geometry: &ChassisGeometry) -> (f64, f64) {
        let (x, y) = self.position_inches(geometry);
        (inches_to_meters(x), inches_to_meters(y))
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Corner::FrontLeft => "front-left",
            Corner::FrontRight => "front-right",
            Corner::BackLeft => "back-left",
            Corner::BackRight => "back-right",
        };
        f.write_str(name)
    }
}

/// Wheel-to-wheel dimensions of the chassis, in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChassisGeometry {
    /// Left-right distance between wheel centers
    pub track_width: f64,
    /// Front-back distance between wheel centers
    pub wheel_base: f64,
}

/// Device identity and calibration of one module
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleIdentity {
    pub drive_motor_id: i32,
    pub steer_motor_id: i32,
    pub encoder_id: i32,
    /// Rotations, in [-0.5, 0.5)
    pub encoder_offset: f64,
}

/// Everything the drivetrain consumer needs at construction
///
/// Only obtainable through [`DrivetrainAssembler::assemble`] or deserialization,
/// both of which validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedDrivetrain")]
pub struct DrivetrainConstants {
    can_bus_name: String,
    modules: [ModuleConstants; 4],
}

/// Wire shape of [`DrivetrainConstants`] before validation
#[derive(Deserialize)]
struct UncheckedDrivetrain {
    can_bus_name: String,
    modules: [ModuleConstants; 4],
}

impl TryFrom<UncheckedDrivetrain> for DrivetrainConstants {
    type Error = ConfigError;

    fn try_from(raw: UncheckedDrivetrain) -> Result<Self> {
        let drivetrain = Self {
            can_bus_name: raw.can_bus_name,
            modules: raw.modules,
        };
        drivetrain.validate()?;
        Ok(drivetrain)
    }
}

impl DrivetrainConstants {
    pub fn can_bus_name(&self) -> &str {
        &self.can_bus_name
    }

    /// Modules as [front-left, front-right, back-left, back-right]
    pub fn modules(&self) -> &[ModuleConstants; 4] {
        &self.modules
    }

    pub fn module(&self, corner: Corner) -> &ModuleConstants {
        &self.modules[corner.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Corner, &ModuleConstants)> {
        Corner::ALL.into_iter().zip(self.modules.iter())
    }

    /// Check ratios, gains, offsets and device IDs of the assembled drivetrain
    pub fn validate(&self) -> Result<()> {
        if self.can_bus_name.trim().is_empty() {
            return Err(ConfigError::EmptyBusName);
        }

        for (corner, module) in self.iter() {
            for (name, value) in [
                ("drive gear ratio", module.drive_motor_gear_ratio),
                ("steer gear ratio", module.steer_motor_gear_ratio),
                ("coupling ratio", module.coupling_gear_ratio),
                ("wheel radius", module.wheel_radius),
                ("slip current", module.slip_current),
                ("speed at 12 volts", module.speed_at_12_volts_mps),
            ] {
                require_positive(name, value)?;
            }

            for (motor, gains) in [
                ("steer", &module.steer_motor_gains),
                ("drive", &module.drive_motor_gains),
            ] {
                if let Some(term) = gains.first_negative_term() {
                    return Err(ConfigError::NegativeGain { motor, term });
                }
            }

            let offset = module.encoder_offset;
            if !offset.is_finite() || !(-0.5..0.5).contains(&offset) {
                return Err(ConfigError::EncoderOffsetOutOfRange { corner, offset });
            }
        }

        for motor in self.open_loop_motors() {
            warn!("{} motor has kP = 0, loop is effectively open", motor);
        }

        // Drive and steer motors share one device namespace, encoders have their own
        let mut motors: Vec<(i32, Corner)> = Vec::with_capacity(8);
        let mut encoders: Vec<(i32, Corner)> = Vec::with_capacity(4);

        for (corner, module) in self.iter() {
            for id in [module.drive_motor_id, module.steer_motor_id] {
                if let Some(&(_, first)) = motors.iter().find(|&&(seen, _)| seen == id) {
                    return Err(ConfigError::DuplicateMotorId {
                        id,
                        first,
                        second: corner,
                    });
                }
                motors.push((id, corner));
            }

            let id = module.encoder_id;
            if let Some(&(_, first)) = encoders.iter().find(|&&(seen, _)| seen == id) {
                return Err(ConfigError::DuplicateEncoderId {
                    id,
                    first,
                    second: corner,
                });
            }
            encoders.push((id, corner));
        }

        Ok(())
    }

    /// Motors whose kP is zero; gains are chassis-wide so the first module speaks for all
    pub fn open_loop_motors(&self) -> Vec<&'static str> {
        let module = &self.modules[0];
        [
            ("steer", module.steer_motor_gains.kp),
            ("drive", module.drive_motor_gains.kp),
        ]
        .into_iter()
        .filter(|&(_, kp)| kp == 0.0)
        .map(|(motor, _)| motor)
        .collect()
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// External drivetrain controller that takes the assembled configuration
///
/// The controller owns its own lifecycle; the configuration is handed over by value.
pub trait SwerveDrivetrain: Sized {
    fn from_constants(constants: DrivetrainConstants) -> Self;
}

/// Turns chassis geometry and a bound factory into a [`DrivetrainConstants`]
#[derive(Debug, Clone)]
pub struct DrivetrainAssembler {
    can_bus_name: String,
    geometry: ChassisGeometry,
    invert_left_side: bool,
    invert_right_side: bool,
    factory: ModuleConstantsFactory,
}

impl DrivetrainAssembler {
    pub fn new(
        can_bus_name: impl Into<String>,
        geometry: ChassisGeometry,
        factory: ModuleConstantsFactory,
    ) -> Self {
        Self {
            can_bus_name: can_bus_name.into(),
            geometry,
            invert_left_side: false,
            invert_right_side: true,
            factory,
        }
    }

    /// Drive inversion for each side; mirrored modules spin mirrored
    pub fn with_side_inversion(self, invert_left_side: bool, invert_right_side: bool) -> Self {
        Self {
            invert_left_side,
            invert_right_side,
            ..self
        }
    }

    pub fn drive_inverted(&self, side: Side) -> bool {
        match side {
            Side::Left => self.invert_left_side,
            Side::Right => self.invert_right_side,
        }
    }

    /// Build and validate the drivetrain
    ///
    /// `identities` is indexed like [`Corner::ALL`].
    pub fn assemble(&self, identities: &[ModuleIdentity; 4]) -> Result<DrivetrainConstants> {
        require_positive("track width", self.geometry.track_width)?;
        require_positive("wheel base", self.geometry.wheel_base)?;

        let modules = Corner::ALL.map(|corner| {
            let identity = &identities[corner.index()];
            let (x, y) = corner.position_meters(&self.geometry);
            let inverted = self.drive_inverted(corner.side());

            debug!(
                "{}: drive={} steer={} encoder={} at ({:.4}, {:.4}) m, inverted={}",
                corner,
                identity.drive_motor_id,
                identity.steer_motor_id,
                identity.encoder_id,
                x,
                y,
                inverted
            );

            self.factory.create_module_constants(
                identity.steer_motor_id,
                identity.drive_motor_id,
                identity.encoder_id,
                identity.encoder_offset,
                x,
                y,
                inverted,
            )
        });

        let drivetrain = DrivetrainConstants {
            can_bus_name: self.can_bus_name.clone(),
            modules,
        };
        drivetrain.validate()?;

        info!(
            "Assembled swerve drivetrain on bus '{}' ({} x {} in)",
            drivetrain.can_bus_name, self.geometry.track_width, self.geometry.wheel_base
        );
        Ok(drivetrain)
    }

    /// Assemble and hand the configuration to the drivetrain controller
    pub fn assemble_into<D: SwerveDrivetrain>(&self, identities: &[ModuleIdentity; 4]) -> Result<D> {
        let constants = self.assemble(identities)?;
        Ok(D::from_constants(constants))
    }
}
