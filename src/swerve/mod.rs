// Swerve drivetrain configuration
//
// Provides:
// - Closed-loop gains and output selection
// - Module constants factory (chassis-wide defaults + per-module identity)
// - Drivetrain assembler (corner geometry, side inversion, validation)

pub mod drivetrain;
pub mod gains;
pub mod module;

pub use drivetrain::{
    ChassisGeometry, ConfigError, Corner, DrivetrainAssembler, DrivetrainConstants,
    ModuleIdentity, Side, SwerveDrivetrain,
};
pub use gains::{ClosedLoopOutput, Slot0Gains, SteerFeedbackType};
pub use module::{ModuleConstants, ModuleConstantsFactory};
