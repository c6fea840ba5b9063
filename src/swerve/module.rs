// Per-module constants and the factory that stamps them out
//
// The factory carries everything shared by the four modules (ratios, gains,
// output modes, simulation terms). Each call adds the per-module identity:
// device IDs, encoder offset, position and drive inversion.

use serde::{Deserialize, Serialize};

use super::gains::{ClosedLoopOutput, Slot0Gains, SteerFeedbackType};

/// Fully-populated configuration for one swerve module
///
/// Built once by [`ModuleConstantsFactory::create_module_constants`] and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConstants {
    pub steer_motor_id: i32,
    pub drive_motor_id: i32,
    pub encoder_id: i32,
    /// Encoder reading (rotations) at which the wheel points forward
    pub encoder_offset: f64,
    pub location_x: f64, // meters, +X = front
    pub location_y: f64, // meters, +Y = left
    pub drive_motor_inverted: bool,
    pub steer_motor_inverted: bool,

    pub drive_motor_gear_ratio: f64,
    pub steer_motor_gear_ratio: f64,
    pub coupling_gear_ratio: f64,
    pub wheel_radius: f64, // inches
    pub slip_current: f64, // amps
    pub speed_at_12_volts_mps: f64,

    pub steer_motor_gains: Slot0Gains,
    pub drive_motor_gains: Slot0Gains,
    pub steer_motor_closed_loop_output: ClosedLoopOutput,
    pub drive_motor_closed_loop_output: ClosedLoopOutput,
    pub feedback_source: SteerFeedbackType,

    // Simulation only
    pub steer_inertia: f64,
    pub drive_inertia: f64,
    pub steer_friction_voltage: f64,
    pub drive_friction_voltage: f64,
}

/// Chassis-wide defaults bound once and applied to every module
///
/// Each `with_*` step consumes the factory and returns the updated copy, so a
/// finished factory is an ordinary immutable value.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleConstantsFactory {
    drive_motor_gear_ratio: f64,
    steer_motor_gear_ratio: f64,
    coupling_gear_ratio: f64,
    wheel_radius: f64,
    slip_current: f64,
    speed_at_12_volts_mps: f64,
    steer_motor_gains: Slot0Gains,
    drive_motor_gains: Slot0Gains,
    steer_motor_closed_loop_output: ClosedLoopOutput,
    drive_motor_closed_loop_output: ClosedLoopOutput,
    feedback_source: SteerFeedbackType,
    steer_motor_inverted: bool,
    steer_inertia: f64,
    drive_inertia: f64,
    steer_friction_voltage: f64,
    drive_friction_voltage: f64,
}

impl Default for ModuleConstantsFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleConstantsFactory {
    /// Factory with unit gear ratios, zero gains and voltage output everywhere
    ///
    /// Coupling ratio and free speed start at zero and must be set before the
    /// modules can pass drivetrain validation.
    pub fn new() -> Self {
        Self {
            drive_motor_gear_ratio: 1.0,
            steer_motor_gear_ratio: 1.0,
            coupling_gear_ratio: 0.0,
            wheel_radius: 2.0,
            slip_current: 400.0,
            speed_at_12_volts_mps: 0.0,
            steer_motor_gains: Slot0Gains::new(),
            drive_motor_gains: Slot0Gains::new(),
            steer_motor_closed_loop_output: ClosedLoopOutput::Voltage,
            drive_motor_closed_loop_output: ClosedLoopOutput::Voltage,
            feedback_source: SteerFeedbackType::FusedCancoder,
            steer_motor_inverted: false,
            steer_inertia: 0.00001,
            drive_inertia: 0.001,
            steer_friction_voltage: 0.25,
            drive_friction_voltage: 0.25,
        }
    }

    pub fn with_drive_motor_gear_ratio(self, ratio: f64) -> Self {
        Self {
            drive_motor_gear_ratio: ratio,
            ..self
        }
    }

    pub fn with_steer_motor_gear_ratio(self, ratio: f64) -> Self {
        Self {
            steer_motor_gear_ratio: ratio,
            ..self
        }
    }

    /// Drive motor turns induced by one azimuth turn
    pub fn with_coupling_gear_ratio(self, ratio: f64) -> Self {
        Self {
            coupling_gear_ratio: ratio,
            ..self
        }
    }

    /// Wheel radius in inches
    pub fn with_wheel_radius(self, inches: f64) -> Self {
        Self {
            wheel_radius: inches,
            ..self
        }
    }

    /// Stator current (A) at which the wheels start to slip
    pub fn with_slip_current(self, amps: f64) -> Self {
        Self {
            slip_current: amps,
            ..self
        }
    }

    /// Theoretical free speed (m/s) at 12 V applied output
    pub fn with_speed_at_12_volts_mps(self, mps: f64) -> Self {
        Self {
            speed_at_12_volts_mps: mps,
            ..self
        }
    }

    pub fn with_steer_motor_gains(self, gains: Slot0Gains) -> Self {
        Self {
            steer_motor_gains: gains,
            ..self
        }
    }

    pub fn with_drive_motor_gains(self, gains: Slot0Gains) -> Self {
        Self {
            drive_motor_gains: gains,
            ..self
        }
    }

    pub fn with_steer_motor_closed_loop_output(self, output: ClosedLoopOutput) -> Self {
        Self {
            steer_motor_closed_loop_output: output,
            ..self
        }
    }

    pub fn with_drive_motor_closed_loop_output(self, output: ClosedLoopOutput) -> Self {
        Self {
            drive_motor_closed_loop_output: output,
            ..self
        }
    }

    pub fn with_feedback_source(self, source: SteerFeedbackType) -> Self {
        Self {
            feedback_source: source,
            ..self
        }
    }

    pub fn with_steer_motor_inverted(self, inverted: bool) -> Self {
        Self {
            steer_motor_inverted: inverted,
            ..self
        }
    }

    pub fn with_steer_inertia(self, inertia: f64) -> Self {
        Self {
            steer_inertia: inertia,
            ..self
        }
    }

    pub fn with_drive_inertia(self, inertia: f64) -> Self {
        Self {
            drive_inertia: inertia,
            ..self
        }
    }

    pub fn with_steer_friction_voltage(self, volts: f64) -> Self {
        Self {
            steer_friction_voltage: volts,
            ..self
        }
    }

    pub fn with_drive_friction_voltage(self, volts: f64) -> Self {
        Self {
            drive_friction_voltage: volts,
            ..self
        }
    }

    /// Create the constants for one module
    ///
    /// # Arguments
    /// * `steer_motor_id` - CAN ID of the steer (azimuth) motor
    /// * `drive_motor_id` - CAN ID of the drive motor
    /// * `encoder_id` - CAN ID of the absolute encoder
    /// * `encoder_offset` - Encoder reading (rotations) at wheel-forward
    /// * `location_x` - Module X offset from robot center in meters (+ = front)
    /// * `location_y` - Module Y offset from robot center in meters (+ = left)
    /// * `drive_motor_inverted` - Whether the drive motor spins reversed
    ///
    /// No range checks happen here; the assembler validates the finished drivetrain.
    #[allow(clippy::too_many_arguments)]
    pub fn create_module_constants(
        &self,
        steer_motor_id: i32,
        drive_motor_id: i32,
        encoder_id: i32,
        encoder_offset: f64,
        location_x: f64,
        location_y: f64,
        drive_motor_inverted: bool,
    ) -> ModuleConstants {
        ModuleConstants {
            steer_motor_id,
            drive_motor_id,
            encoder_id,
            encoder_offset,
            location_x,
            location_y,
            drive_motor_inverted,
            steer_motor_inverted: self.steer_motor_inverted,
            drive_motor_gear_ratio: self.drive_motor_gear_ratio,
            steer_motor_gear_ratio: self.steer_motor_gear_ratio,
            coupling_gear_ratio: self.coupling_gear_ratio,
            wheel_radius: self.wheel_radius,
            slip_current: self.slip_current,
            speed_at_12_volts_mps: self.speed_at_12_volts_mps,
            steer_motor_gains: self.steer_motor_gains,
            drive_motor_gains: self.drive_motor_gains,
            steer_motor_closed_loop_output: self.steer_motor_closed_loop_output,
            drive_motor_closed_loop_output: self.drive_motor_closed_loop_output,
            feedback_source: self.feedback_source,
            steer_inertia: self.steer_inertia,
            drive_inertia: self.drive_inertia,
            steer_friction_voltage: self.steer_friction_voltage,
            drive_friction_voltage: self.drive_friction_voltage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuned_factory() -> ModuleConstantsFactory {
        ModuleConstantsFactory::new()
            .with_drive_motor_gear_ratio(6.75)
            .with_steer_motor_gear_ratio(150.0 / 7.0)
            .with_wheel_radius(2.0)
            .with_slip_current(300.0)
            .with_steer_motor_gains(Slot0Gains::new().with_kp(100.0).with_kv(1.5))
            .with_drive_motor_gains(Slot0Gains::new().with_kp(3.0))
            .with_speed_at_12_volts_mps(5.0)
            .with_coupling_gear_ratio(3.5)
            .with_steer_motor_inverted(true)
    }

    #[test]
    fn test_factory_is_pure() {
        let factory = tuned_factory();
        let a = factory.create_module_constants(34, 33, 42, 0.1645, 0.2921, 0.254, false);
        let b = factory.create_module_constants(34, 33, 42, 0.1645, 0.2921, 0.254, false);
        assert_eq!(a, b, "Identical inputs must give identical modules");
    }

    #[test]
    fn test_identity_fields_come_from_call() {
        let m = tuned_factory().create_module_constants(32, 31, 41, -0.15, 0.3, -0.25, true);

        assert_eq!(m.steer_motor_id, 32);
        assert_eq!(m.drive_motor_id, 31);
        assert_eq!(m.encoder_id, 41);
        assert_eq!(m.encoder_offset, -0.15);
        assert_eq!(m.location_x, 0.3);
        assert_eq!(m.location_y, -0.25);
        assert!(m.drive_motor_inverted);
    }

    #[test]
    fn test_chassis_fields_come_from_factory() {
        let m = tuned_factory().create_module_constants(1, 2, 3, 0.0, 0.0, 0.0, false);

        assert_eq!(m.drive_motor_gear_ratio, 6.75);
        assert_eq!(m.steer_motor_gear_ratio, 150.0 / 7.0);
        assert_eq!(m.coupling_gear_ratio, 3.5);
        assert_eq!(m.wheel_radius, 2.0);
        assert_eq!(m.slip_current, 300.0);
        assert_eq!(m.speed_at_12_volts_mps, 5.0);
        assert_eq!(m.steer_motor_gains.kp, 100.0);
        assert_eq!(m.drive_motor_gains.kp, 3.0);
        assert!(m.steer_motor_inverted);
        assert_eq!(m.feedback_source, SteerFeedbackType::FusedCancoder);
    }

    #[test]
    fn test_builder_steps_do_not_touch_earlier_factory() {
        let base = tuned_factory();
        let current = base
            .clone()
            .with_drive_motor_closed_loop_output(ClosedLoopOutput::Current);

        let a = base.create_module_constants(1, 2, 3, 0.0, 0.0, 0.0, false);
        let b = current.create_module_constants(1, 2, 3, 0.0, 0.0, 0.0, false);

        assert_eq!(a.drive_motor_closed_loop_output, ClosedLoopOutput::Voltage);
        assert_eq!(b.drive_motor_closed_loop_output, ClosedLoopOutput::Current);
        assert_eq!(a.steer_motor_closed_loop_output, b.steer_motor_closed_loop_output);
    }

    #[test]
    fn test_factory_does_not_validate() {
        // Nonsense values pass straight through; validation belongs to the assembler
        let m = ModuleConstantsFactory::new()
            .with_wheel_radius(-1.0)
            .create_module_constants(5, 5, 5, 3.0, 0.0, 0.0, false);
        assert_eq!(m.wheel_radius, -1.0);
        assert_eq!(m.encoder_offset, 3.0);
    }
}
