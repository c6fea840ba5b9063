// Closed-loop gains and output selection for steer and drive motors

use serde::{Deserialize, Serialize};

/// PID + feed-forward gains for one motor control slot
///
/// Units of kS/kV/kA depend on the [`ClosedLoopOutput`] the gains are used with
/// (volts for `Voltage`, amps for `Current`, fraction of supply for `DutyCycle`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slot0Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub ks: f64,
    pub kv: f64,
    pub ka: f64,
}

impl Slot0Gains {
    /// All gains zero
    pub const fn new() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            ks: 0.0,
            kv: 0.0,
            ka: 0.0,
        }
    }

    pub const fn with_kp(self, kp: f64) -> Self {
        Self { kp, ..self }
    }

    pub const fn with_ki(self, ki: f64) -> Self {
        Self { ki, ..self }
    }

    pub const fn with_kd(self, kd: f64) -> Self {
        Self { kd, ..self }
    }

    pub const fn with_ks(self, ks: f64) -> Self {
        Self { ks, ..self }
    }

    pub const fn with_kv(self, kv: f64) -> Self {
        Self { kv, ..self }
    }

    pub const fn with_ka(self, ka: f64) -> Self {
        Self { ka, ..self }
    }

    /// Name of the first gain that must not be negative but is, if any
    pub(crate) fn first_negative_term(&self) -> Option<&'static str> {
        [("kD", self.kd), ("kS", self.ks), ("kV", self.kv), ("kA", self.ka)]
            .into_iter()
            .find(|&(_, value)| value < 0.0 || !value.is_finite())
            .map(|(name, _)| name)
    }
}

/// Physical quantity the closed-loop output represents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedLoopOutput {
    #[default]
    Voltage,
    Current,
    DutyCycle,
}

/// Where the steer motor takes its azimuth feedback from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteerFeedbackType {
    /// Encoder fused with the motor's rotor sensor
    #[default]
    FusedCancoder,
    /// Rotor sensor synchronised to the encoder
    SyncCancoder,
    /// Encoder used directly as the remote sensor
    RemoteCancoder,
}
