pub mod config;
pub mod swerve;
pub mod units;
