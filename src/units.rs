// Unit conversions used while assembling the drivetrain
//
// Chassis tables are written in inches (that is what gets measured on the robot),
// while the drivetrain consumer expects meters.

/// Meters per inch (exact, by definition)
pub const METERS_PER_INCH: f64 = 0.0254;

pub fn inches_to_meters(inches: f64) -> f64 {
    inches * METERS_PER_INCH
}

/// Wrap a rotation reading into [-0.5, 0.5)
///
/// Absolute encoders report a fraction of a turn; readings that differ by a whole
/// number of turns describe the same physical angle. Use this when entering a
/// freshly measured encoder offset.
pub fn wrap_rotations(rotations: f64) -> f64 {
    rotations - (rotations + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_inches_to_meters() {
        assert!((inches_to_meters(1.0) - 0.0254).abs() < EPS);
        assert!((inches_to_meters(11.5) - 0.2921).abs() < EPS);
        assert!((inches_to_meters(-10.0) + 0.254).abs() < EPS);
    }

    #[test]
    fn test_wrap_rotations_range() {
        // Measured offsets from the robot, two of which sit outside the half-turn window
        let wrapped = wrap_rotations(-0.83544921875);
        assert!((wrapped - 0.16455078125).abs() < EPS);

        let wrapped = wrap_rotations(-0.84130859375);
        assert!((wrapped - 0.15869140625).abs() < EPS);

        // Already in range: untouched
        assert!((wrap_rotations(-0.4794921875) + 0.4794921875).abs() < EPS);
        assert!((wrap_rotations(0.25) - 0.25).abs() < EPS);
    }

    #[test]
    fn test_wrap_rotations_half_open() {
        // Upper bound is exclusive, lower bound inclusive
        assert_eq!(wrap_rotations(0.5), -0.5);
        assert_eq!(wrap_rotations(-0.5), -0.5);
        assert_eq!(wrap_rotations(1.0), 0.0);
    }
}
