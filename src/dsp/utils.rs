//! Level conversion and one-pole helpers shared by every engine.

/// Linear magnitudes at or below this are treated as silence.
pub const DB_EPS: f32 = 1e-9;

/// Reported level for silence (dBFS). Keeps `log10(0)` out of the detectors.
pub const SILENCE_DB: f32 = -120.0;

/// Convert decibels to a linear gain. Always > 0 for finite input.
#[inline]
pub fn db_to_lin(db: f32) -> f32 {
    (10.0f32).powf(db / 20.0)
}

/// Convert a linear magnitude to decibels, flooring near-zero input at [`SILENCE_DB`].
#[inline]
pub fn lin_to_db(lin: f32) -> f32 {
    if lin <= DB_EPS {
        return SILENCE_DB;
    }
    20.0 * lin.log10()
}

/// Per-sample step size for a one-pole follower with the given time constant.
///
/// Used as `state += (target - state) * coeff`. A non-positive time means
/// "jump immediately" and yields 1.0.
#[inline]
pub fn time_constant_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    if time_ms > 0.0 && sample_rate > 0.0 {
        1.0 - (-1000.0 / (time_ms * sample_rate)).exp()
    } else {
        1.0
    }
}

/// Move `state` toward `target` with a direction-dependent step.
/// `rising_coeff` applies when the target is above the state. For dB-domain
/// gain reduction "rising" means recovering, so pass the release there.
#[inline]
pub fn update_env(state: f32, target: f32, rising_coeff: f32, falling_coeff: f32) -> f32 {
    let coeff = if target > state {
        rising_coeff
    } else {
        falling_coeff
    };
    state + (target - state) * coeff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_round_trip() {
        for db in [-100.0f32, -60.0, -18.5, -3.0, 0.0, 6.0, 24.0] {
            let back = lin_to_db(db_to_lin(db));
            assert!((back - db).abs() < 1e-3, "{db} -> {back}");
        }
    }

    #[test]
    fn test_db_to_lin_is_positive() {
        for db in [-400.0f32, -120.0, 0.0, 40.0] {
            assert!(db_to_lin(db) >= 0.0);
        }
        assert!(db_to_lin(-120.0) > 0.0);
    }

    #[test]
    fn test_lin_to_db_floor() {
        assert_eq!(lin_to_db(0.0), SILENCE_DB);
        assert_eq!(lin_to_db(1e-9), SILENCE_DB);
        assert_eq!(lin_to_db(-0.5), SILENCE_DB);
        // Just above the floor the plain formula applies.
        assert!((lin_to_db(1e-8) + 160.0).abs() < 1e-3);
        assert!((lin_to_db(1e-5) + 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_time_constant_coeff() {
        assert_eq!(time_constant_coeff(0.0, 48000.0), 1.0);
        assert_eq!(time_constant_coeff(-5.0, 48000.0), 1.0);

        let fast = time_constant_coeff(1.0, 48000.0);
        let slow = time_constant_coeff(100.0, 48000.0);
        assert!(fast > slow);
        assert!(slow > 0.0 && fast < 1.0);
    }

    #[test]
    fn test_update_env_direction() {
        assert!((update_env(0.0, 1.0, 0.5, 0.1) - 0.5).abs() < 1e-6);
        assert!((update_env(1.0, 0.0, 0.5, 0.1) - 0.9).abs() < 1e-6);
    }
}
