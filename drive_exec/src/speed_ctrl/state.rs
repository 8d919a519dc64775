//! Implementations for the SpeedCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{ControlLaw, Params, THROTTLE_MAX, THROTTLE_MIN};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The explicit state threaded through the controller between ticks.
///
/// The state is zero-initialised when the control loop starts and is only
/// reset by constructing a new controller.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ControllerState {
    /// Running time-weighted sum of the speed error since loop start.
    ///
    /// Units: meters
    pub integral: f64,

    /// Speed error seen on the previous tick.
    ///
    /// Units: meters/second
    pub prev_error_mps: f64,
}

/// The throttle demand produced for one tick.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThrottleDemand {
    /// Saturated throttle demand, guaranteed to lie in
    /// `[THROTTLE_MIN, THROTTLE_MAX]`.
    pub throttle: f64,

    /// Speed error this tick, positive when under the target.
    ///
    /// Units: meters/second
    pub error_mps: f64,

    /// True if the raw demand fell outside the throttle range and was
    /// clamped.
    pub saturated: bool,
}

/// Speed control module state
pub struct SpeedCtrl {
    params: Params,

    state: ControllerState,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the throttle demand for one tick.
///
/// This is a pure function over the explicit [`ControllerState`]: the updated
/// state is returned rather than mutated in place, which keeps the law
/// testable against exact sequences of errors. `dt_s` is the fixed tick
/// period, validated positive by the caller's parameter checks.
pub fn compute_throttle(
    params: &Params,
    state: &ControllerState,
    target_speed_mps: f64,
    current_speed_mps: f64,
    dt_s: f64,
) -> (ThrottleDemand, ControllerState) {
    let error_mps = target_speed_mps - current_speed_mps;

    let (raw, new_state) = match params.control_law {
        ControlLaw::Proportional => (params.base_throttle + params.k_p * error_mps, *state),
        ControlLaw::Pid => {
            let integral = state.integral + error_mps * dt_s;
            let derivative = (error_mps - state.prev_error_mps) / dt_s;

            (
                params.k_p * error_mps + params.k_i * integral + params.k_d * derivative,
                ControllerState {
                    integral,
                    prev_error_mps: error_mps,
                },
            )
        }
    };

    let throttle = raw.clamp(THROTTLE_MIN, THROTTLE_MAX);

    (
        ThrottleDemand {
            throttle,
            error_mps,
            saturated: throttle != raw,
        },
        new_state,
    )
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SpeedCtrl {
    /// Create a new controller from the given parameters, with a
    /// zero-initialised state.
    pub fn new(params: &Params) -> Self {
        Self {
            params: params.clone(),
            state: ControllerState::default(),
        }
    }

    /// Compute the throttle demand for this tick, threading the controller
    /// state internally.
    pub fn update(&mut self, target_speed_mps: f64, current_speed_mps: f64, dt_s: f64)
        -> ThrottleDemand
    {
        let (demand, new_state) = compute_throttle(
            &self.params,
            &self.state,
            target_speed_mps,
            current_speed_mps,
            dt_s,
        );

        self.state = new_state;

        demand
    }

    /// Get the current controller state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::speed_ctrl::SpeedCtrlError;

    fn p_params(k_p: f64, base_throttle: f64) -> Params {
        Params {
            control_law: ControlLaw::Proportional,
            k_p,
            k_i: 0.0,
            k_d: 0.0,
            base_throttle,
        }
    }

    fn pid_params(k_p: f64, k_i: f64, k_d: f64) -> Params {
        Params {
            control_law: ControlLaw::Pid,
            k_p,
            k_i,
            k_d,
            base_throttle: 0.5,
        }
    }

    #[test]
    fn test_saturation() {
        let errors = [-1e6, -100.0, -5.0, 0.0, 5.0, 100.0, 1e6];

        for params in [p_params(0.1, 0.5), pid_params(0.1, 0.01, 0.05)].iter() {
            for &error in errors.iter() {
                let (dem, _) =
                    compute_throttle(params, &ControllerState::default(), error, 0.0, 0.05);

                assert!(dem.throttle >= THROTTLE_MIN);
                assert!(dem.throttle <= THROTTLE_MAX);
            }
        }

        // Hard saturation hits the exact bounds and raises the flag
        let params = p_params(0.1, 0.5);

        let (dem, _) = compute_throttle(&params, &ControllerState::default(), 1e6, 0.0, 0.05);
        assert_eq!(dem.throttle, THROTTLE_MAX);
        assert!(dem.saturated);

        let (dem, _) = compute_throttle(&params, &ControllerState::default(), -1e6, 0.0, 0.05);
        assert_eq!(dem.throttle, THROTTLE_MIN);
        assert!(dem.saturated);

        // An in-range demand is not flagged
        let (dem, _) = compute_throttle(&params, &ControllerState::default(), 1.0, 0.0, 0.05);
        assert!(!dem.saturated);
    }

    #[test]
    fn test_proportional_law() {
        // Nominal drive test case: 50 km/h target, currently at 10 m/s
        let params = p_params(0.1, 0.5);

        let (dem, state) =
            compute_throttle(&params, &ControllerState::default(), 13.89, 10.0, 0.05);

        assert!((dem.throttle - 0.889).abs() < 1e-12);
        assert!((dem.error_mps - 3.89).abs() < 1e-12);
        assert!(!dem.saturated);

        // The proportional law never touches the state
        assert_eq!(state.integral, 0.0);
        assert_eq!(state.prev_error_mps, 0.0);
    }

    #[test]
    fn test_pid_reduces_to_proportional() {
        // With zero integral and derivative gains the PID law must match the
        // bias-free proportional law for any error sequence. The PID params
        // get a non-zero base throttle to show the bias plays no part.
        let pid = Params {
            control_law: ControlLaw::Pid,
            k_p: 0.3,
            k_i: 0.0,
            k_d: 0.0,
            base_throttle: 0.9,
        };
        let prop = p_params(0.3, 0.0);

        let mut pid_state = ControllerState::default();

        for &error in [0.0, 1.5, -2.0, 3.0, 0.25].iter() {
            let (pid_dem, new_state) = compute_throttle(&pid, &pid_state, error, 0.0, 0.05);
            let (prop_dem, _) = compute_throttle(&prop, &ControllerState::default(), error, 0.0, 0.05);

            assert_eq!(pid_dem.throttle, prop_dem.throttle);

            pid_state = new_state;
        }
    }

    #[test]
    fn test_integral_accumulation() {
        let params = pid_params(0.0, 1.0, 0.0);
        let dt_s = 0.1;

        let mut state = ControllerState::default();
        let mut expected_integral = 0.0;

        for &error in [1.0, 2.0, 3.0, -1.0].iter() {
            let (_, new_state) = compute_throttle(&params, &state, error, 0.0, dt_s);

            // Same left-to-right summation as the controller
            expected_integral += error * dt_s;

            assert_eq!(new_state.integral, expected_integral);
            assert_eq!(new_state.prev_error_mps, error);

            state = new_state;
        }
    }

    #[test]
    fn test_derivative() {
        let params = pid_params(0.0, 0.0, 0.1);
        let dt_s = 0.1;

        // First tick differences against the zero-initialised previous error
        let (dem, state) = compute_throttle(&params, &ControllerState::default(), 0.5, 0.0, dt_s);
        assert_eq!(dem.throttle, 0.1 * ((0.5 - 0.0) / dt_s));

        let (dem, _) = compute_throttle(&params, &state, 0.7, 0.0, dt_s);
        assert_eq!(dem.throttle, 0.1 * ((0.7 - 0.5) / dt_s));

        // A large first error gives a derivative kick into saturation
        let kicky = pid_params(0.0, 0.0, 1.0);
        let (dem, _) = compute_throttle(&kicky, &ControllerState::default(), 2.0, 0.0, dt_s);
        assert_eq!(dem.throttle, THROTTLE_MAX);
        assert!(dem.saturated);
    }

    #[test]
    fn test_update_threads_state() {
        let mut ctrl = SpeedCtrl::new(&pid_params(0.1, 0.01, 0.05));
        let dt_s = 0.05;

        ctrl.update(13.89, 10.0, dt_s);
        ctrl.update(13.89, 11.0, dt_s);

        let e1 = 13.89 - 10.0;
        let e2 = 13.89 - 11.0;

        assert_eq!(ctrl.state().integral, e1 * dt_s + e2 * dt_s);
        assert_eq!(ctrl.state().prev_error_mps, e2);
    }

    #[test]
    fn test_validation() {
        assert!(p_params(0.1, 0.5).validate().is_ok());
        assert!(pid_params(0.1, 0.01, 0.05).validate().is_ok());

        assert!(matches!(
            p_params(-0.1, 0.5).validate(),
            Err(SpeedCtrlError::InvalidGain("k_p", _))
        ));
        assert!(pid_params(0.1, -0.01, 0.05).validate().is_err());
        assert!(pid_params(0.1, 0.01, -0.05).validate().is_err());

        // NaN fails every ordered comparison, the guards must reject it
        // rather than let it reach the law and poison the clamp
        assert!(matches!(
            p_params(f64::NAN, 0.5).validate(),
            Err(SpeedCtrlError::InvalidGain("k_p", _))
        ));
        assert!(pid_params(0.1, f64::NAN, 0.05).validate().is_err());
        assert!(pid_params(0.1, 0.01, f64::INFINITY).validate().is_err());

        assert!(matches!(
            p_params(0.1, 1.5).validate(),
            Err(SpeedCtrlError::BaseThrottleOutOfRange(_))
        ));
        assert!(p_params(0.1, -0.5).validate().is_err());
        assert!(matches!(
            p_params(0.1, f64::NAN).validate(),
            Err(SpeedCtrlError::BaseThrottleOutOfRange(_))
        ));
    }
}
