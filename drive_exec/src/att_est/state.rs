//! Implementations for the AttEst state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use sim_if::eqpt::veh::ImuSample;

// Internal
use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Attitude of the vehicle as integrated Euler angles.
///
/// The angles are raw integrals of the body angular rates and are not wrapped
/// into any particular range, so a vehicle spinning on the spot will show a
/// yaw that grows without bound.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Attitude {
    /// Roll angle about the body x axis.
    ///
    /// Units: radians
    pub roll_rad: f64,

    /// Pitch angle about the body y axis.
    ///
    /// Units: radians
    pub pitch_rad: f64,

    /// Yaw angle about the body z axis.
    ///
    /// Units: radians
    pub yaw_rad: f64,
}

/// One row of the attitude trace, written for every IMU sub-sample.
///
/// Kept flat so the rows serialise directly into CSV records.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AttRecord {
    /// Simulation time of the sub-sample.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Smoothed linear acceleration of the sub-sample, x component.
    ///
    /// Units: meters/second/second
    pub acc_x_mss: f64,

    /// Smoothed linear acceleration of the sub-sample, y component.
    ///
    /// Units: meters/second/second
    pub acc_y_mss: f64,

    /// Smoothed linear acceleration of the sub-sample, z component.
    ///
    /// Units: meters/second/second
    pub acc_z_mss: f64,

    /// Integrated roll after this sub-sample.
    ///
    /// Units: radians
    pub roll_rad: f64,

    /// Integrated pitch after this sub-sample.
    ///
    /// Units: radians
    pub pitch_rad: f64,

    /// Integrated yaw after this sub-sample.
    ///
    /// Units: radians
    pub yaw_rad: f64,
}

/// Attitude estimation module state
pub struct AttEst {
    params: Params,

    attitude: Attitude,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Integrate a batch of IMU sub-samples into a new attitude.
///
/// Pure counterpart of [`AttEst::update`]: the updated attitude is returned
/// along with one [`AttRecord`] per sub-sample, each holding the running
/// attitude after that sub-sample was applied. Sub-samples are assumed to be
/// `step_s` apart, with the batch ordered oldest first.
pub fn integrate(
    samples: &[ImuSample],
    step_s: f64,
    initial: &Attitude,
) -> (Attitude, Vec<AttRecord>) {
    let mut attitude = *initial;
    let mut records = Vec::with_capacity(samples.len());

    for sample in samples {
        // Body rate convention: x is roll, y is pitch, z is yaw
        attitude.roll_rad += sample.ang_vel_smooth_rads[0] * step_s;
        attitude.pitch_rad += sample.ang_vel_smooth_rads[1] * step_s;
        attitude.yaw_rad += sample.ang_vel_smooth_rads[2] * step_s;

        records.push(AttRecord {
            time_s: sample.time_s,
            acc_x_mss: sample.acc_smooth_mss[0],
            acc_y_mss: sample.acc_smooth_mss[1],
            acc_z_mss: sample.acc_smooth_mss[2],
            roll_rad: attitude.roll_rad,
            pitch_rad: attitude.pitch_rad,
            yaw_rad: attitude.yaw_rad,
        });
    }

    (attitude, records)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AttEst {
    /// Create a new estimator from the given parameters, starting from a
    /// level, zero-yaw attitude.
    pub fn new(params: &Params) -> Self {
        Self {
            params: params.clone(),
            attitude: Attitude::default(),
        }
    }

    /// Integrate this tick's batch of IMU sub-samples into the estimator's
    /// attitude, returning the trace records for the batch.
    pub fn update(&mut self, samples: &[ImuSample]) -> Vec<AttRecord> {
        let (attitude, records) = integrate(samples, self.params.imu_step_s, &self.attitude);

        self.attitude = attitude;

        records
    }

    /// Get the current attitude estimate.
    pub fn attitude(&self) -> &Attitude {
        &self.attitude
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::att_est::AttEstError;

    fn imu(time_s: f64, ang_vel_smooth_rads: [f64; 3]) -> ImuSample {
        ImuSample {
            time_s,
            acc_smooth_mss: [0.0; 3],
            ang_vel_smooth_rads,
        }
    }

    #[test]
    fn test_zero_rates_hold_attitude() {
        let initial = Attitude {
            roll_rad: 0.1,
            pitch_rad: -0.2,
            yaw_rad: 1.5,
        };

        let samples: Vec<ImuSample> = (0..5).map(|i| imu(i as f64 * 0.05, [0.0; 3])).collect();

        let (attitude, records) = integrate(&samples, 0.05, &initial);

        assert_eq!(attitude.roll_rad, initial.roll_rad);
        assert_eq!(attitude.pitch_rad, initial.pitch_rad);
        assert_eq!(attitude.yaw_rad, initial.yaw_rad);

        // Every record repeats the held attitude
        assert_eq!(records.len(), 5);
        for record in records.iter() {
            assert_eq!(record.yaw_rad, initial.yaw_rad);
        }
    }

    #[test]
    fn test_axis_convention() {
        let samples = [imu(0.0, [1.0, 2.0, 3.0])];

        let (attitude, records) = integrate(&samples, 0.1, &Attitude::default());

        assert_eq!(attitude.roll_rad, 1.0 * 0.1);
        assert_eq!(attitude.pitch_rad, 2.0 * 0.1);
        assert_eq!(attitude.yaw_rad, 3.0 * 0.1);

        assert_eq!(records[0].roll_rad, attitude.roll_rad);
        assert_eq!(records[0].pitch_rad, attitude.pitch_rad);
        assert_eq!(records[0].yaw_rad, attitude.yaw_rad);
    }

    #[test]
    fn test_yaw_ramp() {
        // Nominal drive test case: constant 1 rad/s turn sampled at 20 Hz
        // for half a second of data
        let samples: Vec<ImuSample> = (0..10)
            .map(|i| imu(i as f64 * 0.05, [0.0, 0.0, 1.0]))
            .collect();

        let (attitude, records) = integrate(&samples, 0.05, &Attitude::default());

        assert!((attitude.yaw_rad - 0.5).abs() < 1e-9);
        assert_eq!(attitude.roll_rad, 0.0);
        assert_eq!(attitude.pitch_rad, 0.0);

        // Same left-to-right summation as the integrator
        let mut expected_yaw = 0.0;
        for record in records.iter() {
            expected_yaw += 1.0 * 0.05;
            assert_eq!(record.yaw_rad, expected_yaw);
        }
        assert_eq!(attitude.yaw_rad, expected_yaw);
    }

    #[test]
    fn test_records_are_cumulative() {
        let samples = [
            imu(0.00, [1.0, 0.0, 0.0]),
            imu(0.05, [0.0, 1.0, 0.0]),
            imu(0.10, [0.0, 0.0, 1.0]),
        ];

        let (attitude, records) = integrate(&samples, 0.1, &Attitude::default());

        // Each axis keeps the angle picked up on its own sub-sample
        assert_eq!(records[0].roll_rad, 0.1);
        assert_eq!(records[0].yaw_rad, 0.0);
        assert_eq!(records[1].roll_rad, 0.1);
        assert_eq!(records[1].pitch_rad, 0.1);
        assert_eq!(records[2].yaw_rad, 0.1);

        assert_eq!(attitude.roll_rad, 0.1);
        assert_eq!(attitude.pitch_rad, 0.1);
        assert_eq!(attitude.yaw_rad, 0.1);

        // Sub-sample times pass straight through to the trace
        assert_eq!(records[1].time_s, 0.05);
    }

    #[test]
    fn test_empty_batch() {
        let initial = Attitude {
            roll_rad: 0.0,
            pitch_rad: 0.0,
            yaw_rad: 0.25,
        };

        let (attitude, records) = integrate(&[], 0.05, &initial);

        assert_eq!(attitude.yaw_rad, initial.yaw_rad);
        assert!(records.is_empty());
    }

    #[test]
    fn test_update_accumulates_across_batches() {
        let params = Params { imu_step_s: 0.05 };
        let mut est = AttEst::new(&params);

        let batch: Vec<ImuSample> = (0..2).map(|i| imu(i as f64 * 0.05, [0.0, 0.0, 1.0])).collect();
        est.update(&batch);

        let batch: Vec<ImuSample> = (0..3).map(|i| imu(i as f64 * 0.05, [0.0, 0.0, 1.0])).collect();
        let records = est.update(&batch);

        // Five sub-samples in total, never reset between batches
        let mut expected_yaw = 0.0;
        for _ in 0..5 {
            expected_yaw += 1.0 * 0.05;
        }

        assert_eq!(est.attitude().yaw_rad, expected_yaw);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].yaw_rad, expected_yaw);
    }

    #[test]
    fn test_validation() {
        assert!(Params { imu_step_s: 0.05 }.validate().is_ok());

        assert!(matches!(
            Params { imu_step_s: 0.0 }.validate(),
            Err(AttEstError::InvalidStep(_))
        ));
        assert!(Params { imu_step_s: -0.05 }.validate().is_err());

        // NaN and infinite steps fail the range guard too
        assert!(Params { imu_step_s: f64::NAN }.validate().is_err());
        assert!(Params { imu_step_s: f64::INFINITY }.validate().is_err());
    }
}
