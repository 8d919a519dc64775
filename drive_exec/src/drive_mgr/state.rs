//! Implementations for the DriveMgr state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::Serialize;
use sim_if::eqpt::veh::{Actuator, DriveCmd, DriveCmdResponse, ImuSample, Sample, SampleSource};

// Internal
use super::{DriveMgrError, DriveMode, Params, StopCause};
use crate::att_est::AttEst;
use crate::speed_ctrl::SpeedCtrl;
use crate::trace::{DriveTrace, TickRecord};
use util::{maths, module::State, params, session::Session, time::Ticker};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive manager module state
pub struct DriveMgr {
    params: Params,

    mode: DriveMode,

    /// Number of completed control ticks.
    tick_count: u64,

    speed_ctrl: SpeedCtrl,

    att_est: AttEst,

    trace: DriveTrace,
}

/// Input data to the drive manager: the equipment data polled for one tick.
pub struct InputData {
    /// The vehicle state sample for this tick.
    pub sample: Sample,

    /// The IMU sub-samples accumulated since the previous tick, oldest first.
    /// Empty if the vehicle has no inertial sensor attached.
    pub imu_batch: Vec<ImuSample>,
}

/// Output command from the drive manager that must be issued to the vehicle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutputData {
    /// The drive command for this tick.
    pub drive_cmd: DriveCmd,
}

/// Status report for drive manager processing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// Mode of the manager after this tick, [`DriveMode::Stopped`] on the
    /// terminating tick.
    pub mode: DriveMode,

    /// True if this tick's throttle demand was clamped to the valid range.
    pub saturated: bool,

    /// Distance from the vehicle to the target position at this tick.
    ///
    /// Units: meters
    pub distance_to_target_m: f64,
}

/// Summary of a completed drive test run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunReport {
    /// Why the test stopped.
    pub stop_cause: StopCause,

    /// Number of control ticks completed.
    pub num_ticks: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveMgr {
    /// A defaulted manager holds placeholder parameters and must be
    /// initialised before running a test.
    fn default() -> Self {
        let params = Params::default();

        Self {
            speed_ctrl: SpeedCtrl::new(&params.speed_ctrl),
            att_est: AttEst::new(&params.att_est),
            params,
            mode: DriveMode::Running,
            tick_count: 0,
            trace: DriveTrace::new(),
        }
    }
}

impl State for DriveMgr {
    type InitData = &'static str;
    type InitError = DriveMgrError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = DriveMgrError;

    /// Initialise the DriveMgr module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        let params: Params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(DriveMgrError::ParamLoadError(e)),
        };

        *self = Self::from_params(params)?;

        Ok(())
    }

    /// Perform the processing for one control tick.
    ///
    /// The input is the equipment data already polled for this tick, the
    /// output is the drive command to issue for it. Issuing the command and
    /// pacing the tick belong to [`DriveMgr::run`].
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // A stopped manager never processes another tick
        if let DriveMode::Stopped(_) = self.mode {
            return Err(DriveMgrError::NotRunning);
        }

        let sample = &input_data.sample;

        // Speed over ground is the norm of the velocity vector
        let speed_ms = Vector3::from(sample.velocity_ms).norm();

        let demand = self.speed_ctrl.update(
            self.params.target_speed_mps,
            speed_ms,
            self.params.tick_period_s,
        );

        let att_records = self.att_est.update(&input_data.imu_batch);
        let attitude = *self.att_est.attitude();

        self.trace.push_tick(TickRecord {
            time_s: sample.time_s,
            pos_x_m: sample.position_m[0],
            pos_y_m: sample.position_m[1],
            pos_z_m: sample.position_m[2],
            speed_kph: maths::mps_to_kph(speed_ms),
            throttle: demand.throttle,
            roll_rad: attitude.roll_rad,
            pitch_rad: attitude.pitch_rad,
            yaw_rad: attitude.yaw_rad,
        });
        self.trace.append_att(att_records);

        self.tick_count += 1;

        let distance_m = (Vector3::from(sample.position_m)
            - Vector3::from(self.params.target_position_m))
        .norm();

        // Proximity is evaluated before the tick ceiling, so the test stops
        // on the first satisfying tick even when the ceiling expires on the
        // same tick
        if distance_m <= self.params.proximity_threshold_m {
            info!(
                "Within {:.2} m of the target after {} ticks, stopping",
                distance_m, self.tick_count
            );
            self.mode = DriveMode::Stopped(StopCause::TargetProximity);
        } else if self.tick_count >= self.params.max_ticks {
            info!("Tick ceiling ({}) reached, stopping", self.params.max_ticks);
            self.mode = DriveMode::Stopped(StopCause::TickLimit);
        }

        debug!(
            "Tick {}: speed {:.2} km/h, throttle {:.3}, target {:.2} m away",
            self.tick_count,
            maths::mps_to_kph(speed_ms),
            demand.throttle,
            distance_m
        );

        let output = OutputData {
            drive_cmd: DriveCmd {
                throttle: demand.throttle,
                steering: 0.0,
                brake: 0.0,
            },
        };

        let report = StatusReport {
            mode: self.mode,
            saturated: demand.saturated,
            distance_to_target_m: distance_m,
        };

        Ok((output, report))
    }
}

impl DriveMgr {
    /// Create a new manager directly from parameters, validating them first.
    ///
    /// This is the construction path for callers which already hold a
    /// `Params`, [`State::init`] loads the parameter file and delegates here.
    pub fn from_params(params: Params) -> Result<Self, DriveMgrError> {
        params.validate()?;

        Ok(Self {
            speed_ctrl: SpeedCtrl::new(&params.speed_ctrl),
            att_est: AttEst::new(&params.att_est),
            params,
            mode: DriveMode::Running,
            tick_count: 0,
            trace: DriveTrace::new(),
        })
    }

    /// Run the drive test to completion.
    ///
    /// Loops over [`State::proc`], pacing each tick with the ticker and
    /// exchanging data with the equipment. Returns the run summary once a
    /// termination condition is met, or the first fatal error.
    ///
    /// Whichever way the loop exits the vehicle is commanded to stop. On the
    /// nominal path a stop delivery failure is itself an error, on the error
    /// path the stop is best-effort and the original error is returned.
    pub fn run<S: SampleSource, A: Actuator, T: Ticker>(
        &mut self,
        source: &mut S,
        actuator: &mut A,
        ticker: &mut T,
    ) -> Result<RunReport, DriveMgrError> {
        if let DriveMode::Stopped(_) = self.mode {
            return Err(DriveMgrError::NotRunning);
        }

        info!(
            "Drive test starting: target speed {:.2} m/s, tick period {:.3} s, max {} ticks",
            self.params.target_speed_mps, self.params.tick_period_s, self.params.max_ticks
        );

        let stop_cause = loop {
            ticker.wait();

            // A source failure is fatal, there is no retry
            let sample = match source.poll() {
                Ok(s) => s,
                Err(e) => {
                    stop_best_effort(actuator);
                    return Err(DriveMgrError::SourceUnavailable(e));
                }
            };
            let imu_batch = match source.poll_imu() {
                Ok(b) => b,
                Err(e) => {
                    stop_best_effort(actuator);
                    return Err(DriveMgrError::SourceUnavailable(e));
                }
            };

            let (output, report) = self.proc(&InputData { sample, imu_batch })?;

            match actuator.drive(&output.drive_cmd) {
                Ok(DriveCmdResponse::CmdOk) => (),
                Ok(resp) => warn!("Drive command rejected by the vehicle: {:?}", resp),
                Err(e) => {
                    stop_best_effort(actuator);
                    return Err(DriveMgrError::ActuatorUnavailable(e));
                }
            }

            if let DriveMode::Stopped(cause) = report.mode {
                break cause;
            }
        };

        // The test is over, bring the vehicle to a stop
        match actuator.drive(&DriveCmd::stop()) {
            Ok(DriveCmdResponse::CmdOk) => (),
            Ok(resp) => warn!("Stop command rejected by the vehicle: {:?}", resp),
            Err(e) => return Err(DriveMgrError::ActuatorUnavailable(e)),
        }

        info!("Drive test stopped after {} ticks", self.tick_count);

        Ok(RunReport {
            stop_cause,
            num_ticks: self.tick_count,
        })
    }

    /// Get the trace accumulated so far.
    pub fn trace(&self) -> &DriveTrace {
        &self.trace
    }

    /// Get the manager's parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Get the current mode of the manager.
    pub fn mode(&self) -> DriveMode {
        self.mode
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Issue a stop command on an error exit. A failure here is logged only, the
/// error which ended the run takes precedence.
fn stop_best_effort<A: Actuator>(actuator: &mut A) {
    if let Err(e) = actuator.drive(&DriveCmd::stop()) {
        warn!("Could not issue the stop command: {}", e);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{att_est, speed_ctrl};
    use sim_if::eqpt::veh::{ActuatorError, SourceError};
    use std::collections::VecDeque;
    use util::time::NoDelayTicker;

    fn test_params(max_ticks: u64) -> Params {
        Params {
            target_speed_mps: 13.89,
            tick_period_s: 0.05,
            max_ticks,
            target_position_m: [1000.0, 0.0, 0.0],
            proximity_threshold_m: 5.0,
            speed_ctrl: speed_ctrl::Params {
                control_law: speed_ctrl::ControlLaw::Proportional,
                k_p: 0.1,
                k_i: 0.0,
                k_d: 0.0,
                base_throttle: 0.5,
            },
            att_est: att_est::Params { imu_step_s: 0.05 },
        }
    }

    fn sample(time_s: f64, position_m: [f64; 3], velocity_ms: [f64; 3]) -> Sample {
        Sample {
            time_s,
            position_m,
            velocity_ms,
            acc_mss: [0.0; 3],
            ang_vel_rads: [0.0; 3],
        }
    }

    fn imu_batch(len: usize, ang_vel_smooth_rads: [f64; 3]) -> Vec<ImuSample> {
        (0..len)
            .map(|i| ImuSample {
                time_s: i as f64 * 0.05,
                acc_smooth_mss: [0.0; 3],
                ang_vel_smooth_rads,
            })
            .collect()
    }

    /// Source scripted with a fixed sequence of ticks, acting disconnected
    /// once they run out.
    struct FakeSource {
        ticks: VecDeque<(Sample, Vec<ImuSample>)>,
        pending_imu: Option<Vec<ImuSample>>,
    }

    impl FakeSource {
        fn new(ticks: Vec<(Sample, Vec<ImuSample>)>) -> Self {
            Self {
                ticks: ticks.into(),
                pending_imu: None,
            }
        }
    }

    impl SampleSource for FakeSource {
        fn poll(&mut self) -> Result<Sample, SourceError> {
            match self.ticks.pop_front() {
                Some((sample, imu)) => {
                    self.pending_imu = Some(imu);
                    Ok(sample)
                }
                None => Err(SourceError::NotConnected),
            }
        }

        fn poll_imu(&mut self) -> Result<Vec<ImuSample>, SourceError> {
            Ok(self.pending_imu.take().unwrap_or_default())
        }
    }

    /// Actuator recording every delivered command, optionally failing all
    /// deliveries from the nth onwards or rejecting every delivery.
    struct FakeActuator {
        cmds: Vec<DriveCmd>,
        fail_from: Option<usize>,
        response: DriveCmdResponse,
    }

    impl FakeActuator {
        fn new() -> Self {
            Self {
                cmds: Vec::new(),
                fail_from: None,
                response: DriveCmdResponse::CmdOk,
            }
        }

        fn failing_from(n: usize) -> Self {
            Self {
                fail_from: Some(n),
                ..Self::new()
            }
        }

        fn rejecting() -> Self {
            Self {
                response: DriveCmdResponse::CmdInvalid,
                ..Self::new()
            }
        }
    }

    impl Actuator for FakeActuator {
        fn drive(&mut self, cmd: &DriveCmd) -> Result<DriveCmdResponse, ActuatorError> {
            if let Some(n) = self.fail_from {
                if self.cmds.len() >= n {
                    return Err(ActuatorError::NotConnected);
                }
            }

            self.cmds.push(*cmd);
            Ok(self.response)
        }
    }

    /// Ticks which cruise far from the target, so only the tick ceiling can
    /// stop the test.
    fn cruising_ticks(len: usize) -> Vec<(Sample, Vec<ImuSample>)> {
        (0..len)
            .map(|i| {
                (
                    sample(i as f64 * 0.05, [0.0, 0.0, 0.0], [10.0, 0.0, 0.0]),
                    imu_batch(2, [0.0, 0.0, 1.0]),
                )
            })
            .collect()
    }

    #[test]
    fn test_tick_limit_termination() {
        let mut mgr = DriveMgr::from_params(test_params(5)).unwrap();
        let mut source = FakeSource::new(cruising_ticks(10));
        let mut actuator = FakeActuator::new();

        let report = mgr
            .run(&mut source, &mut actuator, &mut NoDelayTicker)
            .unwrap();

        assert_eq!(report.stop_cause, StopCause::TickLimit);
        assert_eq!(report.num_ticks, 5);
        assert_eq!(mgr.mode(), DriveMode::Stopped(StopCause::TickLimit));

        // Five throttle demands then the final stop
        assert_eq!(actuator.cmds.len(), 6);
        assert_eq!(*actuator.cmds.last().unwrap(), DriveCmd::stop());
        for cmd in actuator.cmds[..5].iter() {
            assert_eq!(cmd.steering, 0.0);
            assert_eq!(cmd.brake, 0.0);
        }

        // One tick record per tick, one attitude record per sub-sample
        assert_eq!(mgr.trace().ticks.len(), 5);
        assert_eq!(mgr.trace().att.len(), 10);
    }

    #[test]
    fn test_proximity_termination() {
        let mut mgr = DriveMgr::from_params(test_params(100)).unwrap();

        // Closing on the target at [1000, 0, 0], inside the 5 m threshold on
        // the third tick only
        let ticks = [900.0, 950.0, 997.0, 998.0]
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                (
                    sample(i as f64 * 0.05, [x, 0.0, 0.0], [10.0, 0.0, 0.0]),
                    Vec::new(),
                )
            })
            .collect();
        let mut source = FakeSource::new(ticks);
        let mut actuator = FakeActuator::new();

        let report = mgr
            .run(&mut source, &mut actuator, &mut NoDelayTicker)
            .unwrap();

        assert_eq!(report.stop_cause, StopCause::TargetProximity);
        assert_eq!(report.num_ticks, 3);

        // The satisfying tick still issues its demand before the stop
        assert_eq!(actuator.cmds.len(), 4);
        assert_eq!(*actuator.cmds.last().unwrap(), DriveCmd::stop());
        assert_eq!(mgr.trace().ticks.len(), 3);
    }

    #[test]
    fn test_proximity_wins_on_last_tick() {
        // Ceiling of 3 ticks, and the third tick is also within the
        // threshold, proximity must be the reported cause
        let mut mgr = DriveMgr::from_params(test_params(3)).unwrap();

        let ticks = [900.0, 950.0, 999.0]
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                (
                    sample(i as f64 * 0.05, [x, 0.0, 0.0], [10.0, 0.0, 0.0]),
                    Vec::new(),
                )
            })
            .collect();
        let mut source = FakeSource::new(ticks);
        let mut actuator = FakeActuator::new();

        let report = mgr
            .run(&mut source, &mut actuator, &mut NoDelayTicker)
            .unwrap();

        assert_eq!(report.stop_cause, StopCause::TargetProximity);
        assert_eq!(report.num_ticks, 3);
    }

    #[test]
    fn test_source_failure_stops_vehicle() {
        let mut mgr = DriveMgr::from_params(test_params(50)).unwrap();

        // Only two ticks are scripted, the third poll finds the source gone
        let mut source = FakeSource::new(cruising_ticks(2));
        let mut actuator = FakeActuator::new();

        let result = mgr.run(&mut source, &mut actuator, &mut NoDelayTicker);

        assert!(matches!(result, Err(DriveMgrError::SourceUnavailable(_))));

        // Two demands then the best-effort stop
        assert_eq!(actuator.cmds.len(), 3);
        assert_eq!(*actuator.cmds.last().unwrap(), DriveCmd::stop());
        assert_eq!(mgr.trace().ticks.len(), 2);
    }

    #[test]
    fn test_rejected_cmds_do_not_stop_the_run() {
        let mut mgr = DriveMgr::from_params(test_params(3)).unwrap();
        let mut source = FakeSource::new(cruising_ticks(5));

        // Every demand is delivered but rejected by the vehicle
        let mut actuator = FakeActuator::rejecting();

        let report = mgr
            .run(&mut source, &mut actuator, &mut NoDelayTicker)
            .unwrap();

        // Rejection only warns, the test runs to the ceiling and the final
        // stop is still issued
        assert_eq!(report.stop_cause, StopCause::TickLimit);
        assert_eq!(report.num_ticks, 3);
        assert_eq!(actuator.cmds.len(), 4);
        assert_eq!(*actuator.cmds.last().unwrap(), DriveCmd::stop());
    }

    #[test]
    fn test_actuator_failure_is_fatal() {
        let mut mgr = DriveMgr::from_params(test_params(50)).unwrap();
        let mut source = FakeSource::new(cruising_ticks(10));

        // The second delivery and everything after it fails, including the
        // best-effort stop
        let mut actuator = FakeActuator::failing_from(1);

        let result = mgr.run(&mut source, &mut actuator, &mut NoDelayTicker);

        assert!(matches!(result, Err(DriveMgrError::ActuatorUnavailable(_))));
        assert_eq!(actuator.cmds.len(), 1);
    }

    #[test]
    fn test_trace_content() {
        let mut mgr = DriveMgr::from_params(test_params(10)).unwrap();

        let input = InputData {
            sample: sample(0.0, [0.0, 0.0, 0.0], [3.0, 4.0, 0.0]),
            imu_batch: imu_batch(2, [0.0, 0.0, 1.0]),
        };
        let (output, report) = mgr.proc(&input).unwrap();

        // 5 m/s against a 13.89 m/s target saturates this gain set
        assert_eq!(output.drive_cmd.throttle, 1.0);
        assert!(report.saturated);
        assert_eq!(output.drive_cmd.steering, 0.0);
        assert_eq!(output.drive_cmd.brake, 0.0);

        assert_eq!(report.mode, DriveMode::Running);
        assert_eq!(report.distance_to_target_m, 1000.0);

        let tick = &mgr.trace().ticks[0];
        assert_eq!(tick.speed_kph, 18.0);
        assert_eq!(tick.throttle, 1.0);
        assert_eq!(tick.pos_x_m, 0.0);

        // Same left-to-right summation as the integrator
        let mut expected_yaw = 0.0;
        for _ in 0..2 {
            expected_yaw += 1.0 * 0.05;
        }
        assert_eq!(tick.yaw_rad, expected_yaw);
        assert_eq!(mgr.trace().att.len(), 2);
        assert_eq!(mgr.trace().att[1].yaw_rad, expected_yaw);
    }

    #[test]
    fn test_proc_guard_when_stopped() {
        let mut mgr = DriveMgr::from_params(test_params(1)).unwrap();

        let input = InputData {
            sample: sample(0.0, [0.0, 0.0, 0.0], [10.0, 0.0, 0.0]),
            imu_batch: Vec::new(),
        };

        // The single permitted tick exhausts the ceiling
        let (_, report) = mgr.proc(&input).unwrap();
        assert_eq!(report.mode, DriveMode::Stopped(StopCause::TickLimit));

        assert!(matches!(mgr.proc(&input), Err(DriveMgrError::NotRunning)));
    }

    #[test]
    fn test_validation() {
        assert!(test_params(10).validate().is_ok());

        let mut params = test_params(10);
        params.tick_period_s = 0.0;
        assert!(matches!(
            params.validate(),
            Err(DriveMgrError::InvalidTickPeriod(_))
        ));

        let mut params = test_params(10);
        params.max_ticks = 0;
        assert!(matches!(
            params.validate(),
            Err(DriveMgrError::ZeroMaxTicks)
        ));

        let mut params = test_params(10);
        params.proximity_threshold_m = -1.0;
        assert!(matches!(
            params.validate(),
            Err(DriveMgrError::InvalidProximityThreshold(_))
        ));

        let mut params = test_params(10);
        params.target_position_m[1] = f64::NAN;
        assert!(matches!(
            params.validate(),
            Err(DriveMgrError::NonFiniteTargetPosition(_))
        ));

        let mut params = test_params(10);
        params.speed_ctrl.k_p = -0.1;
        assert!(matches!(
            params.validate(),
            Err(DriveMgrError::SpeedCtrlError(_))
        ));

        let mut params = test_params(10);
        params.att_est.imu_step_s = 0.0;
        assert!(matches!(
            params.validate(),
            Err(DriveMgrError::AttEstError(_))
        ));

        // Construction refuses invalid parameters outright
        let mut params = test_params(10);
        params.tick_period_s = -0.05;
        assert!(DriveMgr::from_params(params).is_err());
    }

    #[test]
    fn test_validation_rejects_non_finite_fields() {
        // NaN fails every ordered comparison, so a guard phrased for the
        // invalid range would let it through into the tick maths and the
        // wall clock ticker
        let mut params = test_params(10);
        params.tick_period_s = f64::NAN;
        assert!(matches!(
            params.validate(),
            Err(DriveMgrError::InvalidTickPeriod(_))
        ));

        let mut params = test_params(10);
        params.tick_period_s = f64::INFINITY;
        assert!(params.validate().is_err());

        let mut params = test_params(10);
        params.target_speed_mps = f64::NAN;
        assert!(matches!(
            params.validate(),
            Err(DriveMgrError::InvalidTargetSpeed(_))
        ));

        let mut params = test_params(10);
        params.target_speed_mps = -1.0;
        assert!(params.validate().is_err());

        let mut params = test_params(10);
        params.proximity_threshold_m = f64::NAN;
        assert!(params.validate().is_err());

        let mut params = test_params(10);
        params.target_position_m[0] = f64::INFINITY;
        assert!(params.validate().is_err());

        // A NaN tick period must never survive construction
        let mut params = test_params(10);
        params.tick_period_s = f64::NAN;
        assert!(DriveMgr::from_params(params).is_err());
    }
}
