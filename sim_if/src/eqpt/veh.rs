//! # Vehicle Equipment Interface
//!
//! Data structures exchanged with the simulated vehicle, plus the capability
//! traits (`SampleSource`, `Actuator`) which the drive executive is written
//! against. The executive never talks to a simulator directly, only to these
//! traits, so tests can substitute fakes and the real ZMQ clients can be
//! swapped for another binding without touching the control loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::net::MonitoredSocketError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A snapshot of the vehicle's motion state, produced once per control tick.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Sample {
    /// Simulation time of the snapshot.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Position of the vehicle in the simulator's world frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Velocity of the vehicle in the simulator's world frame.
    ///
    /// Units: meters/second
    pub velocity_ms: [f64; 3],

    /// Linear acceleration of the vehicle.
    ///
    /// Note this is the simulator's state-derived value, not the inertial
    /// measurement. The smoothed IMU signal in [`ImuSample`] is the
    /// authoritative acceleration source.
    ///
    /// Units: meters/second^2
    pub acc_mss: [f64; 3],

    /// Angular velocity of the vehicle body.
    ///
    /// Units: radians/second
    pub ang_vel_rads: [f64; 3],
}

/// One inertial sub-sample from the vehicle's IMU.
///
/// The sensor runs faster than the control tick, so each tick yields a batch
/// of these. Field names on the wire are the simulator's own.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ImuSample {
    /// Time of the sub-sample.
    ///
    /// Units: seconds
    #[serde(rename = "time")]
    pub time_s: f64,

    /// Smoothed linear acceleration in the sensor frame.
    ///
    /// Units: meters/second^2
    #[serde(rename = "accSmooth")]
    pub acc_smooth_mss: [f64; 3],

    /// Smoothed angular velocity in the sensor frame.
    ///
    /// Units: radians/second
    #[serde(rename = "angVelSmooth")]
    pub ang_vel_smooth_rads: [f64; 3],
}

/// Demands that are sent to the vehicle's drive equipment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DriveCmd {
    /// Throttle demand, between 0 and 1.
    pub throttle: f64,

    /// Steering demand, between -1 (full left) and +1 (full right).
    pub steering: f64,

    /// Brake demand, between 0 and 1.
    pub brake: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Requests the sample server understands.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub enum SampleRequest {
    /// Request the motion state snapshot for this tick.
    State,

    /// Request the batch of IMU sub-samples accumulated since the last
    /// request.
    Imu,
}

/// Response from the drive server based on the demands sent by the client.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum DriveCmdResponse {
    /// Demands were valid and will be executed
    CmdOk,

    /// Demands were invalid and have been rejected
    CmdInvalid,

    /// Equipment is invalid so demands cannot be actuated
    EqptInvalid,
}

/// Errors which can occur while polling a [`SampleSource`].
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The source is not connected")]
    NotConnected,

    #[error("Could not send the request to the source: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the source: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the request: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the sample: {0}")]
    DeserializeError(serde_json::Error),
}

/// Errors which can occur while driving an [`Actuator`].
#[derive(thiserror::Error, Debug)]
pub enum ActuatorError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The actuator is not connected")]
    NotConnected,

    #[error("Could not send the drive demand: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a response from the actuator: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the drive demand: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of vehicle motion state and inertial data.
///
/// Polling is synchronous, one request in flight at a time. Any error is
/// treated as fatal by the drive executive, there is no retry protocol.
pub trait SampleSource {
    /// Poll the source for the vehicle state sample for this tick.
    fn poll(&mut self) -> Result<Sample, SourceError>;

    /// Poll the source for the batch of IMU sub-samples accumulated since the
    /// last poll.
    ///
    /// A vehicle with no inertial sensor attached returns an empty batch.
    fn poll_imu(&mut self) -> Result<Vec<ImuSample>, SourceError>;
}

/// An actuator accepting drive demands for the vehicle.
pub trait Actuator {
    /// Issue a drive demand.
    ///
    /// A returned [`DriveCmdResponse`] means the demand was delivered, the
    /// response says whether the equipment accepted it. An `Err` means the
    /// demand could not be delivered at all.
    fn drive(&mut self, cmd: &DriveCmd) -> Result<DriveCmdResponse, ActuatorError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveCmd {
    /// The demand which brings the vehicle to a halt: zero throttle, zero
    /// steering, full brake.
    pub fn stop() -> Self {
        Self {
            throttle: 0.0,
            steering: 0.0,
            brake: 1.0,
        }
    }

    /// Check that all demands are within the actuator's accepted ranges.
    pub fn is_valid(&self) -> bool {
        self.throttle >= 0.0
            && self.throttle <= 1.0
            && self.steering >= -1.0
            && self.steering <= 1.0
            && self.brake >= 0.0
            && self.brake <= 1.0
    }
}
