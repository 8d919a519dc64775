//! # Simulator Client
//!
//! This module provides the networking binding between the drive executive and the simulator's
//! vehicle servers. Two thin clients are provided, one per server:
//!
//! - [`SampleClient`] polls vehicle state samples and IMU batches, implementing
//!   [`SampleSource`].
//! - [`DriveClient`] issues drive commands, implementing [`Actuator`].
//!
//! Both are request-reply clients over a [`MonitoredSocket`], so construction blocks until the
//! simulator is reachable and a vanished simulator is reported as a `NotConnected` error rather
//! than a hang.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::de::DeserializeOwned;

use sim_if::{
    eqpt::veh::{
        Actuator, ActuatorError, DriveCmd, DriveCmdResponse, ImuSample, Sample, SampleRequest,
        SampleSource, SourceError,
    },
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client polling the simulator's sample server.
pub struct SampleClient {
    socket: MonitoredSocket,
}

/// Client issuing drive commands to the simulator's drive server.
pub struct DriveClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SampleClient {
    /// Create a new instance of the sample client.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, SourceError> {
        // Sample replies carry a tick's worth of data, so the receive timeout is generous
        // compared to the drive client's.
        let socket_options = SocketOptions {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 1000,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REQ, socket_options, &params.sample_endpoint)
            .map_err(SourceError::SocketError)?;

        Ok(Self { socket })
    }

    /// Perform one request-reply exchange with the sample server.
    fn request<R: DeserializeOwned>(&mut self, request: &SampleRequest) -> Result<R, SourceError> {
        // If not connected return now
        if !self.socket.connected() {
            return Err(SourceError::NotConnected);
        }

        let request_str =
            serde_json::to_string(request).map_err(SourceError::SerializationError)?;

        self.socket
            .send(&request_str, 0)
            .map_err(SourceError::SendError)?;

        let msg = self.socket.recv_msg(0).map_err(SourceError::RecvError)?;

        serde_json::from_str(msg.as_str().unwrap_or("")).map_err(SourceError::DeserializeError)
    }
}

impl SampleSource for SampleClient {
    fn poll(&mut self) -> Result<Sample, SourceError> {
        self.request(&SampleRequest::State)
    }

    fn poll_imu(&mut self) -> Result<Vec<ImuSample>, SourceError> {
        self.request(&SampleRequest::Imu)
    }
}

impl DriveClient {
    /// Create a new instance of the drive client.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ActuatorError> {
        let socket_options = SocketOptions {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REQ, socket_options, &params.drive_endpoint)
            .map_err(ActuatorError::SocketError)?;

        Ok(Self { socket })
    }
}

impl Actuator for DriveClient {
    /// Issue a drive command to the server.
    ///
    /// The command is acknowledged by the server within the configured timeout, the
    /// acknowledgement saying whether the command was accepted. Demands which fail
    /// [`DriveCmd::is_valid`] are rejected client-side as [`DriveCmdResponse::CmdInvalid`]
    /// without contacting the server.
    fn drive(&mut self, cmd: &DriveCmd) -> Result<DriveCmdResponse, ActuatorError> {
        // If not connected return now
        if !self.socket.connected() {
            return Err(ActuatorError::NotConnected);
        }

        // Malformed demands are rejected without a round trip
        if !cmd.is_valid() {
            return Ok(DriveCmdResponse::CmdInvalid);
        }

        let cmd_str = serde_json::to_string(cmd).map_err(ActuatorError::SerializationError)?;

        self.socket
            .send(&cmd_str, 0)
            .map_err(ActuatorError::SendError)?;

        let msg = self.socket.recv_msg(0).map_err(ActuatorError::RecvError)?;

        serde_json::from_str(msg.as_str().unwrap_or("")).map_err(ActuatorError::DeserializeError)
    }
}
