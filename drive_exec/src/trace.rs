//! Drive trace accumulation and archiving
//!
//! The trace is the product of a drive test: one [`TickRecord`] per control
//! tick and one [`AttRecord`] per IMU sub-sample, accumulated in memory by
//! the drive manager and written out once the run terminates. Records are
//! flat scalar structs so they serialise directly into the session's CSV
//! archives.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use crate::att_est::AttRecord;
use util::archive::Archiver;
use util::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One row of the per-tick trace.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickRecord {
    /// Simulation time of the tick's vehicle sample.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Vehicle position in the world frame, x component.
    ///
    /// Units: meters
    pub pos_x_m: f64,

    /// Vehicle position in the world frame, y component.
    ///
    /// Units: meters
    pub pos_y_m: f64,

    /// Vehicle position in the world frame, z component.
    ///
    /// Units: meters
    pub pos_z_m: f64,

    /// Speed over ground at the tick.
    ///
    /// Units: kilometers/hour
    pub speed_kph: f64,

    /// Throttle demand issued at the tick, between 0 and 1.
    pub throttle: f64,

    /// Integrated roll at the end of the tick.
    ///
    /// Units: radians
    pub roll_rad: f64,

    /// Integrated pitch at the end of the tick.
    ///
    /// Units: radians
    pub pitch_rad: f64,

    /// Integrated yaw at the end of the tick.
    ///
    /// Units: radians
    pub yaw_rad: f64,
}

/// The accumulated trace of a drive test run.
///
/// Append-only, owned by the drive manager while the run is in progress.
#[derive(Debug, Default)]
pub struct DriveTrace {
    /// Per-tick records, one per completed control tick.
    pub ticks: Vec<TickRecord>,

    /// Per-sub-sample attitude records, in integration order.
    pub att: Vec<AttRecord>,
}

/// A recorder which archives the trace as CSV files in the session's archive
/// directory.
pub struct CsvRecorder {
    arch_ticks: Archiver,
    arch_att: Archiver,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while recording a trace.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Could not create the trace archive directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("Could not create a trace archive: {0}")]
    CreateArchiveError(csv::Error),

    #[error("Could not write a trace record: {0}")]
    WriteError(csv::Error),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A sink which the completed trace of a run is written into.
pub trait Recorder {
    /// Record the full trace.
    fn record(&mut self, trace: &DriveTrace) -> Result<(), RecorderError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveTrace {
    /// Create a new empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one tick record.
    pub fn push_tick(&mut self, record: TickRecord) {
        self.ticks.push(record);
    }

    /// Append the attitude records of one tick's IMU batch.
    pub fn append_att(&mut self, mut records: Vec<AttRecord>) {
        self.att.append(&mut records);
    }
}

impl CsvRecorder {
    /// Create a new recorder writing into `drive_mgr/` under the session's
    /// archive root.
    pub fn from_session(session: &Session) -> Result<Self, RecorderError> {
        let mut arch_path = session.arch_root.clone();
        arch_path.push("drive_mgr");
        std::fs::create_dir_all(arch_path).map_err(RecorderError::CreateDirError)?;

        let arch_ticks = Archiver::from_path(session, "drive_mgr/ticks.csv")
            .map_err(RecorderError::CreateArchiveError)?;
        let arch_att = Archiver::from_path(session, "drive_mgr/attitude.csv")
            .map_err(RecorderError::CreateArchiveError)?;

        Ok(Self {
            arch_ticks,
            arch_att,
        })
    }
}

impl Recorder for CsvRecorder {
    fn record(&mut self, trace: &DriveTrace) -> Result<(), RecorderError> {
        for record in trace.ticks.iter() {
            self.arch_ticks
                .serialise(record)
                .map_err(RecorderError::WriteError)?;
        }

        for record in trace.att.iter() {
            self.arch_att
                .serialise(record)
                .map_err(RecorderError::WriteError)?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn tick(time_s: f64) -> TickRecord {
        TickRecord {
            time_s,
            pos_x_m: 0.0,
            pos_y_m: 0.0,
            pos_z_m: 0.0,
            speed_kph: 0.0,
            throttle: 0.0,
            roll_rad: 0.0,
            pitch_rad: 0.0,
            yaw_rad: 0.0,
        }
    }

    fn att(time_s: f64) -> AttRecord {
        AttRecord {
            time_s,
            acc_x_mss: 0.0,
            acc_y_mss: 0.0,
            acc_z_mss: 0.0,
            roll_rad: 0.0,
            pitch_rad: 0.0,
            yaw_rad: 0.0,
        }
    }

    #[test]
    fn test_trace_accumulation() {
        let mut trace = DriveTrace::new();

        trace.push_tick(tick(0.0));
        trace.append_att(vec![att(0.00), att(0.05)]);

        trace.push_tick(tick(0.1));
        trace.append_att(vec![att(0.10)]);

        // Appends never replace earlier records
        assert_eq!(trace.ticks.len(), 2);
        assert_eq!(trace.att.len(), 3);
        assert_eq!(trace.ticks[0].time_s, 0.0);
        assert_eq!(trace.att[2].time_s, 0.10);
    }
}
