//! Main drive test executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logger and parameters
//!     - Initialise the drive manager module
//!     - Connect the simulator clients
//!     - Run the drive test to completion
//!     - Archive the accumulated trace
//!
//! The executable performs a single drive test per invocation. The trace is
//! archived into the session directory whether the test succeeds or fails,
//! since a partial trace is still worth keeping for a failed test.
//!
//! # Modules
//!
//! All modules (e.g. `drive_mgr`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use drive_lib::{
    drive_mgr::DriveMgr,
    sim_client::{DriveClient, SampleClient},
    trace::{CsvRecorder, Recorder},
};
use sim_if::net::NetParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
    time::WallClockTicker,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Trolley Drive Test Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut drive_mgr = DriveMgr::default();
    drive_mgr
        .init("drive_mgr.toml", &session)
        .wrap_err("Failed to initialise DriveMgr")?;
    info!("DriveMgr init complete");

    // The recorder is created up front so a trace can be archived even if the
    // test itself fails part way through.
    let mut recorder =
        CsvRecorder::from_session(&session).wrap_err("Failed to create the trace recorder")?;

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = sim_if::net::zmq::Context::new();

    let mut sample_client = {
        let c = SampleClient::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise SampleClient")?;
        info!("SampleClient initialised");
        c
    };

    let mut drive_client = {
        let c = DriveClient::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise DriveClient")?;
        info!("DriveClient initialised");
        c
    };

    info!("Network initialisation complete");

    // ---- RUN DRIVE TEST ----

    let mut ticker = WallClockTicker::new(drive_mgr.params().tick_period_s);

    let run_result = drive_mgr.run(&mut sample_client, &mut drive_client, &mut ticker);

    // ---- WRITE ARCHIVES ----

    recorder
        .record(drive_mgr.trace())
        .wrap_err("Failed to archive the drive trace")?;

    info!(
        "Trace archived: {} tick records, {} attitude records",
        drive_mgr.trace().ticks.len(),
        drive_mgr.trace().att.len()
    );

    let report = run_result.wrap_err("Drive test failed")?;

    info!(
        "Drive test complete: {:?} after {} ticks",
        report.stop_cause, report.num_ticks
    );

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}
