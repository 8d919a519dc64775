//! Host platform (linux for example) utility functions

use std::path::PathBuf;

/// Name of the environment variable giving the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "TROLLEY_SW_ROOT";

/// Get the path to the software root directory.
///
/// The root is read from the `TROLLEY_SW_ROOT` environment variable, which
/// must point at the directory containing `params` and `sessions`.
pub fn get_trolley_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
