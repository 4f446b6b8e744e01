/// Platform-specific functionality — process elevation queries and the
/// elevated-restart launcher.
pub mod permissions;

use crate::engine::{Elevation, ElevationMode, RestartOutcome};
use tracing::{info, warn};

/// [`Elevation`] collaborator backed by the current process's token.
///
/// On Windows the mode comes from the token elevation flag and restarts go
/// through ShellExecute's "runas" verb; elsewhere the process is always
/// reported as standard and restarts fail.
#[derive(Debug, Default)]
pub struct ProcessElevation;

impl Elevation for ProcessElevation {
    fn current_mode(&self) -> ElevationMode {
        if permissions::is_elevated() {
            ElevationMode::Administrator
        } else {
            ElevationMode::Standard
        }
    }

    fn restart(&self, mode: ElevationMode) -> RestartOutcome {
        if self.current_mode() == mode {
            return RestartOutcome {
                success: false,
                already_in_target_mode: true,
                error_message: None,
            };
        }
        if mode == ElevationMode::Standard {
            // Dropping privileges would need a token filter, not a relaunch.
            return RestartOutcome {
                success: false,
                already_in_target_mode: false,
                error_message: Some("restarting into standard mode is not supported".to_owned()),
            };
        }
        match permissions::restart_elevated() {
            Ok(()) => {
                info!("elevated instance launched; this process should exit");
                RestartOutcome {
                    success: true,
                    already_in_target_mode: false,
                    error_message: None,
                }
            }
            Err(message) => {
                warn!("elevated restart failed: {message}");
                RestartOutcome {
                    success: false,
                    already_in_target_mode: false,
                    error_message: Some(message),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Off Windows the process is always standard and a restart into the
    /// current mode reports already-in-target-mode.
    #[cfg(not(windows))]
    #[test]
    fn non_windows_is_always_standard() {
        let elevation = ProcessElevation;
        assert_eq!(elevation.current_mode(), ElevationMode::Standard);

        let outcome = elevation.restart(ElevationMode::Standard);
        assert!(!outcome.success);
        assert!(outcome.already_in_target_mode);

        let outcome = elevation.restart(ElevationMode::Administrator);
        assert!(!outcome.success);
        assert!(outcome.error_message.is_some());
    }
}
