//! The unlock orchestrator: types the credential into the peer's lock
//! screen through the input actuator.
//!
//! The sequence is fixed and strictly sequential; each step waits for the
//! previous one (and its settle delay) to complete:
//!
//! 1. space — wakes the peer's display
//! 2. wait 2000 ms — display power-on
//! 3. space — dismisses the lock-screen overlay
//! 4. wait 500 ms — overlay dismiss animation
//! 5. select-all, wait 50 ms, backspace, wait 50 ms — clears any stale
//!    input sitting in the credential field
//! 6. credential text + newline
//!
//! The external authentication gate (biometric prompt, PIN entry on the
//! handheld) is the caller's responsibility: `run` must only be invoked
//! after that gate has succeeded.
//!
//! Failure is not retried.  If the actuator reports no bound host the
//! orchestrator stops where it is; a retry loop typing into a lock screen
//! at the wrong moment does more damage than a visible failure.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::infrastructure::hid_peripheral::InputActuator;

/// Display wake settle time after the first keystroke.
const WAKE_DELAY: Duration = Duration::from_millis(2000);
/// Lock-screen overlay dismiss animation time.
const OVERLAY_DELAY: Duration = Duration::from_millis(500);
/// Settle time between the field-clearing keystrokes.
const CLEAR_DELAY: Duration = Duration::from_millis(50);

/// Errors reported by the unlock sequence.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnlockError {
    /// The actuator has no bound host; nothing was (or will be) typed for
    /// the failed step onward.
    #[error("no input host is bound")]
    NoBoundHost,
}

/// Sequences actuator primitives into the credential-injection flow.
pub struct UnlockSequence {
    actuator: Arc<InputActuator>,
}

impl UnlockSequence {
    pub fn new(actuator: Arc<InputActuator>) -> Self {
        Self { actuator }
    }

    /// Runs the full wake → clear → type sequence.
    ///
    /// Call only after the external authentication gate has succeeded.
    pub async fn run(&self, credential: &str) -> Result<(), UnlockError> {
        info!("starting unlock sequence");

        // Wake the display.
        self.step(self.actuator.send_text(" ").await)?;
        sleep(WAKE_DELAY).await;

        // Dismiss the lock-screen overlay.
        self.step(self.actuator.send_text(" ").await)?;
        sleep(OVERLAY_DELAY).await;

        // Clear any stale input from the credential field.
        self.step(self.actuator.send_select_all().await)?;
        sleep(CLEAR_DELAY).await;
        self.step(self.actuator.send_backspace().await)?;
        sleep(CLEAR_DELAY).await;

        // Type the credential and submit it.
        let submitted = self.actuator.send_text(&format!("{credential}\n")).await;
        self.step(submitted)?;

        info!("credential sent");
        Ok(())
    }

    fn step(&self, sent: bool) -> Result<(), UnlockError> {
        if sent {
            Ok(())
        } else {
            warn!("unlock sequence aborted: no bound host");
            Err(UnlockError::NoBoundHost)
        }
    }
}
