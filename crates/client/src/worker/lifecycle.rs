//! Worker lifecycle state machine.
//!
//! ```text
//! Parsed ──install──▶ Installing ──ok──▶ Installed ──activate──▶ Activating ──▶ Activated
//!                         │
//!                         └──precache failed──▶ Redundant
//! ```

use serde::{Deserialize, Serialize};
use shellcache_core::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
    /// A failed install left this worker unusable.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
    claimed: bool,
}

impl Lifecycle {
    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Whether the worker has taken control of open pages.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Reinstalling over an installed or redundant worker is allowed; the
    /// platform retries failed installs.
    pub fn begin_install(&mut self) -> Result<(), Error> {
        match self.state {
            WorkerState::Parsed | WorkerState::Installed | WorkerState::Redundant => {
                self.state = WorkerState::Installing;
                Ok(())
            }
            other => Err(Error::InvalidState(format!("cannot install while {other}"))),
        }
    }

    pub fn finish_install(&mut self, succeeded: bool) {
        self.state = if succeeded { WorkerState::Installed } else { WorkerState::Redundant };
    }

    /// Returns false when the worker is already active or another caller
    /// is activating it.
    pub fn begin_activate(&mut self) -> Result<bool, Error> {
        match self.state {
            WorkerState::Installed => {
                self.state = WorkerState::Activating;
                Ok(true)
            }
            WorkerState::Activating | WorkerState::Activated => Ok(false),
            other => Err(Error::InvalidState(format!("cannot activate while {other}"))),
        }
    }

    pub fn finish_activate(&mut self) {
        self.state = WorkerState::Activated;
        self.claimed = true;
    }

    pub fn abort_activate(&mut self) {
        self.state = WorkerState::Installed;
    }

    /// Record a skip-waiting request. Returns true when the worker is
    /// installed and should activate right away.
    pub fn request_skip_waiting(&mut self) -> bool {
        self.skip_waiting = true;
        self.state == WorkerState::Installed
    }
}
