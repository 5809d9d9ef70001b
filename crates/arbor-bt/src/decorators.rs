//! Single-child wrappers that reshape their child's status.
//!
//! A decorator sees only its child's status and its own local state. It may also gate the child,
//! answering for a tick without ticking it at all (see [`OneShot`] and [`Timeout`]). Whenever a
//! decorator resolves while its child is still `RUNNING`, the engine stops the child with
//! `INVALID`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::status::Status;

pub trait Decorator: 'static {
    fn setup(&mut self) -> Result<(), SetupError> {
        Ok(())
    }

    fn initialise(&mut self) {}

    /// Decide the tick without consulting the child. `None` ticks the child as usual.
    fn gate(&mut self) -> Option<Status> {
        None
    }

    /// Map the child's status for this tick onto the decorator's own.
    fn decorate(&mut self, child: Status) -> Status;

    fn terminate(&mut self, _new_status: Status) {}

    /// Empty means "show the child's message".
    fn feedback_message(&self) -> &str {
        ""
    }
}

macro_rules! status_remap {
    ($(#[$doc:meta])* $name:ident { $($from:ident => $to:ident),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Decorator for $name {
            fn decorate(&mut self, child: Status) -> Status {
                match child {
                    $(Status::$from => Status::$to,)+
                    other => other,
                }
            }
        }
    };
}

status_remap!(
    /// Swaps `SUCCESS` and `FAILURE`.
    Inverter { Success => Failure, Failure => Success }
);
status_remap!(FailureIsRunning { Failure => Running });
status_remap!(FailureIsSuccess { Failure => Success });
status_remap!(RunningIsFailure { Running => Failure });
status_remap!(RunningIsSuccess { Running => Success });
status_remap!(SuccessIsFailure { Success => Failure });
status_remap!(SuccessIsRunning { Success => Running });

#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Decorator for PassThrough {
    fn decorate(&mut self, child: Status) -> Status {
        child
    }
}

/// `SUCCESS` once the child reports `status`, `RUNNING` until then.
#[derive(Debug, Clone)]
pub struct Condition {
    status: Status,
    message: String,
}

impl Condition {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            message: String::new(),
        }
    }
}

impl Decorator for Condition {
    fn decorate(&mut self, child: Status) -> Status {
        if child == self.status {
            self.message = format!("child reached {}", self.status);
            Status::Success
        } else {
            self.message = format!("waiting for child to reach {} [{child}]", self.status);
            Status::Running
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }
}

/// Re-run a succeeding child until it has succeeded `num_success` times. A failure fails
/// immediately. `None` repeats forever.
#[derive(Debug, Clone)]
pub struct Repeat {
    num_success: Option<u32>,
    successes: u32,
    message: String,
}

impl Repeat {
    pub fn new(num_success: Option<u32>) -> Self {
        Self {
            num_success,
            successes: 0,
            message: String::new(),
        }
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }
}

impl Decorator for Repeat {
    fn initialise(&mut self) {
        self.successes = 0;
    }

    fn decorate(&mut self, child: Status) -> Status {
        match child {
            Status::Success => {
                self.successes += 1;
                match self.num_success {
                    Some(n) => {
                        self.message = format!("success {}/{n}", self.successes);
                        if self.successes >= n {
                            Status::Success
                        } else {
                            Status::Running
                        }
                    }
                    None => {
                        self.message = format!("success {}/inf", self.successes);
                        Status::Running
                    }
                }
            }
            other => other,
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }
}

/// Re-run a failing child, giving up after `num_failures` failures. A success succeeds
/// immediately.
#[derive(Debug, Clone)]
pub struct Retry {
    num_failures: u32,
    failures: u32,
    message: String,
}

impl Retry {
    pub fn new(num_failures: u32) -> Self {
        Self {
            num_failures,
            failures: 0,
            message: String::new(),
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl Decorator for Retry {
    fn initialise(&mut self) {
        self.failures = 0;
    }

    fn decorate(&mut self, child: Status) -> Status {
        match child {
            Status::Failure => {
                self.failures += 1;
                self.message = format!("failure {}/{}", self.failures, self.num_failures);
                if self.failures >= self.num_failures {
                    Status::Failure
                } else {
                    Status::Running
                }
            }
            other => other,
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneShotPolicy {
    /// Latch whichever terminal status the child first reaches.
    OnCompletion,
    /// Latch only `SUCCESS`; failures allow another attempt.
    OnSuccessfulCompletion,
}

/// Runs the child to completion once, then keeps answering with the latched result without
/// ticking it again.
#[derive(Debug, Clone)]
pub struct OneShot {
    policy: OneShotPolicy,
    latched: Option<Status>,
}

impl OneShot {
    pub fn new(policy: OneShotPolicy) -> Self {
        Self {
            policy,
            latched: None,
        }
    }

    pub fn latched(&self) -> Option<Status> {
        self.latched
    }
}

impl Decorator for OneShot {
    fn gate(&mut self) -> Option<Status> {
        self.latched
    }

    fn decorate(&mut self, child: Status) -> Status {
        let latch = match self.policy {
            OneShotPolicy::OnCompletion => child.is_terminal(),
            OneShotPolicy::OnSuccessfulCompletion => child == Status::Success,
        };
        if latch {
            self.latched = Some(child);
        }
        child
    }

    fn feedback_message(&self) -> &str {
        if self.latched.is_some() {
            "oneshot has fired"
        } else {
            ""
        }
    }
}

/// Fails the child if it is still running `duration` after it started.
#[derive(Debug, Clone)]
pub struct Timeout {
    duration: Duration,
    deadline: Option<Instant>,
    expired: bool,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
            expired: false,
        }
    }
}

impl Decorator for Timeout {
    fn initialise(&mut self) {
        self.deadline = Some(Instant::now() + self.duration);
        self.expired = false;
    }

    fn gate(&mut self) -> Option<Status> {
        let deadline = self.deadline?;
        if Instant::now() >= deadline {
            self.expired = true;
            Some(Status::Failure)
        } else {
            None
        }
    }

    fn decorate(&mut self, child: Status) -> Status {
        child
    }

    fn terminate(&mut self, _new_status: Status) {
        self.deadline = None;
    }

    fn feedback_message(&self) -> &str {
        if self.expired {
            "timed out"
        } else {
            ""
        }
    }
}
