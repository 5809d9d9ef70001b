//! Stock leaves that need nothing but the tick itself.

use std::collections::VecDeque;

use crate::behaviour::Behaviour;
use crate::error::{SetupError, UpdateError};
use crate::status::Status;

#[derive(Debug, Clone, Copy, Default)]
pub struct Success;

impl Behaviour for Success {
    fn update(&mut self) -> Result<Status, UpdateError> {
        Ok(Status::Success)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Failure;

impl Behaviour for Failure {
    fn update(&mut self) -> Result<Status, UpdateError> {
        Ok(Status::Failure)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Running;

impl Behaviour for Running {
    fn update(&mut self) -> Result<Status, UpdateError> {
        Ok(Status::Running)
    }
}

/// Placeholder for a leaf not written yet. Runs forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dummy;

impl Behaviour for Dummy {
    fn update(&mut self) -> Result<Status, UpdateError> {
        Ok(Status::Running)
    }
}

/// Replays a scripted list of statuses, one per tick.
///
/// Once the queue runs dry it answers `eventually` forever; without `eventually` the queue is
/// replayed from the start.
#[derive(Debug, Clone)]
pub struct StatusQueue {
    script: Vec<Status>,
    queue: VecDeque<Status>,
    eventually: Option<Status>,
    message: String,
}

impl StatusQueue {
    pub fn new(queue: Vec<Status>, eventually: Option<Status>) -> Self {
        Self {
            queue: queue.iter().copied().collect(),
            script: queue,
            eventually,
            message: String::new(),
        }
    }
}

impl Behaviour for StatusQueue {
    fn setup(&mut self) -> Result<(), SetupError> {
        if self.script.contains(&Status::Invalid) || self.eventually == Some(Status::Invalid) {
            return Err(SetupError::msg("status queue may not script INVALID"));
        }
        if self.script.is_empty() && self.eventually.is_none() {
            return Err(SetupError::msg("status queue needs a queue or an eventual status"));
        }
        Ok(())
    }

    fn update(&mut self) -> Result<Status, UpdateError> {
        if self.queue.is_empty() && self.eventually.is_none() {
            self.queue.extend(self.script.iter().copied());
        }
        let status = match self.queue.pop_front() {
            Some(status) => {
                self.message = format!("{} queued statuses left", self.queue.len());
                status
            }
            None => {
                self.message = "queue exhausted".to_string();
                self.eventually
                    .ok_or_else(|| UpdateError::msg("status queue is empty"))?
            }
        };
        Ok(status)
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }
}

/// `SUCCESS` on every `n`th tick, `FAILURE` on all the others.
#[derive(Debug, Clone)]
pub struct SuccessEveryN {
    n: u64,
    count: u64,
    message: String,
}

impl SuccessEveryN {
    pub fn new(n: u64) -> Self {
        Self {
            n,
            count: 0,
            message: String::new(),
        }
    }

    /// Ticks seen so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Behaviour for SuccessEveryN {
    fn setup(&mut self) -> Result<(), SetupError> {
        if self.n == 0 {
            return Err(SetupError::msg("n must be at least 1"));
        }
        Ok(())
    }

    fn update(&mut self) -> Result<Status, UpdateError> {
        self.count += 1;
        if self.count % self.n.max(1) == 0 {
            self.message = "now".to_string();
            Ok(Status::Success)
        } else {
            self.message = format!("{} to go", self.n - self.count % self.n.max(1));
            Ok(Status::Failure)
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }
}

/// Cycles `RUNNING`, `SUCCESS`, `FAILURE`, holding each for `n` ticks.
#[derive(Debug, Clone)]
pub struct Periodic {
    period: u64,
    count: u64,
    response: Status,
    message: String,
}

impl Periodic {
    pub fn new(n: u64) -> Self {
        Self {
            period: n.max(1),
            count: 0,
            response: Status::Running,
            message: String::new(),
        }
    }
}

impl Behaviour for Periodic {
    fn update(&mut self) -> Result<Status, UpdateError> {
        self.count += 1;
        if self.count > self.period {
            self.count = 1;
            self.response = match self.response {
                Status::Running => Status::Success,
                Status::Success => Status::Failure,
                _ => Status::Running,
            };
        }
        self.message = format!("{} [{}/{}]", self.response, self.count, self.period);
        Ok(self.response)
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }
}

/// Runs for `duration` ticks after each start, then resolves to `completion_status`.
#[derive(Debug, Clone)]
pub struct TickCounter {
    duration: u64,
    completion_status: Status,
    counter: u64,
    message: String,
}

impl TickCounter {
    pub fn new(duration: u64, completion_status: Status) -> Self {
        Self {
            duration,
            completion_status,
            counter: 0,
            message: String::new(),
        }
    }
}

impl Behaviour for TickCounter {
    fn setup(&mut self) -> Result<(), SetupError> {
        if self.completion_status == Status::Invalid {
            return Err(SetupError::msg("completion status may not be INVALID"));
        }
        Ok(())
    }

    fn initialise(&mut self) {
        self.counter = 0;
    }

    fn update(&mut self) -> Result<Status, UpdateError> {
        self.counter += 1;
        self.message = format!("{} / {}", self.counter, self.duration);
        if self.counter >= self.duration {
            Ok(self.completion_status)
        } else {
            Ok(Status::Running)
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }
}
