//! The bundled demo trees.

use anyhow::Result;
use arbor_blackboard::{Access, Blackboard, BlackboardError, Client, RegistrationError};
use arbor_bt::behaviours::{Periodic, Running, StatusQueue, SuccessEveryN, TickCounter};
use arbor_bt::decorators::{FailureIsRunning, RunningIsFailure};
use arbor_bt::idioms::{either_or, pick_up_where_you_left_off};
use arbor_bt::variables::{CheckBlackboardVariableValue, SetBlackboardVariable};
use arbor_bt::{
    Behaviour, Comparison, ComparisonExpression, ParallelPolicy, Status, Subtree, UpdateError,
};
use clap::ValueEnum;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoName {
    Sequence,
    Selector,
    Parallel,
    Blackboard,
    Remappings,
    EitherOr,
    PickUp,
    ContextSwitching,
}

/// A demo tree plus how long it takes to show everything worth seeing.
pub struct Demo {
    pub root: Subtree,
    pub ticks: u64,
}

impl DemoName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Selector => "selector",
            Self::Parallel => "parallel",
            Self::Blackboard => "blackboard",
            Self::Remappings => "remappings",
            Self::EitherOr => "either-or",
            Self::PickUp => "pick-up",
            Self::ContextSwitching => "context-switching",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Sequence => "a memory sequence working through three actions",
            Self::Selector => "a higher priority branch preempting a running one",
            Self::Parallel => "three counters of different lengths ticked side by side",
            Self::Blackboard => "namespaced clients, attribute reads and refused writes",
            Self::Remappings => "a client writing through a remapped key",
            Self::EitherOr => "joystick events choosing between two tasks",
            Self::PickUp => "tasks resuming where they stopped after an interruption",
            Self::ContextSwitching => "a context held for as long as a sequence runs",
        }
    }

    pub fn build(self, blackboard: &Blackboard) -> Result<Demo> {
        match self {
            Self::Sequence => Ok(sequence()),
            Self::Selector => Ok(selector()),
            Self::Parallel => Ok(parallel()),
            Self::Blackboard => blackboard_access(blackboard),
            Self::Remappings => remappings(blackboard),
            Self::EitherOr => joysticks(blackboard),
            Self::PickUp => pick_up(blackboard),
            Self::ContextSwitching => Ok(context_switching()),
        }
    }
}

impl std::fmt::Display for DemoName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn action(name: &str) -> Subtree {
    Subtree::behaviour(
        name,
        StatusQueue::new(vec![Status::Running, Status::Success], Some(Status::Success)),
    )
}

fn sequence() -> Demo {
    Demo {
        root: Subtree::sequence(
            "Sequence",
            true,
            vec![action("Action 1"), action("Action 2"), action("Action 3")],
        ),
        ticks: 6,
    }
}

fn selector() -> Demo {
    let ffs = StatusQueue::new(
        vec![Status::Failure, Status::Failure, Status::Success],
        Some(Status::Success),
    );
    Demo {
        root: Subtree::selector(
            "Selector",
            false,
            vec![
                Subtree::behaviour("After Two", ffs),
                Subtree::behaviour("Running", Running),
            ],
        ),
        ticks: 4,
    }
}

fn parallel() -> Demo {
    let counter =
        |name: &str, ticks| Subtree::behaviour(name, TickCounter::new(ticks, Status::Success));
    Demo {
        root: Subtree::parallel(
            "Parallel",
            ParallelPolicy::SuccessOnAll { synchronise: true },
            vec![counter("Short", 1), counter("Medium", 2), counter("Long", 3)],
        ),
        ticks: 4,
    }
}

fn blackboard_access(blackboard: &Blackboard) -> Result<Demo> {
    blackboard.set("/dude", "Bob")?;
    blackboard.set("/parameters/default_speed", 30.0)?;

    let set_nested =
        SetBlackboardVariable::new(blackboard, "Set Nested", "nested", json!({"foo": "bar"}), true)?;
    let check_nested = CheckBlackboardVariableValue::new(
        blackboard,
        "Check Nested Foo",
        ComparisonExpression::new("nested.foo", "bar", Comparison::Eq),
    )?;
    let root = Subtree::sequence(
        "Blackboard Demo",
        true,
        vec![
            Subtree::behaviour("Set Nested", set_nested),
            Subtree::behaviour("Writer", BlackboardWriter::new(blackboard)?),
            Subtree::behaviour("Check Nested Foo", check_nested),
            Subtree::behaviour("Params And State", ParamsAndState::new(blackboard)?),
        ],
    );
    Ok(Demo { root, ticks: 12 })
}

fn remappings(blackboard: &Blackboard) -> Result<Demo> {
    let check = CheckBlackboardVariableValue::new(
        blackboard,
        "Check Wow",
        ComparisonExpression::new("/parameters/wow", "colander", Comparison::Eq),
    )?;
    let root = Subtree::sequence(
        "Remappings",
        false,
        vec![
            Subtree::behaviour("Remap", Remap::new(blackboard, "Remap", "/parameters/wow")?),
            Subtree::behaviour("Check Wow", check),
        ],
    );
    Ok(Demo { root, ticks: 1 })
}

fn joystick(blackboard: &Blackboard, number: u8, every: u64, key: &str) -> Result<Subtree> {
    let pressed = Subtree::decorator(
        format!("Joystick {number} Pressed?"),
        FailureIsRunning,
        Subtree::behaviour(format!("Every {every}"), SuccessEveryN::new(every)),
    );
    let name = format!("Joystick {number} - Enabled");
    let enable = SetBlackboardVariable::new(blackboard, &name, key, "enabled", true)?;
    Ok(Subtree::sequence(
        format!("Joystick {number} Events"),
        true,
        vec![pressed, Subtree::behaviour(name, enable)],
    ))
}

fn joysticks(blackboard: &Blackboard) -> Result<Demo> {
    let mut reset = Vec::new();
    for (number, key) in [(1, "joystick_one"), (2, "joystick_two")] {
        let name = format!("Joystick {number} - Disabled");
        let disable = SetBlackboardVariable::new(blackboard, &name, key, "disabled", true)?;
        reset.push(Subtree::behaviour(name, disable));
    }
    let task = |name: &str| Subtree::behaviour(name, TickCounter::new(2, Status::Success));
    let chooser = either_or(
        blackboard,
        "Either Or",
        vec![
            ComparisonExpression::new("joystick_one", "enabled", Comparison::Eq),
            ComparisonExpression::new("joystick_two", "enabled", Comparison::Eq),
        ],
        vec![task("Task 1"), task("Task 2")],
        Some("either_or"),
    )?;
    let root = Subtree::parallel(
        "Root",
        ParallelPolicy::SuccessOnAll { synchronise: false },
        vec![
            Subtree::sequence("Reset", true, reset),
            joystick(blackboard, 1, 4, "joystick_one")?,
            joystick(blackboard, 2, 7, "joystick_two")?,
            Subtree::selector(
                "Tasks",
                false,
                vec![chooser, Subtree::behaviour("Idle", Running)],
            ),
        ],
    );
    Ok(Demo { root, ticks: 14 })
}

fn pick_up(blackboard: &Blackboard) -> Result<Demo> {
    let task = |name: &str| {
        Subtree::behaviour(
            name,
            StatusQueue::new(
                vec![Status::Running, Status::Running, Status::Success],
                Some(Status::Success),
            ),
        )
    };
    let high_priority = Subtree::decorator(
        "High Priority",
        RunningIsFailure,
        Subtree::behaviour("Periodic", Periodic::new(3)),
    );
    let tasks = pick_up_where_you_left_off(
        blackboard,
        "Pick Up Where You Left Off",
        vec![task("Task 1"), task("Task 2")],
    )?;
    Ok(Demo {
        root: Subtree::selector("Root", false, vec![high_priority, tasks]),
        ticks: 12,
    })
}

fn context_switching() -> Demo {
    let work = Subtree::sequence(
        "Sequence",
        true,
        ["Action 1", "Action 2"]
            .into_iter()
            .map(|name| {
                Subtree::behaviour(
                    name,
                    StatusQueue::new(vec![Status::Running, Status::Running], Some(Status::Success)),
                )
            })
            .collect(),
    );
    Demo {
        root: Subtree::parallel(
            "Parallel",
            ParallelPolicy::SuccessOnOne,
            vec![Subtree::behaviour("Context Switch", ContextSwitch::default()), work],
        ),
        ticks: 8,
    }
}

/// Writes a couple of values and shows what the client is not allowed to do.
struct BlackboardWriter {
    client: Client,
    message: String,
}

impl BlackboardWriter {
    fn new(blackboard: &Blackboard) -> Result<Self, RegistrationError> {
        let mut client = blackboard.client("Writer");
        client.register_key("dude", Access::Read)?;
        client.register_key("spaghetti", Access::Write)?;
        Ok(Self {
            client,
            message: String::new(),
        })
    }
}

impl Behaviour for BlackboardWriter {
    fn update(&mut self) -> Result<Status, UpdateError> {
        let dude = self.client.get("dude")?;
        self.client.set("spaghetti", json!({"type": "Carbonara", "quantity": 1}), true)?;
        self.client.set("spaghetti", json!({"type": "Gnocchi", "quantity": 2}), true)?;
        match self
            .client
            .set("spaghetti", json!({"type": "Bolognese", "quantity": 3}), false)
        {
            Ok(()) | Err(BlackboardError::KeyExists { .. }) => {}
            Err(err) => return Err(err.into()),
        }
        if let Err(err) = self.client.get("dudette") {
            debug!(error = %err, "unregistered read refused");
        }
        if let Err(err) = self.client.set("dudette", "Jill", true) {
            debug!(error = %err, "unregistered write refused");
        }
        self.message = format!("dude is {dude}");
        Ok(Status::Success)
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }

    fn blackboard_clients(&self) -> Vec<&Client> {
        vec![&self.client]
    }
}

/// Reads a parameter once per run and accelerates from it until past the limit.
struct ParamsAndState {
    parameters: Client,
    state: Client,
    speed: Option<f64>,
    message: String,
}

impl ParamsAndState {
    const LIMIT: f64 = 40.0;

    fn new(blackboard: &Blackboard) -> Result<Self, RegistrationError> {
        let mut parameters = blackboard.namespaced_client("Params And State", "parameters")?;
        parameters.register_key("default_speed", Access::Read)?;
        let mut state = blackboard.namespaced_client("Params And State", "state")?;
        state.register_key("current_speed", Access::Write)?;
        // absolute keys may live outside the client's namespace
        state.register_key("/brilliant", Access::Write)?;
        Ok(Self {
            parameters,
            state,
            speed: None,
            message: String::new(),
        })
    }
}

impl Behaviour for ParamsAndState {
    fn initialise(&mut self) {
        self.speed = None;
    }

    fn update(&mut self) -> Result<Status, UpdateError> {
        let speed = match self.speed {
            Some(speed) => speed,
            None => self.parameters.get_as::<f64>("default_speed")?,
        } + 1.0;
        self.speed = Some(speed);
        self.state.set("current_speed", speed, true)?;
        self.state.set("/brilliant", speed > Self::LIMIT, true)?;
        self.message = format!("speed {speed}");
        if speed > Self::LIMIT {
            Ok(Status::Success)
        } else {
            Ok(Status::Running)
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }

    fn blackboard_clients(&self) -> Vec<&Client> {
        vec![&self.parameters, &self.state]
    }
}

/// Always writes `/foo/bar/wow`, wherever that has been remapped to.
struct Remap {
    client: Client,
}

impl Remap {
    fn new(blackboard: &Blackboard, name: &str, remap_to: &str) -> Result<Self, RegistrationError> {
        let mut client = blackboard.client(name);
        client.register_key_remapped("/foo/bar/wow", Access::Write, remap_to)?;
        Ok(Self { client })
    }
}

impl Behaviour for Remap {
    fn update(&mut self) -> Result<Status, UpdateError> {
        self.client.set("/foo/bar/wow", "colander", true)?;
        Ok(Status::Success)
    }

    fn blackboard_clients(&self) -> Vec<&Client> {
        vec![&self.client]
    }
}

/// Holds a context open while it runs and restores the previous one when stopped.
struct ContextSwitch {
    context: &'static str,
    saved: Option<&'static str>,
}

impl Default for ContextSwitch {
    fn default() -> Self {
        Self {
            context: "no context",
            saved: None,
        }
    }
}

impl Behaviour for ContextSwitch {
    fn initialise(&mut self) {
        self.saved = Some(self.context);
        self.context = "new context";
    }

    fn update(&mut self) -> Result<Status, UpdateError> {
        Ok(Status::Running)
    }

    fn terminate(&mut self, _new_status: Status) {
        if self.saved.take().is_some() {
            self.context = "restored context";
        }
    }

    fn feedback_message(&self) -> &str {
        self.context
    }
}
