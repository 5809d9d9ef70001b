//! Leaves that read and write the blackboard.
//!
//! Each one owns a [`Client`] named after it. Variable names may be relative (resolved against
//! the root namespace) or absolute, and reads may carry an attribute path (`nested.foo`); the
//! key registered is always the part before the first `.`.

use std::cmp::Ordering;

use arbor_blackboard::{Access, Blackboard, BlackboardError, Client, RegistrationError, Value};
use serde::{Deserialize, Serialize};

use crate::behaviour::Behaviour;
use crate::error::UpdateError;
use crate::status::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// `variable <operator> value`, evaluated against whatever the blackboard holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonExpression {
    pub variable: String,
    pub value: Value,
    pub operator: Comparison,
}

impl ComparisonExpression {
    pub fn new(variable: impl Into<String>, value: impl Into<Value>, operator: Comparison) -> Self {
        Self {
            variable: variable.into(),
            value: value.into(),
            operator,
        }
    }

    /// Numbers compare numerically, strings and booleans by their natural order. Values of
    /// different kinds are only ever unequal.
    pub fn evaluate(&self, actual: &Value) -> bool {
        let ordering = compare(actual, &self.value);
        match self.operator {
            Comparison::Eq => ordering == Some(Ordering::Equal),
            Comparison::Ne => ordering != Some(Ordering::Equal),
            Comparison::Lt => ordering == Some(Ordering::Less),
            Comparison::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Comparison::Gt => ordering == Some(Ordering::Greater),
            Comparison::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

impl std::fmt::Display for ComparisonExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.variable, self.operator.symbol(), self.value)
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
    /// True when an odd number of checks hold; for two checks, exactly one.
    Xor,
}

impl LogicalOperator {
    fn combine(self, results: &[bool]) -> bool {
        match self {
            Self::And => results.iter().all(|r| *r),
            Self::Or => results.iter().any(|r| *r),
            Self::Xor => results.iter().fold(false, |acc, r| acc ^ r),
        }
    }
}

fn key_of(variable: &str) -> &str {
    variable.split_once('.').map_or(variable, |(head, _)| head)
}

/// Writes `value` to `variable` every tick. `SUCCESS` once written; `FAILURE` when `overwrite`
/// is off and the variable already holds something.
#[derive(Debug)]
pub struct SetBlackboardVariable {
    client: Client,
    variable: String,
    value: Value,
    overwrite: bool,
    message: String,
}

impl SetBlackboardVariable {
    pub fn new(
        blackboard: &Blackboard,
        name: &str,
        variable: &str,
        value: impl Into<Value>,
        overwrite: bool,
    ) -> Result<Self, RegistrationError> {
        let mut client = blackboard.client(name);
        client.register_key(variable, Access::Write)?;
        Ok(Self {
            client,
            variable: variable.to_string(),
            value: value.into(),
            overwrite,
            message: String::new(),
        })
    }
}

impl Behaviour for SetBlackboardVariable {
    fn update(&mut self) -> Result<Status, UpdateError> {
        match self
            .client
            .set(&self.variable, self.value.clone(), self.overwrite)
        {
            Ok(()) => {
                self.message = format!("{} = {}", self.variable, self.value);
                Ok(Status::Success)
            }
            Err(BlackboardError::KeyExists { .. }) => {
                self.message = format!("'{}' already set, not overwriting", self.variable);
                Ok(Status::Failure)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }

    fn blackboard_clients(&self) -> Vec<&Client> {
        vec![&self.client]
    }
}

/// Removes `key` from the blackboard. Always `SUCCESS`, whether or not it was there.
#[derive(Debug)]
pub struct UnsetBlackboardVariable {
    client: Client,
    key: String,
}

impl UnsetBlackboardVariable {
    pub fn new(blackboard: &Blackboard, name: &str, key: &str) -> Result<Self, RegistrationError> {
        let mut client = blackboard.client(name);
        client.register_key(key, Access::Write)?;
        Ok(Self {
            client,
            key: key.to_string(),
        })
    }
}

impl Behaviour for UnsetBlackboardVariable {
    fn update(&mut self) -> Result<Status, UpdateError> {
        match self.client.unset(&self.key) {
            Ok(()) => Ok(Status::Success),
            Err(err) if err.is_no_such_key() => Ok(Status::Success),
            Err(err) => Err(err.into()),
        }
    }

    fn blackboard_clients(&self) -> Vec<&Client> {
        vec![&self.client]
    }
}

/// Shared by the existence checks: registers read access on the variable's key.
#[derive(Debug)]
struct Watch {
    client: Client,
    variable: String,
}

impl Watch {
    fn new(blackboard: &Blackboard, name: &str, variable: &str) -> Result<Self, RegistrationError> {
        let mut client = blackboard.client(name);
        client.register_key(key_of(variable), Access::Read)?;
        Ok(Self {
            client,
            variable: variable.to_string(),
        })
    }

    fn read(&self) -> Result<Option<Value>, UpdateError> {
        match self.client.get(&self.variable) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_no_such_key() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// `SUCCESS` if `variable` is set, `FAILURE` otherwise.
#[derive(Debug)]
pub struct CheckBlackboardVariableExists {
    watch: Watch,
    message: String,
}

impl CheckBlackboardVariableExists {
    pub fn new(blackboard: &Blackboard, name: &str, variable: &str) -> Result<Self, RegistrationError> {
        Ok(Self {
            watch: Watch::new(blackboard, name, variable)?,
            message: String::new(),
        })
    }
}

impl Behaviour for CheckBlackboardVariableExists {
    fn update(&mut self) -> Result<Status, UpdateError> {
        if self.watch.read()?.is_some() {
            self.message = format!("'{}' exists", self.watch.variable);
            Ok(Status::Success)
        } else {
            self.message = format!("'{}' does not exist", self.watch.variable);
            Ok(Status::Failure)
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }

    fn blackboard_clients(&self) -> Vec<&Client> {
        vec![&self.watch.client]
    }
}

/// `RUNNING` until `variable` is set, then `SUCCESS`.
#[derive(Debug)]
pub struct WaitForBlackboardVariable {
    watch: Watch,
    message: String,
}

impl WaitForBlackboardVariable {
    pub fn new(blackboard: &Blackboard, name: &str, variable: &str) -> Result<Self, RegistrationError> {
        Ok(Self {
            watch: Watch::new(blackboard, name, variable)?,
            message: String::new(),
        })
    }
}

impl Behaviour for WaitForBlackboardVariable {
    fn update(&mut self) -> Result<Status, UpdateError> {
        if self.watch.read()?.is_some() {
            self.message = format!("'{}' found", self.watch.variable);
            Ok(Status::Success)
        } else {
            self.message = format!("waiting for '{}'", self.watch.variable);
            Ok(Status::Running)
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }

    fn blackboard_clients(&self) -> Vec<&Client> {
        vec![&self.watch.client]
    }
}

/// `SUCCESS` when the check holds, `FAILURE` when it does not or the variable is unset.
#[derive(Debug)]
pub struct CheckBlackboardVariableValue {
    watch: Watch,
    check: ComparisonExpression,
    message: String,
}

impl CheckBlackboardVariableValue {
    pub fn new(
        blackboard: &Blackboard,
        name: &str,
        check: ComparisonExpression,
    ) -> Result<Self, RegistrationError> {
        Ok(Self {
            watch: Watch::new(blackboard, name, &check.variable)?,
            check,
            message: String::new(),
        })
    }
}

impl Behaviour for CheckBlackboardVariableValue {
    fn update(&mut self) -> Result<Status, UpdateError> {
        let Some(actual) = self.watch.read()? else {
            self.message = format!("'{}' does not exist", self.check.variable);
            return Ok(Status::Failure);
        };
        if self.check.evaluate(&actual) {
            self.message = format!("'{}' comparison succeeded [{actual}]", self.check);
            Ok(Status::Success)
        } else {
            self.message = format!("'{}' comparison failed [{actual}]", self.check);
            Ok(Status::Failure)
        }
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }

    fn blackboard_clients(&self) -> Vec<&Client> {
        vec![&self.watch.client]
    }
}

/// Evaluates several checks and folds them with a logical operator.
///
/// With a `namespace`, the individual results are also written there as an object keyed by
/// check number (`"1"`, `"2"`, ...), readable as `<namespace>.<n>`.
#[derive(Debug)]
pub struct CheckBlackboardVariableValues {
    client: Client,
    checks: Vec<ComparisonExpression>,
    operator: LogicalOperator,
    namespace: Option<String>,
    message: String,
}

impl CheckBlackboardVariableValues {
    pub fn new(
        blackboard: &Blackboard,
        name: &str,
        checks: Vec<ComparisonExpression>,
        operator: LogicalOperator,
        namespace: Option<&str>,
    ) -> Result<Self, RegistrationError> {
        let mut client = blackboard.client(name);
        for check in &checks {
            let key = key_of(&check.variable);
            if !client.is_registered(key) {
                client.register_key(key, Access::Read)?;
            }
        }
        if let Some(namespace) = namespace {
            client.register_key(namespace, Access::Write)?;
        }
        Ok(Self {
            client,
            checks,
            operator,
            namespace: namespace.map(str::to_string),
            message: String::new(),
        })
    }
}

impl Behaviour for CheckBlackboardVariableValues {
    fn update(&mut self) -> Result<Status, UpdateError> {
        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let holds = match self.client.get(&check.variable) {
                Ok(actual) => check.evaluate(&actual),
                Err(err) if err.is_no_such_key() => false,
                Err(err) => return Err(err.into()),
            };
            results.push(holds);
        }

        if let Some(namespace) = &self.namespace {
            let recorded: serde_json::Map<String, Value> = results
                .iter()
                .enumerate()
                .map(|(i, holds)| ((i + 1).to_string(), Value::Bool(*holds)))
                .collect();
            self.client.set(namespace, Value::Object(recorded), true)?;
        }

        let passed = self.operator.combine(&results);
        self.message = format!("{:?} over {:?}", self.operator, results);
        Ok(if passed { Status::Success } else { Status::Failure })
    }

    fn feedback_message(&self) -> &str {
        &self.message
    }

    fn blackboard_clients(&self) -> Vec<&Client> {
        vec![&self.client]
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn comparisons_follow_value_kinds() {
        let gt = ComparisonExpression::new("speed", 30, Comparison::Gt);
        assert!(gt.evaluate(&json!(30.5)));
        assert!(!gt.evaluate(&json!(30)));
        assert!(!gt.evaluate(&json!("fast")));

        let eq = ComparisonExpression::new("mode", "enabled", Comparison::Eq);
        assert!(eq.evaluate(&json!("enabled")));
        assert!(ComparisonExpression::new("mode", "enabled", Comparison::Ne).evaluate(&json!(1)));
        assert!(ComparisonExpression::new("n", json!(null), Comparison::Eq).evaluate(&json!(null)));
    }

    #[test]
    fn xor_is_parity() {
        assert!(LogicalOperator::Xor.combine(&[true, false]));
        assert!(!LogicalOperator::Xor.combine(&[true, true]));
        assert!(!LogicalOperator::Xor.combine(&[false, false]));
    }

    #[test]
    fn attribute_paths_register_the_head_key() {
        assert_eq!(key_of("nested.foo"), "nested");
        assert_eq!(key_of("/either_or.1"), "/either_or");
    }
}
