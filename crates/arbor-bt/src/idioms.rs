//! Recurring tree shapes, assembled from the primitive nodes.

use arbor_blackboard::{Blackboard, Value};
use uuid::Uuid;

use crate::error::BuildError;
use crate::node::Subtree;
use crate::variables::{
    CheckBlackboardVariableValue, CheckBlackboardVariableValues, Comparison,
    ComparisonExpression, LogicalOperator, SetBlackboardVariable, UnsetBlackboardVariable,
};

/// Run `tasks` in order, remembering finished ones across interruptions.
///
/// Each task is guarded by a `<task>_done` flag on the blackboard. When a higher-priority branch
/// preempts the idiom and later hands control back, completed tasks are skipped instead of
/// re-run. The flags are cleared once every task is done.
pub fn pick_up_where_you_left_off(
    blackboard: &Blackboard,
    name: &str,
    tasks: Vec<Subtree>,
) -> Result<Subtree, BuildError> {
    let flags: Vec<String> = tasks.iter().map(|t| done_flag(t.name())).collect();
    let mut root = Subtree::sequence(name, true, Vec::new());

    for (task, flag) in tasks.into_iter().zip(&flags) {
        let done = CheckBlackboardVariableValue::new(
            blackboard,
            "Done?",
            ComparisonExpression::new(flag.as_str(), true, Comparison::Eq),
        )?;
        let mark_done = SetBlackboardVariable::new(blackboard, "Mark Done", flag, true, true)?;
        let worker = Subtree::sequence(
            "Worker",
            true,
            vec![task, Subtree::behaviour("Mark Done", mark_done)],
        );
        root.push(Subtree::selector(
            "Do or Don't",
            false,
            vec![Subtree::behaviour("Done?", done), worker],
        ));
    }

    for flag in &flags {
        let clear = UnsetBlackboardVariable::new(blackboard, "Clear Done", flag)?;
        root.push(Subtree::behaviour("Clear Done", clear));
    }
    Ok(root)
}

fn done_flag(task: &str) -> String {
    let slug: String = task
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '_'
            }
        })
        .collect();
    format!("{slug}_done")
}

/// Pick one of several equal-priority subtrees, first come first served.
///
/// `conditions[i]` enables `subtrees[i]`. The conditions are combined with XOR (odd parity), so
/// a choice is admitted when an odd number of them are enabled, and the first enabled option
/// wins. With two options that means exactly one. The chosen subtree then runs to completion
/// even if the conditions change under it. Individual results are kept under `namespace` (a fresh one is made up when
/// none is given).
pub fn either_or(
    blackboard: &Blackboard,
    name: &str,
    conditions: Vec<ComparisonExpression>,
    subtrees: Vec<Subtree>,
    namespace: Option<&str>,
) -> Result<Subtree, BuildError> {
    if conditions.len() != subtrees.len() {
        return Err(BuildError::Mismatch {
            conditions: conditions.len(),
            subtrees: subtrees.len(),
        });
    }
    if conditions.is_empty() {
        return Err(BuildError::Invalid("either_or needs at least one option".into()));
    }
    let namespace = match namespace {
        Some(ns) => format!("/{}", ns.trim_matches('/')),
        None => format!("/either_or_{}", Uuid::new_v4().simple()),
    };

    let xor = CheckBlackboardVariableValues::new(
        blackboard,
        "XOR",
        conditions,
        LogicalOperator::Xor,
        Some(&namespace),
    )?;
    let options = subtrees
        .into_iter()
        .enumerate()
        .map(|(i, subtree)| {
            let enabled = CheckBlackboardVariableValue::new(
                blackboard,
                "Enabled?",
                ComparisonExpression::new(
                    format!("{namespace}.{}", i + 1),
                    Value::Bool(true),
                    Comparison::Eq,
                ),
            )?;
            Ok(Subtree::sequence(
                format!("Option {}", i + 1),
                true,
                vec![Subtree::behaviour("Enabled?", enabled), subtree],
            ))
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    Ok(Subtree::sequence(
        name,
        true,
        vec![
            Subtree::behaviour("XOR", xor),
            Subtree::selector("Chooser", false, options),
        ],
    ))
}

/// Keep `conditions` under watch for as long as `subtree` runs.
///
/// Every tick re-checks each condition before `subtree`; the first one that fails stops the
/// subtree and fails the guard.
pub fn eternal_guard(name: &str, subtree: Subtree, conditions: Vec<Subtree>) -> Subtree {
    let mut children = conditions;
    children.push(subtree);
    Subtree::sequence(name, false, children)
}
