//! Plain text views printed after each tick.

use std::fmt;

use arbor_blackboard::{ActivityItem, Blackboard, Value};
use arbor_bt::{BehaviourTree, Node, SnapshotVisitor, TypeTag};

/// The tree, the blackboard keys its visited nodes touched and the tick's activity.
pub struct TickReport<'a> {
    pub tree: &'a BehaviourTree,
    pub visitor: &'a SnapshotVisitor,
    pub blackboard: &'a Blackboard,
}

impl fmt::Display for TickReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--------- Tick {} ---------\n", self.tree.count())?;
        let tip = self.tree.tip();
        for node in self.tree.nodes() {
            let depth = depth(self.tree, node);
            write!(f, "{:indent$}{} {}", "", marker(node.type_tag()), node.name(), indent = depth * 4)?;
            match self.visitor.visited().get(&node.id()) {
                Some(status) => write!(f, " [{status}]")?,
                None => write!(f, " [-]")?,
            }
            if !node.feedback_message().is_empty() {
                write!(f, " -- {}", node.feedback_message())?;
            }
            if tip == Some(node.id()) {
                write!(f, " <<")?;
            }
            writeln!(f)?;
        }

        let keys = self
            .blackboard
            .keys_filtered_by_clients(self.visitor.visited_blackboard_client_ids());
        if !keys.is_empty() {
            writeln!(f, "\nBlackboard Data")?;
            for key in keys {
                match self.blackboard.get(&key) {
                    Some(value) => writeln!(f, "    {key}: {}", compact(&value))?,
                    None => writeln!(f, "    {key}: -")?,
                }
            }
        }

        if let Some(activity) = self.blackboard.activity_stream() {
            if !activity.is_empty() {
                writeln!(f, "\nBlackboard Activity Stream")?;
                for item in &activity {
                    writeln!(f, "    {}", ActivityLine(item))?;
                }
            }
        }
        Ok(())
    }
}

struct ActivityLine<'a>(&'a ActivityItem);

impl fmt::Display for ActivityLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let item = self.0;
        write!(
            f,
            "{} {} : {} | {}",
            item.timestamp.format("%H:%M:%S%.3f"),
            item.key,
            item.activity_type,
            item.client_name
        )?;
        match (&item.previous_value, &item.current_value) {
            (Some(previous), Some(current)) => {
                write!(f, " | {} -> {}", compact(previous), compact(current))
            }
            (None, Some(current)) => write!(f, " | -> {}", compact(current)),
            (Some(previous), None) => write!(f, " | {} ->", compact(previous)),
            (None, None) => Ok(()),
        }
    }
}

fn depth(tree: &BehaviourTree, node: &Node) -> usize {
    std::iter::successors(node.parent(), |id| tree.node(*id).and_then(Node::parent)).count()
}

fn marker(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Sequence => "{-}",
        TypeTag::Selector => "[o]",
        TypeTag::Parallel => "/_/",
        TypeTag::Decorator => "-^-",
        TypeTag::Behaviour => "-->",
    }
}

fn compact(value: &Value) -> String {
    const LIMIT: usize = 60;
    let text = value.to_string();
    if text.chars().count() > LIMIT {
        let truncated: String = text.chars().take(LIMIT).collect();
        format!("{truncated}...")
    } else {
        text
    }
}
