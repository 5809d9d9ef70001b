#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use arbor_bt::{Behaviour, BehaviourTree, Node, Status, Subtree, UpdateError, Visitor};

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &Log, entry: &str) -> usize {
    log.borrow().iter().filter(|e| *e == entry).count()
}

/// Replays `script` one status per update, repeating the last status once it runs out.
pub struct Scripted {
    name: &'static str,
    script: VecDeque<Status>,
    last: Status,
    log: Log,
}

impl Behaviour for Scripted {
    fn initialise(&mut self) {
        self.log.borrow_mut().push(format!("{} initialise", self.name));
    }

    fn update(&mut self) -> Result<Status, UpdateError> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.log
            .borrow_mut()
            .push(format!("{} update {}", self.name, self.last));
        Ok(self.last)
    }

    fn terminate(&mut self, new_status: Status) {
        self.log
            .borrow_mut()
            .push(format!("{} terminate {new_status}", self.name));
    }

    fn shutdown(&mut self) {
        self.log.borrow_mut().push(format!("{} shutdown", self.name));
    }
}

pub fn scripted(name: &'static str, script: &[Status], log: &Log) -> Subtree {
    Subtree::behaviour(
        name,
        Scripted {
            name,
            script: script.iter().copied().collect(),
            last: script.last().copied().unwrap_or(Status::Success),
            log: log.clone(),
        },
    )
}

/// A leaf whose status the test flips between ticks.
pub fn switch(name: &'static str, initial: Status, log: &Log) -> (Subtree, Rc<Cell<Status>>) {
    let status = Rc::new(Cell::new(initial));
    let leaf = Switch {
        name,
        status: status.clone(),
        log: log.clone(),
    };
    (Subtree::behaviour(name, leaf), status)
}

struct Switch {
    name: &'static str,
    status: Rc<Cell<Status>>,
    log: Log,
}

impl Behaviour for Switch {
    fn update(&mut self) -> Result<Status, UpdateError> {
        let status = self.status.get();
        self.log
            .borrow_mut()
            .push(format!("{} update {status}", self.name));
        Ok(status)
    }

    fn terminate(&mut self, new_status: Status) {
        self.log
            .borrow_mut()
            .push(format!("{} terminate {new_status}", self.name));
    }
}

/// Records visitor callbacks into the shared log.
pub struct Recorder(pub Log);

impl Visitor for Recorder {
    fn initialise(&mut self) {
        self.0.borrow_mut().push("visitor initialise".to_string());
    }

    fn run(&mut self, node: &Node) {
        self.0.borrow_mut().push(format!("visit {}", node.name()));
    }

    fn finalise(&mut self) {
        self.0.borrow_mut().push("visitor finalise".to_string());
    }
}

pub fn ready(root: Subtree) -> BehaviourTree {
    let mut tree = BehaviourTree::new(root);
    tree.setup(Duration::from_secs(5)).unwrap();
    tree
}

pub fn status_of(tree: &BehaviourTree, name: &str) -> Status {
    tree.find(name).unwrap().status()
}
