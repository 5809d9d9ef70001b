//! Arbor CLI - behaviour tree demos.
//!
//! - `arbor demo <name>` - tick one of the bundled trees and show what happened
//! - `arbor list` - list the bundled trees

mod config;
mod demos;
mod display;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use arbor_blackboard::Blackboard;
use arbor_bt::{BehaviourTree, DebugVisitor, SnapshotVisitor, TreeConfig};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ArborConfig;
use crate::demos::DemoName;
use crate::display::TickReport;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Behaviour tree demos", version)]
struct Cli {
    /// Project root directory
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Config file (defaults to <project>/.arbor/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a demo tree
    Demo {
        #[arg(value_enum)]
        name: DemoName,

        /// Number of ticks (defaults to the config, then to the demo's own length)
        #[arg(long)]
        ticks: Option<u64>,

        /// Milliseconds between ticks
        #[arg(long)]
        period: Option<u64>,

        /// Stop as soon as the root succeeds or fails
        #[arg(long)]
        until_resolved: bool,

        /// Print one JSON snapshot per tick instead of the text view
        #[arg(long)]
        json: bool,
    },

    /// List the demo trees
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Find project root
    let project_root = match cli.project {
        Some(project) => project,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = match &cli.config {
        Some(path) => ArborConfig::load(path)?,
        None => ArborConfig::load_from_project(&project_root)?,
    };

    // Initialize logging
    let directive = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_filter.clone().unwrap_or_else(|| "info".to_string())
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Demo {
            name,
            ticks,
            period,
            until_resolved,
            json,
        } => {
            let mut tree_config = config.tree.clone();
            if let Some(period) = period {
                tree_config.tick_period = period;
            }
            if until_resolved {
                tree_config.stop_on_terminal_status = true;
            }
            run_demo(name, ticks.or(tree_config.max_ticks), tree_config, json)
        }
        Commands::List => {
            for name in DemoName::value_variants() {
                println!("  {:<20}{}", name.as_str(), name.description());
            }
            Ok(())
        }
    }
}

fn run_demo(name: DemoName, ticks: Option<u64>, config: TreeConfig, json: bool) -> Result<()> {
    let blackboard = Blackboard::new();
    if let Some(capacity) = config.activity_stream_capacity {
        blackboard.enable_activity_stream(capacity);
    }

    let demo = name
        .build(&blackboard)
        .with_context(|| format!("Failed to build the {name} demo"))?;
    let config = TreeConfig {
        max_ticks: Some(ticks.unwrap_or(demo.ticks)),
        ..config
    };

    let mut tree = BehaviourTree::new(demo.root);
    tree.add_visitor(DebugVisitor);
    let snapshot = Rc::new(RefCell::new(SnapshotVisitor::new()));
    tree.add_visitor(snapshot.clone());

    if json {
        tree.add_post_tick_handler(|tree| match serde_json::to_string(&tree.snapshot()) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "Failed to serialise snapshot"),
        });
    } else {
        let blackboard = blackboard.clone();
        tree.add_post_tick_handler(move |tree| {
            let visitor = snapshot.borrow();
            print!(
                "{}",
                TickReport {
                    tree,
                    visitor: &visitor,
                    blackboard: &blackboard,
                }
            );
            blackboard.clear_activity_stream();
        });
    }

    tree.setup(config.setup_timeout())
        .with_context(|| format!("Failed to set up the {name} demo"))?;

    info!(demo = %name, ticks = ?config.max_ticks, "Running demo");
    let outcome = tree.run(&config);
    tree.shutdown();
    outcome.with_context(|| format!("The {name} demo failed on tick {}", tree.count()))?;

    info!(demo = %name, ticks = tree.count(), status = %tree.root_status(), "Demo finished");
    Ok(())
}
