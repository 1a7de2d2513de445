//! Prints a variable's datatype and committed time range.
//!
//! Diagnostic companion for runs whose trainers are still writing:
//!
//! ```text
//! timevar-inspect <root> <timeline> <name> [--json] [--wait SECS]
//! ```
//!
//! `--wait` blocks (bounded) until the variable file appears, for
//! inspecting a variable the producer has not created yet. `--json`
//! emits a machine-readable summary.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use timevar::{path, poll, Variable};

const USAGE: &str = "Usage: timevar-inspect <root> <timeline> <name> [--json] [--wait SECS]";

#[derive(Serialize)]
struct Summary {
    path: String,
    datatype: String,
    first: u64,
    count: u64,
    /// Side of a map datatype; absent for scalar/position datatypes.
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<usize>,
}

struct Args {
    root: PathBuf,
    timeline: String,
    name: String,
    json: bool,
    wait: Option<u64>,
}

fn parse_args() -> Option<Args> {
    let mut positional = Vec::new();
    let mut json = false;
    let mut wait = None;
    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--wait" => wait = Some(argv.next()?.parse().ok()?),
            _ => positional.push(arg),
        }
    }
    let [root, timeline, name]: [String; 3] = positional.try_into().ok()?;
    Some(Args {
        root: PathBuf::from(root),
        timeline,
        name,
        json,
        wait,
    })
}

fn run(args: &Args) -> timevar::Result<()> {
    let var_path = path::resolve(&args.root, &args.timeline, &args.name);
    if let Some(secs) = args.wait {
        poll::existing(
            &var_path,
            Duration::from_secs(secs),
            Duration::from_millis(500),
        )?;
    }

    let variable = Variable::open(&var_path)?;
    let (first, count) = variable.time_range();
    let summary = Summary {
        path: var_path.display().to_string(),
        datatype: variable.datatype().to_string(),
        first,
        count,
        side: variable.datatype().side().ok(),
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&summary)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        println!("{rendered}");
    } else {
        println!("Path: {}", summary.path);
        println!("Type: {}", summary.datatype);
        println!("Time Range: ({first}, {count})");
        if let Some(side) = summary.side {
            println!("Side: {side}");
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        process::exit(2);
    };
    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
