//! # Interactive Snapshot Browser
//!
//! A line-oriented command loop over the snapshot store. All session state
//! (host list, snapshot history, current index) is owned by
//! [`BrowseSession`] and threaded through the command handlers.
//!
//! `update` never mutates an existing store: each fetch folds into a
//! brand-new snapshot appended to the history, and every prior snapshot
//! stays browsable for the life of the session.
//!
//! Instead of evaluating arbitrary expressions against the store, `print`
//! accepts a small filter pipeline over the store's query/links/lookup
//! primitives:
//!
//! ```text
//! print job:107 | links            link strings inside the entries
//! print job:107 | walk             the entries those links point at
//! print worker | field last_contact
//! ```

use crate::error::AppError;
use crate::fetch::{self, FetchOptions};
use serde_json::Value;
use std::io::Write;
use stato_core::{Endpoint, Snapshot};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
stato browse interactively inspects snapshots of distributed system state.
The following commands are available:

    help               Print this help message

    list               List the object types in the current snapshot
    list <type>        List the object identifiers for <type>

    print <expr>       Evaluate <expr> against the current snapshot and
                       print the matching entries. <expr> is a query
                       (type or type:id), optionally piped through the
                       stages \"links\", \"walk\", and \"field <name>\".

    links <expr>       Shorthand for: print <expr> | links

    snapshot           Show the current snapshot index
    snapshot <i>       Switch to snapshot <i>
    snapshots          List available snapshot indexes

    update             Fetch a new snapshot (and switch to it)

    quit               Leave the browser";

// =============================================================================
// SESSION
// =============================================================================

/// One interactive browsing session.
pub struct BrowseSession {
    endpoints: Vec<Endpoint>,
    options: FetchOptions,
    snapshots: Vec<Snapshot>,
    current: usize,
}

impl BrowseSession {
    /// Create a session over a fixed set of sources.
    #[must_use]
    pub fn new(endpoints: Vec<Endpoint>, options: FetchOptions) -> Self {
        Self {
            endpoints,
            options,
            snapshots: Vec::new(),
            current: 0,
        }
    }

    /// Fetch the initial snapshot and run the command loop until EOF or
    /// `quit`.
    pub async fn run(&mut self) -> Result<(), AppError> {
        self.update().await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if !self.dispatch(line.trim()).await? {
                break;
            }
        }
        Ok(())
    }

    /// Execute one command line. Returns false when the session should end.
    async fn dispatch(&mut self, line: &str) -> Result<bool, AppError> {
        let (command, rest) = match line.find(char::is_whitespace) {
            Some(i) => (&line[..i], line[i..].trim_start()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "help" => println!("{HELP}"),
            "quit" | "exit" => return Ok(false),
            "update" => self.update().await?,
            "snapshots" => {
                for i in 0..self.snapshots.len() {
                    println!("{i}");
                }
            }
            "snapshot" => self.select_snapshot(rest),
            "list" | "ls" => self.list(rest),
            "print" => self.print(rest),
            "links" => self.print(&format!("{rest} | links")),
            _ => eprintln!("unknown command: {line}"),
        }
        Ok(true)
    }

    /// Fetch all sources, merge, and append the new snapshot. Partial
    /// failure still yields a snapshot; only a total failure leaves the
    /// history untouched.
    async fn update(&mut self) -> Result<(), AppError> {
        let outcome = fetch::fetch_all(&self.endpoints, &self.options).await?;
        for error in &outcome.errors {
            eprintln!("warning: {error}");
        }
        if outcome.is_total_failure() {
            eprintln!("failed to fetch snapshots");
            return Ok(());
        }

        let snapshot = Snapshot::merge(outcome.documents);
        for warning in snapshot.warnings() {
            eprintln!("warning: {}: document skipped: {}", warning.source, warning.reason);
        }
        self.snapshots.push(snapshot);
        self.current = self.snapshots.len() - 1;
        println!("retrieved snapshot {}", self.current);
        Ok(())
    }

    fn select_snapshot(&mut self, arg: &str) {
        if arg.is_empty() {
            println!("browsing snapshot {}", self.current);
            return;
        }
        match arg.parse::<usize>() {
            Ok(i) if i < self.snapshots.len() => self.current = i,
            Ok(_) => eprintln!("snapshot: index out of range"),
            Err(_) => eprintln!("usage: snapshot <index>"),
        }
    }

    fn list(&self, arg: &str) {
        let Some(snapshot) = self.snapshots.get(self.current) else {
            eprintln!("no snapshots available; try \"update\"");
            return;
        };

        let mut names: Vec<&str> = if arg.is_empty() {
            snapshot.types().collect()
        } else {
            snapshot.list(arg).collect()
        };
        names.sort_unstable();
        for name in names {
            println!("{name}");
        }
    }

    fn print(&self, expr: &str) {
        let Some(snapshot) = self.snapshots.get(self.current) else {
            eprintln!("no snapshots available; try \"update\"");
            return;
        };

        match run_pipeline(snapshot, expr) {
            Ok(values) => match serde_json::to_string_pretty(&values) {
                Ok(rendered) => println!("{rendered}"),
                Err(err) => eprintln!("error: {err}"),
            },
            Err(message) => eprintln!("error: {message}"),
        }
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// One stage of a print pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    /// Entry values to the link strings they contain.
    Links,
    /// Entry values to the entries their links point at.
    Walk,
    /// Entry values to one named field.
    Field(String),
}

/// Run a `query [| stage ...]` expression against a snapshot.
fn run_pipeline(snapshot: &Snapshot, expr: &str) -> Result<Vec<Value>, String> {
    let mut segments = expr.split('|').map(str::trim);
    let query = segments.next().unwrap_or_default();
    if query.is_empty() {
        return Err("usage: print <type[:id]> [| links | walk | field <name>]".to_string());
    }

    let mut values = snapshot.query(query).objects;
    for segment in segments {
        values = apply_stage(snapshot, values, &parse_stage(segment)?);
    }
    Ok(values)
}

fn parse_stage(segment: &str) -> Result<Stage, String> {
    let mut words = segment.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("links"), None, _) => Ok(Stage::Links),
        (Some("walk"), None, _) => Ok(Stage::Walk),
        (Some("field"), Some(name), None) => Ok(Stage::Field(name.to_string())),
        _ => Err(format!("unknown pipeline stage: {segment}")),
    }
}

fn apply_stage(snapshot: &Snapshot, values: Vec<Value>, stage: &Stage) -> Vec<Value> {
    match stage {
        Stage::Links => values
            .iter()
            .flat_map(|value| snapshot.links(value))
            .map(Value::String)
            .collect(),
        Stage::Walk => values
            .iter()
            .flat_map(|value| walk_links(snapshot, value))
            .collect(),
        Stage::Field(name) => values
            .iter()
            .filter_map(|value| value.get(name.as_str()).cloned())
            .collect(),
    }
}

/// Dereference every link inside a value into the entries it points at,
/// one level deep.
fn walk_links(snapshot: &Snapshot, value: &Value) -> Vec<Value> {
    let mut targets = Vec::new();
    for link in snapshot.links(value) {
        let Some(i) = link.find(':') else {
            continue;
        };
        targets.extend_from_slice(snapshot.lookup(&link[..i], &link[i + 1..]));
    }
    targets
}

// =============================================================================
// TESTS
// =============================================================================
