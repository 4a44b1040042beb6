/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Line-oriented workbench session.
//!
//! A [`Session`] owns the working graph and the store it is journaled to.
//! Every mutation is applied to the graph, appended to the journal, and
//! followed by a periodic snapshot check, so an interrupted session can be
//! recovered on the next start.

use log::{debug, info, warn};
use std::io::{BufRead, Write};
use thiserror::Error;

use crate::config::Settings;
use crate::graph::{EdgeWeight, Graph, GraphError, NodeId};
use crate::pathfinding::{Path, SearchError};
use crate::persistence::types::LogEntry;
use crate::persistence::{GraphStore, GraphStoreError};
use crate::render::{RenderError, image_path, raster, text};
use crate::search::suggest_names;
use crate::util::format_path;

const PROMPT: &str = "> ";

const HELP: &str = "\
Commands:
  new                  start an empty graph
  add-node             add a node (ids are assigned in order)
  remove-node N        remove node N and its edges
  add-edge A B W       connect A and B with positive integer weight W
  remove-edge A B      remove the edge between A and B
  show                 list nodes, edges and the last path
  path A B             find the cheapest path from A to B
  export NAME          draw the graph and last path to NAME.png
  save NAME            save the graph under NAME
  load NAME            replace the graph with the one saved as NAME
  delete NAME          delete the saved graph NAME
  list                 list saved graphs
  help                 show this help
  quit                 snapshot the session and exit
";

/// Errors surfaced to the user of the shell
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Invalid input: {0}")]
    Usage(String),

    #[error("the graph has no nodes")]
    EmptyGraph,

    #[error("no saved graph named {name:?}{}", did_you_mean(.suggestions))]
    UnknownGraph {
        name: String,
        suggestions: Vec<String>,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Store(#[from] GraphStoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}

/// One parsed line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    New,
    AddNode,
    RemoveNode(NodeId),
    AddEdge {
        a: NodeId,
        b: NodeId,
        weight: EdgeWeight,
    },
    RemoveEdge {
        a: NodeId,
        b: NodeId,
    },
    Show,
    Path {
        from: NodeId,
        to: NodeId,
    },
    Export(String),
    Save(String),
    Load(String),
    Delete(String),
    List,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, ShellError> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word.to_ascii_lowercase().as_str() {
            "new" => no_args(&args, Self::New)?,
            "add-node" => no_args(&args, Self::AddNode)?,
            "remove-node" => {
                let [n] = numbers::<1>(&args, "remove-node N")?;
                Self::RemoveNode(n)
            },
            "add-edge" => {
                let [a, b, weight] = numbers::<3>(&args, "add-edge A B W")?;
                Self::AddEdge { a, b, weight }
            },
            "remove-edge" => {
                let [a, b] = numbers::<2>(&args, "remove-edge A B")?;
                Self::RemoveEdge { a, b }
            },
            "show" => no_args(&args, Self::Show)?,
            "path" => {
                let [from, to] = numbers::<2>(&args, "path A B")?;
                Self::Path { from, to }
            },
            "export" => Self::Export(name(rest, "export NAME")?),
            "save" => Self::Save(name(rest, "save NAME")?),
            "load" => Self::Load(name(rest, "load NAME")?),
            "delete" => Self::Delete(name(rest, "delete NAME")?),
            "list" => no_args(&args, Self::List)?,
            "help" | "?" => no_args(&args, Self::Help)?,
            "quit" | "exit" => no_args(&args, Self::Quit)?,
            other => {
                return Err(ShellError::Usage(format!("unknown command {other:?}")));
            },
        };
        Ok(command)
    }
}

fn no_args(args: &[&str], command: ShellCommand) -> Result<ShellCommand, ShellError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(ShellError::Usage(format!(
            "unexpected arguments: {}",
            args.join(" ")
        )))
    }
}

fn numbers<const N: usize>(args: &[&str], usage: &str) -> Result<[u32; N], ShellError> {
    let usage_err = || ShellError::Usage(format!("usage: {usage}"));
    if args.len() != N {
        return Err(usage_err());
    }
    let mut values = [0; N];
    for (slot, arg) in values.iter_mut().zip(args) {
        *slot = arg.parse().map_err(|_| usage_err())?;
    }
    Ok(values)
}

fn name(rest: &str, usage: &str) -> Result<String, ShellError> {
    if rest.is_empty() {
        Err(ShellError::Usage(format!("usage: {usage}")))
    } else {
        Ok(rest.to_string())
    }
}

/// Whether the session should keep reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Working graph plus the store it is journaled to
pub struct Session {
    graph: Graph,
    store: GraphStore,
    settings: Settings,
    last_path: Option<Path>,
}

impl Session {
    /// Start with an empty working graph
    pub fn new(store: GraphStore, settings: Settings) -> Self {
        Self::with_graph(Graph::new(), store, settings)
    }

    /// Start from whatever the store's session journal recovers
    pub fn recover(store: GraphStore, settings: Settings) -> Self {
        let graph = store.recover().unwrap_or_default();
        if graph.node_count() > 0 {
            info!(
                "Recovered session graph with {} nodes and {} edges",
                graph.node_count(),
                graph.edge_count()
            );
        }
        Self::with_graph(graph, store, settings)
    }

    fn with_graph(graph: Graph, mut store: GraphStore, settings: Settings) -> Self {
        if let Err(e) = store.set_snapshot_interval_secs(settings.snapshot_interval_secs) {
            warn!("Keeping default snapshot interval: {e}");
        }
        Self {
            graph,
            store,
            settings,
            last_path: None,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Result of the most recent search, cleared by any mutation
    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_ref()
    }

    /// Execute one command, writing user-facing output to `out`
    pub fn execute(
        &mut self,
        command: ShellCommand,
        out: &mut dyn Write,
    ) -> Result<Flow, ShellError> {
        debug!("Executing {command:?}");
        match command {
            ShellCommand::New => {
                self.graph.clear();
                self.record(LogEntry::ClearGraph);
                writeln!(out, "Started a new graph")?;
            },
            ShellCommand::AddNode => {
                let id = self.graph.add_node();
                self.record(LogEntry::AddNode { id });
                writeln!(out, "Added node {id}")?;
            },
            ShellCommand::RemoveNode(id) => {
                self.require_nodes()?;
                if !self.graph.remove_node(id) {
                    return Err(GraphError::UnknownNode(id).into());
                }
                self.record(LogEntry::RemoveNode { id });
                writeln!(out, "Removed node {id}")?;
            },
            ShellCommand::AddEdge { a, b, weight } => {
                self.require_nodes()?;
                self.graph.add_edge(a, b, weight)?;
                self.record(LogEntry::AddEdge { a, b, weight });
                writeln!(out, "Added edge {a}-{b} with weight {weight}")?;
            },
            ShellCommand::RemoveEdge { a, b } => {
                self.require_nodes()?;
                self.graph.remove_edge(a, b)?;
                self.record(LogEntry::RemoveEdge { a, b });
                writeln!(out, "Removed edge {a}-{b}")?;
            },
            ShellCommand::Show => {
                write!(out, "{}", text::describe(&self.graph, self.last_path.as_ref()))?;
            },
            ShellCommand::Path { from, to } => {
                self.require_nodes()?;
                let layout = self.settings.layout.build();
                let path = self
                    .settings
                    .path_finder(layout.as_ref())
                    .search(&self.graph, from, to)?;
                if path.is_empty() {
                    writeln!(out, "No path from {from} to {to}")?;
                } else {
                    writeln!(out, "Path: {} (cost {})", format_path(&path.nodes), path.cost)?;
                }
                self.last_path = Some(path);
            },
            ShellCommand::Export(name) => {
                self.require_nodes()?;
                let file = image_path(&self.settings.image_dir(), &name)?;
                let positions = self.settings.layout.build().positions(&self.graph);
                let highlight = self.last_path.as_ref().map_or(&[][..], |p| &p.nodes[..]);
                raster::export_png(
                    &self.graph,
                    &positions,
                    highlight,
                    &self.settings.image,
                    &file,
                )?;
                writeln!(out, "Saved image to {}", file.display())?;
            },
            ShellCommand::Save(name) => {
                self.require_nodes()?;
                self.store.save_graph(&name, &self.graph)?;
                writeln!(out, "Saved graph {:?}", name.trim())?;
            },
            ShellCommand::Load(name) => {
                let Some(graph) = self.store.load_graph(&name)? else {
                    return Err(unknown_graph(&self.store, name));
                };
                self.graph = graph;
                self.record(LogEntry::ReplaceGraph {
                    snapshot: self.graph.to_snapshot(),
                });
                writeln!(
                    out,
                    "Loaded graph {:?} ({} nodes, {} edges)",
                    name.trim(),
                    self.graph.node_count(),
                    self.graph.edge_count()
                )?;
            },
            ShellCommand::Delete(name) => {
                if !self.store.delete_graph(&name)? {
                    return Err(unknown_graph(&self.store, name));
                }
                writeln!(out, "Deleted graph {:?}", name.trim())?;
            },
            ShellCommand::List => print_saved_graphs(&self.store, out)?,
            ShellCommand::Help => write!(out, "{HELP}")?,
            ShellCommand::Quit => {
                self.store.take_snapshot(&self.graph);
                return Ok(Flow::Quit);
            },
        }
        Ok(Flow::Continue)
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// Command failures are reported on `output` and the loop continues;
    /// only failures to read or write the streams end it early.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<(), ShellError> {
        let mut lines = input.lines();
        loop {
            write!(output, "{PROMPT}")?;
            output.flush()?;

            let Some(line) = lines.next().transpose()? else {
                writeln!(output)?;
                self.store.take_snapshot(&self.graph);
                return Ok(());
            };
            if line.trim().is_empty() {
                continue;
            }

            let result = ShellCommand::parse(&line).and_then(|cmd| self.execute(cmd, &mut output));
            match result {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {},
                Err(ShellError::Io(e)) => return Err(ShellError::Io(e)),
                Err(e @ ShellError::Usage(_)) => {
                    writeln!(output, "{e}")?;
                    writeln!(output, "Type 'help' for a list of commands")?;
                },
                Err(e) => writeln!(output, "Error: {e}")?,
            }
        }
    }

    fn require_nodes(&self) -> Result<(), ShellError> {
        if self.graph.node_count() == 0 {
            Err(ShellError::EmptyGraph)
        } else {
            Ok(())
        }
    }

    /// Apply bookkeeping for a mutation already made to the working graph
    fn record(&mut self, entry: LogEntry) {
        self.last_path = None;
        self.store.log_mutation(&entry);
        self.store.check_periodic_snapshot(&self.graph);
    }
}

/// Print the names of all saved graphs, one per line
pub fn print_saved_graphs(store: &GraphStore, out: &mut dyn Write) -> Result<(), ShellError> {
    let names = store.list_graphs()?;
    if names.is_empty() {
        writeln!(out, "No saved graphs")?;
    }
    for name in names {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

/// Search a saved graph without touching the working session.
///
/// Prints the path and its cost, and draws it to `export` when given.
pub fn find_saved_path(
    store: &GraphStore,
    settings: &Settings,
    name: &str,
    from: NodeId,
    to: NodeId,
    export: Option<&std::path::Path>,
    out: &mut dyn Write,
) -> Result<Path, ShellError> {
    let Some(graph) = store.load_graph(name)? else {
        return Err(unknown_graph(store, name.to_string()));
    };

    let layout = settings.layout.build();
    let path = settings
        .path_finder(layout.as_ref())
        .search(&graph, from, to)?;
    if path.is_empty() {
        writeln!(out, "No path from {from} to {to}")?;
    } else {
        writeln!(out, "Path: {} (cost {})", format_path(&path.nodes), path.cost)?;
    }

    if let Some(file) = export {
        let positions = layout.positions(&graph);
        raster::export_png(&graph, &positions, &path.nodes, &settings.image, file)?;
        writeln!(out, "Saved image to {}", file.display())?;
    }
    Ok(path)
}

fn unknown_graph(store: &GraphStore, name: String) -> ShellError {
    let suggestions = match store.list_graphs() {
        Ok(names) => suggest_names(&names, &name),
        Err(e) => {
            warn!("Could not list saved graphs: {e}");
            Vec::new()
        },
    };
    ShellError::UnknownGraph {
        name: name.trim().to_string(),
        suggestions,
    }
}
