/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use bpaf::Bpaf;
use log::info;

use pathgraph::config::Settings;
use pathgraph::persistence::GraphStore;
use pathgraph::shell::{self, Session, ShellError};

/// Weighted graph workbench with A* path finding
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Options {
    /// Directory holding saved graphs and the session journal
    #[bpaf(long("data-dir"), argument("DIR"))]
    data_dir: Option<PathBuf>,

    /// Settings file to use instead of the one in the config directory
    #[bpaf(long("config"), argument("FILE"))]
    config: Option<PathBuf>,

    #[bpaf(external(command), optional)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Bpaf)]
enum Command {
    /// Find the cheapest path between two nodes of a saved graph
    #[bpaf(command)]
    Path {
        /// Name the graph was saved under
        #[bpaf(long("graph"), argument("NAME"))]
        graph: String,

        /// Start node
        #[bpaf(long("from"), argument("A"))]
        from: u32,

        /// Goal node
        #[bpaf(long("to"), argument("B"))]
        to: u32,

        /// Also draw the graph and path to this PNG file
        #[bpaf(long("export"), argument("FILE"))]
        export: Option<PathBuf>,
    },

    /// List saved graphs
    #[bpaf(command)]
    List,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = options().run();
    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pathgraph: {e}");
            ExitCode::FAILURE
        },
    }
}

fn run(options: Options) -> Result<(), ShellError> {
    let settings = match &options.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load_or_create(&Settings::config_path()),
    };
    let data_dir = options.data_dir.unwrap_or_else(|| settings.data_dir());
    info!("Using data directory {}", data_dir.display());
    let store = GraphStore::open(data_dir)?;

    let mut stdout = io::stdout().lock();
    match options.command {
        Some(Command::Path {
            graph,
            from,
            to,
            export,
        }) => {
            shell::find_saved_path(
                &store,
                &settings,
                &graph,
                from,
                to,
                export.as_deref(),
                &mut stdout,
            )?;
            Ok(())
        },
        Some(Command::List) => shell::print_saved_graphs(&store, &mut stdout),
        None => {
            let mut session = Session::recover(store, settings);
            session.run(io::stdin().lock(), stdout)
        },
    }
}
