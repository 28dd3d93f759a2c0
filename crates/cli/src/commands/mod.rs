mod panels;
pub mod replay;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kdbg::{Debugger, DebuggerConfig};
use tracing::debug;

use crate::cli::{Cli, Commands, PanelsAction};
use crate::config::load_config;
use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, print_result};
use crate::state_store::{JsonStateDb, default_state_path};

/// Inputs shared by every command.
struct Runtime {
	config: DebuggerConfig,
	state: Arc<JsonStateDb>,
}

impl Runtime {
	fn load(config: Option<&Path>, state: Option<PathBuf>) -> Result<Self> {
		let config = load_config(config)?;
		let state_path = state.unwrap_or_else(default_state_path);
		debug!(target: "kdbg.cli", state = %state_path.display(), "resolved state file");
		Ok(Self {
			config,
			state: Arc::new(JsonStateDb::open(state_path)?),
		})
	}
}

pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	let command = cli.command.name();
	let runtime = Runtime::load(cli.config.as_deref(), cli.state)?;

	match cli.command {
		Commands::Replay(args) => {
			let debugger = Debugger::new(runtime.config, runtime.state)?;
			let report = match args.script_path() {
				Some(path) => {
					let file = tokio::fs::File::open(path).await?;
					replay::run(&debugger, tokio::io::BufReader::new(file), &args).await?
				}
				None => replay::run(&debugger, tokio::io::BufReader::new(tokio::io::stdin()), &args).await?,
			};
			let result = ResultBuilder::new(command)
				.data(report.data)
				.diagnostics(report.diagnostics)
				.build();
			print_result(&result, format);
		}
		Commands::Panels(args) => {
			let data = match args.action {
				PanelsAction::List => panels::list(&runtime.config, runtime.state.as_ref())?,
				PanelsAction::Clear => panels::clear(&runtime.config, runtime.state.as_ref())?,
			};
			print_result(&ResultBuilder::new(command).data(data).build(), format);
		}
	}
	Ok(())
}
