#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Root CLI for kdbg.
#[derive(Parser, Debug)]
#[command(name = "kdbg")]
#[command(about = "Session-aware debugger state: replay host events, inspect breakpoints")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default) or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Debugger configuration file (JSON). Defaults apply when omitted.
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Panel state file [default: $XDG_STATE_HOME/kdbg/state.json]
	#[arg(long, global = true, value_name = "FILE")]
	pub state: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Apply a script of host events (NDJSON) and report the final state.
	Replay(ReplayArgs),
	/// Inspect or reset persisted debugger panels.
	Panels(PanelsArgs),
}

impl Commands {
	/// Name used in the output envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Replay(_) => "replay",
			Commands::Panels(args) => match args.action {
				PanelsAction::List => "panels.list",
				PanelsAction::Clear => "panels.clear",
			},
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
	/// Script to read. Reads stdin when omitted or `-`.
	#[arg(value_name = "FILE")]
	pub file: Option<PathBuf>,

	/// Record failing events and continue instead of stopping at the first one.
	#[arg(short = 'k', long)]
	pub keep_going: bool,

	/// Include the outcome of every event in the result.
	#[arg(long)]
	pub steps: bool,
}

impl ReplayArgs {
	/// Script path, or `None` for stdin.
	pub fn script_path(&self) -> Option<&PathBuf> {
		self.file.as_ref().filter(|path| path.as_os_str() != "-")
	}
}

#[derive(Args, Debug, Clone)]
pub struct PanelsArgs {
	#[command(subcommand)]
	pub action: PanelsAction,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelsAction {
	/// List panels that will be restored on the next run.
	List,
	/// Forget every saved panel.
	Clear,
}
