use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_replay_from_file() {
	let args = vec!["kdbg", "replay", "session.ndjson", "--keep-going"];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Replay(args) => {
			assert_eq!(args.file, Some(PathBuf::from("session.ndjson")));
			assert!(args.keep_going);
			assert!(!args.steps);
			assert_eq!(args.script_path(), Some(&PathBuf::from("session.ndjson")));
		}
		_ => panic!("Expected Replay command"),
	}
}

#[test]
fn parse_replay_from_stdin() {
	let cli = Cli::try_parse_from(["kdbg", "replay"]).unwrap();
	match cli.command {
		Commands::Replay(args) => assert!(args.script_path().is_none()),
		_ => panic!("Expected Replay command"),
	}

	let cli = Cli::try_parse_from(["kdbg", "replay", "-"]).unwrap();
	match cli.command {
		Commands::Replay(args) => {
			assert_eq!(args.file, Some(PathBuf::from("-")));
			assert!(args.script_path().is_none());
		}
		_ => panic!("Expected Replay command"),
	}
}

#[test]
fn parse_panels_subcommands() {
	let cli = Cli::try_parse_from(["kdbg", "panels", "list"]).unwrap();
	assert_eq!(cli.command.name(), "panels.list");

	let cli = Cli::try_parse_from(["kdbg", "panels", "clear"]).unwrap();
	match cli.command {
		Commands::Panels(PanelsArgs { action }) => assert_eq!(action, PanelsAction::Clear),
		_ => panic!("Expected Panels command"),
	}

	assert!(Cli::try_parse_from(["kdbg", "panels"]).is_err());
}

#[test]
fn global_flags_after_subcommand() {
	let args = vec![
		"kdbg",
		"replay",
		"-vv",
		"-f",
		"text",
		"--state",
		"/tmp/kdbg/state.json",
		"--config",
		"kdbg.json",
	];
	let cli = Cli::try_parse_from(args).unwrap();

	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Text);
	assert_eq!(cli.state, Some(PathBuf::from("/tmp/kdbg/state.json")));
	assert_eq!(cli.config, Some(PathBuf::from("kdbg.json")));
}

#[test]
fn default_format_is_json() {
	let cli = Cli::try_parse_from(["kdbg", "panels", "list"]).unwrap();
	assert_eq!(cli.format, OutputFormat::Json);
	assert_eq!(cli.verbose, 0);
}

#[test]
fn rejects_unknown_format() {
	assert!(Cli::try_parse_from(["kdbg", "-f", "yaml", "panels", "list"]).is_err());
}
