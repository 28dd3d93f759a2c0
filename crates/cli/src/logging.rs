use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the `-v` derived filter.
pub const LOG_ENV: &str = "KDBG_LOG";

fn default_directives(verbosity: u8) -> &'static str {
	match verbosity {
		// stale acknowledgements log at debug and stay hidden here
		0 => "error",
		1 => "warn,kdbg=info",
		_ => "info,kdbg=debug",
	}
}

/// Installs the stderr subscriber. stdout stays reserved for the result envelope.
pub fn init_logging(verbosity: u8) {
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_directives_parse() {
		for level in 0..4 {
			assert!(EnvFilter::try_new(default_directives(level)).is_ok());
		}
	}
}
