use clap::Parser;

use gitmux::cli::Cli;
use gitmux::config::RunConfig;
use gitmux::diagnostics;
use gitmux::error::GitmuxError;
use gitmux::run;

fn main() {
    // the legacy backend's --msg-filter shells back into this same binary
    // (see backend::legacy::run_msg_filter_subcommand); intercept that
    // hidden subcommand before clap sees the real CLI surface.
    let mut args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("__internal-scrub-message") {
        args.remove(1);
        std::process::exit(run_msg_filter(&args));
    }

    env_logger::init();

    let cli = Cli::parse();
    let raw = cli.into_raw_config();

    let config = match RunConfig::validate(raw) {
        Ok(config) => config,
        Err(message) => {
            diagnostics::error(&message);
            std::process::exit(GitmuxError::Config(message).exit_code());
        }
    };

    match run::execute(config) {
        Ok(outcome) => {
            diagnostics::success(format!(
                "integration branch `{}` is ready",
                outcome.integration_branch
            ));
            if let Some(url) = outcome.pr_url {
                diagnostics::success(format!("pull request: {url}"));
            }
        }
        Err(err) => {
            diagnostics::error(err.to_string());
            std::process::exit(err.exit_code());
        }
    }
}

fn run_msg_filter(args: &[String]) -> i32 {
    use clap::ValueEnum;
    use gitmux::config::CoauthorAction;

    let action = args
        .iter()
        .position(|a| a == "--coauthor-action")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| CoauthorAction::from_str(s, true).ok())
        .unwrap_or(CoauthorAction::Keep);

    match gitmux::backend::legacy::run_msg_filter_subcommand(action) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("gitmux __internal-scrub-message failed: {err:#}");
            1
        }
    }
}
