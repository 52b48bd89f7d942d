//! Iris installer entry point.
//!
//! Checks for root, resolves the subcommand, runs it and reports failures.
//! See [`iris_installer::cli`] for the available commands.

use iris_installer::cli::{self, Invocation};
use iris_installer::core::user_friendly_error;
use iris_installer::utils::is_superuser;
use tracing_subscriber::EnvFilter;

const DEFAULT_PROGRAM_NAME: &str = "./iris_installer";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    if !is_superuser() {
        println!("Please run this installer as root.");
        return;
    }

    let args: Vec<String> = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned()).collect();
    let program = args.first().map_or(DEFAULT_PROGRAM_NAME, String::as_str);

    match Invocation::from_args(&args) {
        Invocation::Help => cli::print_help(program),
        Invocation::Unknown(command) => cli::print_unknown(&command, program),
        Invocation::Run(command) => {
            if let Err(e) = cli::execute(command).await {
                user_friendly_error(e).display();
                std::process::exit(1);
            }
        }
    }
}

/// Logs go to stderr so stdout stays reserved for user-facing output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
