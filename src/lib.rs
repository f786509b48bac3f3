use std::io::Write;

pub mod args;
pub mod backend;
pub mod config;
pub mod logger;
pub mod message;
pub mod runner;

use clap::Parser;
use log::{error, info};

use config::Config;
use runner::ShellRunner;

/// Run the command described by `args` and email its result.
///
/// Returns the process exit status: 0 once the report is delivered, whatever
/// the command itself returned; clap's status for usage errors and help; 1
/// for any configuration, launch, message or delivery failure.
pub fn run_cmdmail(
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    args: &[String],
    envs: &[(String, String)],
) -> i32 {
    let cli_args = match args::CmdMailArgs::try_parse_from(args) {
        Ok(args) => args,
        Err(e) => {
            let rendered = e.render().to_string();
            let out: &mut dyn Write = if e.use_stderr() { stderr } else { stdout };
            let _ = write!(out, "{}", rendered);
            return e.exit_code();
        }
    };

    let verbosity = match config::verbosity_from_env(envs) {
        Ok(verbosity) => verbosity,
        Err(e) => {
            let _ = writeln!(stderr, "cmdmail: {}", e);
            return 1;
        }
    };
    logger::init_logger(verbosity);

    // Loaded before the command runs so a broken deployment never executes it.
    let config = match Config::from_env(envs) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            let _ = writeln!(stderr, "cmdmail: {}", e);
            return 1;
        }
    };

    let result = match ShellRunner::new(&config.shell).run(&cli_args.cmd) {
        Ok(result) => result,
        Err(e) => {
            error!("Failed to run command: {}", e);
            let _ = writeln!(stderr, "cmdmail: {}", e);
            return 1;
        }
    };

    let message =
        match message::build_report(&config.sender, &cli_args.email, &cli_args.cmd, &result) {
            Ok(message) => message,
            Err(e) => {
                error!("Failed to build report: {}", e);
                let _ = writeln!(stderr, "cmdmail: {}", e);
                return 1;
            }
        };

    let backend = backend::create_from_config(&config.backend);
    match backend.send(&message) {
        Ok(()) => {
            info!("Report for exit status {} delivered", result.exit_code);
            0
        }
        Err(e) => {
            // Alternate form prints the whole context chain.
            error!("Failed to send email: {:#}", e);
            let _ = writeln!(stderr, "cmdmail: {:#}", e);
            1
        }
    }
}
