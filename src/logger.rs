use std::io::Write;

use log::LevelFilter;

/// Map `CMDMAIL_VERBOSITY` to a log level. Off by default so cron only
/// mails when the report itself cannot be delivered.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Log lines go to stderr as `cmdmail[LEVEL]: message`, next to the
/// `cmdmail: <error>` line printed on failure. Stdout is left alone.
pub fn init_logger(verbosity: u8) {
    // `run_cmdmail` is invoked repeatedly in-process by the integration tests
    // and `env_logger::init()` panics on a second call.
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level_for(verbosity))
        .target(env_logger::Target::Stderr)
        .format(|buf, record| writeln!(buf, "cmdmail[{}]: {}", record.level(), record.args()))
        .try_init();
}
