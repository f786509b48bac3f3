use std::env;
use std::io::{stderr, stdout};
use cmd_mailer::run_cmdmail;

fn main() {
    let args: Vec<String> = env::args().collect();
    let envs: Vec<(String, String)> = env::vars().collect();

    let exit_code = run_cmdmail(&mut stdout(), &mut stderr(), &args, &envs);

    std::process::exit(exit_code);
}
