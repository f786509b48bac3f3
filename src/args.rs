use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cmdmail")]
#[command(about = "Sends stdout and stderr by email after running the command.")]
#[command(
    long_about = "Runs a command through the shell, then emails its exit status together with stdout.txt and stderr.txt attachments. SMTP settings are read from CMDMAIL_* environment variables."
)]
pub struct CmdMailArgs {
    /// The email address that you want to receive the output
    #[arg(value_name = "EMAIL")]
    pub email: String,

    /// The command and arguments to execute. If you need arguments, wrap the whole command in quotes
    #[arg(value_name = "CMD")]
    pub cmd: String,
}
