pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "reeltitle",
    about = "Reeltitle operator CLI",
    long_about = "Inspect configuration, check readiness, and run single messages through the title bot pipeline.",
    after_help = "Examples:\n  reeltitle doctor --json\n  reeltitle config\n  reeltitle ask --sender U123 \"怎麼取得逐字稿\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, LINE credential shape, and completion gateway setup")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Classify one message and print the reply the bot would send")]
    Ask {
        #[arg(long, default_value = "cli", help = "Sender identity used as the memory key")]
        sender: String,
        #[arg(help = "Message text, as a LINE user would send it")]
        text: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Ask { sender, text } => commands::ask::run(&sender, &text),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
