use std::process::ExitCode;

fn main() -> ExitCode {
    reeltitle_cli::run()
}
