use std::process::ExitCode;

fn main() -> ExitCode {
    propkit_cli::run()
}
