use std::process::ExitCode;

fn main() -> ExitCode {
    foodbot_cli::run()
}
