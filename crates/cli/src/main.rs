use std::process::ExitCode;

fn main() -> ExitCode {
    charterly_cli::run()
}
