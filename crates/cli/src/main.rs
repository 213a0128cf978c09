use std::process::ExitCode;

fn main() -> ExitCode {
    gpsflow_cli::run()
}
