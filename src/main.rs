//! Binary entrypoint for the `taskgate` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // `.env` values act as defaults for the TASKGATE_* options.
    dotenvy::dotenv().ok();
    match taskgate::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
