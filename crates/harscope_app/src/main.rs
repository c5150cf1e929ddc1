mod platform;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let options = platform::args::Options::parse();
    match platform::run_app(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("harscope: {err:#}");
            ExitCode::FAILURE
        }
    }
}
