use std::process;

use clap::Parser;
use passat::{app, config::Options, error::Error, logger};

fn main() {
    let options = Options::parse();
    let result = options.validate().and_then(|()| {
        logger::init(options.verbosity());
        app::run_stdout(&options)
    });

    match result {
        Ok(code) => process::exit(code),
        Err(err @ Error::Parse { .. }) => {
            eprintln!("passat: {err}");
            process::exit(1);
        }
        Err(err) => {
            eprintln!("passat: error: {err}");
            process::exit(1);
        }
    }
}
