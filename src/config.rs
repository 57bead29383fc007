use clap::Parser;
use log::LevelFilter;

use crate::error::{Error, Result};

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// The DIMACS CNF input file, optionally compressed with gzip, bzip2 or
    /// xz. Reads from `stdin` if not given.
    pub input: Option<String>,
    /// Do not print the satisfying assignment
    #[arg(short, long)]
    pub no_witness: bool,
    /// Disable all messages
    #[arg(short, long)]
    pub quiet: bool,
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Print solver internal logging messages (debug builds only)
    #[arg(short, long)]
    pub log: bool,
}

impl Options {
    pub fn validate(&self) -> Result<()> {
        if self.log && !cfg!(debug_assertions) {
            return Err(Error::Usage(
                "solver configured without logging support".to_string(),
            ));
        }
        if self.quiet && self.log {
            return Err(Error::Usage(
                "can not combine '--quiet' and '--log'".to_string(),
            ));
        }
        if self.quiet && self.verbose > 0 {
            return Err(Error::Usage(
                "can not combine '--quiet' and '--verbose'".to_string(),
            ));
        }
        Ok(())
    }

    pub fn verbosity(&self) -> LevelFilter {
        match (self.quiet, self.log, self.verbose) {
            (true, _, _) => LevelFilter::Off,
            (_, true, _) => LevelFilter::Trace,
            (_, _, 0) => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }

    pub fn witness(&self) -> bool {
        !self.no_witness
    }
}
