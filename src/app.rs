//! The command line driver.

use std::io::{self, Write};

use log::info;

use crate::{
    config::Options,
    error::Result,
    io::{input::Input, read_problem, write_solution},
    logger::{self, section},
    signals::InterruptReporter,
    solver::{Cdcl, Solver, Statistics},
};

fn banner() {
    section("banner");
    info!("Passat SAT Solver");
    info!("Version {}", env!("CARGO_PKG_VERSION"));
    let profile = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };
    info!("Compiled in {profile} mode");
}

/// Renders `statistics` and writes them to `out`.
fn write_statistics(out: &mut impl Write, statistics: &dyn Statistics) -> Result<()> {
    let mut report = String::new();
    statistics
        .report(&mut report)
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "failed to format statistics"))?;
    out.write_all(report.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Solves the formula named by `options` and writes the solution to `out`.
/// Returns the status code to exit with.
pub fn run(options: &Options, out: &mut impl Write) -> Result<i32> {
    let input = match &options.input {
        Some(path) => Input::open(path)?,
        None => Input::stdin(),
    };

    let mut solver = Cdcl::new();
    let reporter = InterruptReporter::install(solver.statistics())?;
    banner();

    section("parsing");
    let dimacs = read_problem(input, &mut solver)?;

    section("solving");
    let status = solver.solve();

    section("result");
    let variables = options.witness().then_some(dimacs.header.variables);
    write_solution(out, status, &solver, variables)?;

    if !logger::muted() {
        section("statistics");
        write_statistics(out, &*solver.statistics())?;
    }

    drop(reporter);
    section("shutting down");
    drop(solver);

    let code = status.code();
    info!("exit {code}");
    Ok(code)
}

/// [`run`] on standard output.
pub fn run_stdout(options: &Options) -> Result<i32> {
    run(options, &mut io::stdout())
}

#[cfg(test)]
mod tests {
    use std::{fmt, io};

    use crate::{error::Error, solver::Statistics};

    use super::write_statistics;

    struct Lines(&'static str);

    impl Statistics for Lines {
        fn report(&self, out: &mut dyn fmt::Write) -> fmt::Result {
            out.write_str(self.0)
        }
    }

    struct Broken;

    impl Statistics for Broken {
        fn report(&self, _: &mut dyn fmt::Write) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn statistics_are_written() {
        let mut out = vec![];
        write_statistics(&mut out, &Lines("c conflicts: 3\n")).unwrap();
        assert_eq!(out, b"c conflicts: 3\n");
    }

    #[test]
    fn statistics_failure_is_reported() {
        let mut out = vec![];
        let err = write_statistics(&mut out, &Broken).unwrap_err();
        assert!(matches!(err, Error::Write(ref source) if source.kind() == io::ErrorKind::Other));
        assert!(out.is_empty());
    }
}
