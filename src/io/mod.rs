pub mod dimacs;
pub mod input;
pub mod reader;
pub mod witness;

use std::io::{BufReader, Write};

use log::info;

use crate::{
    error::Result,
    solver::{ClauseSink, Solver},
    types::{Lit, Status},
};

use self::{
    dimacs::Dimacs,
    input::Input,
    reader::ByteReader,
    witness::write_witness,
};

pub use self::witness::WitnessPrinter;

/// Parses `input` into `sink` and closes it afterwards.
pub fn read_problem<S: ClauseSink + ?Sized>(input: Input, sink: &mut S) -> Result<Dimacs> {
    let path = input.path().to_string();
    let mut reader = ByteReader::new(BufReader::new(input), path);
    let dimacs = dimacs::parse(&mut reader, sink)?;

    let bytes = reader.bytes();
    reader.into_inner().into_inner().close()?;
    info!(
        "after reading {} bytes ({:.0} MB)",
        bytes,
        bytes as f64 / (1 << 20) as f64
    );

    Ok(dimacs)
}

/// Writes the `s` line and, if requested, the witness.
pub fn write_solution<S: Solver + ?Sized>(
    writer: &mut impl Write,
    status: Status,
    solver: &S,
    variables: Option<Lit>,
) -> Result<()> {
    match status {
        Status::Sat => {
            writeln!(writer, "s SATISFIABLE")?;
            if let Some(variables) = variables {
                write_witness(writer, solver, variables)?;
            }
        }
        Status::Unsat => writeln!(writer, "s UNSATISFIABLE")?,
        Status::Unknown => info!("no result"),
    }
    writer.flush()?;
    Ok(())
}
