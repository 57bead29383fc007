use std::io::{self, Write};

use crate::{solver::Solver, types::Lit};

/// Maximum length of a `v` row including the `v` itself.
pub const ROW_WIDTH: usize = 78;

const CONTENT_WIDTH: usize = ROW_WIDTH - 1;

const MAX_TOKEN: usize = " -2147483648".len();

const _: () = assert!(MAX_TOKEN <= CONTENT_WIDTH);

/// Pretty printer for witnesses in the SAT competition format, i.e. `v`
/// rows of at most [`ROW_WIDTH`] characters.
pub struct WitnessPrinter<W: Write> {
    writer: W,
    buffer: String,
}

impl<W: Write> WitnessPrinter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: String::with_capacity(CONTENT_WIDTH),
        }
    }

    pub fn print(&mut self, lit: Lit) -> io::Result<()> {
        let token = format!(" {lit}");
        if self.buffer.len() + token.len() > CONTENT_WIDTH {
            self.flush()?;
        }
        self.buffer.push_str(&token);
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "v{}", self.buffer)?;
        self.buffer.clear();
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Prints the value of every variable in `1..=variables` followed by `0`.
pub fn write_witness<S: Solver + ?Sized>(
    writer: &mut impl Write,
    solver: &S,
    variables: Lit,
) -> io::Result<()> {
    let mut printer = WitnessPrinter::new(writer);
    for var in 1..=variables {
        printer.print(solver.value(var as usize))?;
    }
    printer.print(0)?;
    printer.flush()
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use crate::types::Lit;

    use super::{WitnessPrinter, ROW_WIDTH};

    fn render(lits: &[Lit]) -> String {
        let mut printer = WitnessPrinter::new(vec![]);
        for &lit in lits {
            printer.print(lit).unwrap();
        }
        printer.flush().unwrap();
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn short() {
        assert_eq!(render(&[1, -2, 3, 0]), "v 1 -2 3 0\n");
    }

    #[test]
    fn empty_witness() {
        assert_eq!(render(&[0]), "v 0\n");
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn wraps() {
        let lits: Vec<Lit> = (1..=40)
            .map(|var| if var % 2 == 0 { -var } else { var })
            .chain([0])
            .collect();
        let out = render(&lits);
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(
            rows,
            vec![
                "v 1 -2 3 -4 5 -6 7 -8 9 -10 11 -12 13 -14 15 -16 17 -18 19 -20 21 -22 23 -24",
                "v 25 -26 27 -28 29 -30 31 -32 33 -34 35 -36 37 -38 39 -40 0",
            ]
        );
        assert!(rows[0].len() <= ROW_WIDTH);
    }

    #[test]
    fn fills_row_exactly() {
        // 7 tokens of 11 characters fill the 77 characters after 'v'.
        let lits = vec![1_000_000_000; 8];
        let out = render(&lits);
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), ROW_WIDTH);
        assert_eq!(rows[1], "v 1000000000");
    }

    #[quickcheck]
    fn rows_reproduce_literals(lits: Vec<Lit>) -> bool {
        let mut lits: Vec<Lit> = lits.into_iter().filter(|&lit| lit != 0).collect();
        lits.push(0);
        let out = render(&lits);

        let rows_ok = out
            .lines()
            .all(|row| row.len() <= ROW_WIDTH && row.starts_with("v "));
        let tokens: Vec<Lit> = out
            .lines()
            .flat_map(|row| row[1..].split_whitespace())
            .map(|token| token.parse().unwrap())
            .collect();
        rows_ok && tokens == lits
    }
}
