//! The solver collaborator: the contract the parser, the witness printer and
//! the interrupt reporter rely on, and [`Cdcl`], the engine shipped with the
//! command line tool.

mod assignment;
mod branching;
mod map;
mod restart;
mod search;
mod stats;

use std::{fmt, mem, sync::Arc};

use log::debug;

use crate::types::{to_var, Clause, Lit, Status, Var};

use self::search::Search;

pub use self::stats::Stats;

/// Receiver of the literal stream produced by the DIMACS parser.
/// A `0` terminates the current clause.
pub trait ClauseSink {
    fn add(&mut self, lit: Lit);
}

impl ClauseSink for Vec<Lit> {
    fn add(&mut self, lit: Lit) {
        self.push(lit);
    }
}

/// Statistics which can be printed at any time, including from within a
/// signal handler. Implementations must neither allocate nor take locks in
/// [`Statistics::report`].
pub trait Statistics: Send + Sync {
    fn report(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// A SAT solver fed clause by clause through [`ClauseSink::add`].
///
/// Releasing the solver is dropping it.
pub trait Solver: ClauseSink {
    fn solve(&mut self) -> Status;

    /// The value of `var` in the last satisfying assignment, as a literal.
    fn value(&self, var: Var) -> Lit;

    /// Handle to the live statistics of this solver.
    fn statistics(&self) -> Arc<dyn Statistics>;
}

/// Conflict driven clause learning solver.
pub struct Cdcl {
    var_count: usize,
    clause: Clause,
    clauses: Vec<Clause>,
    model: Vec<bool>,
    stats: Arc<Stats>,
}

impl Cdcl {
    pub fn new() -> Self {
        Self {
            var_count: 0,
            clause: vec![],
            clauses: vec![],
            model: vec![],
            stats: Arc::new(Stats::new()),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl Default for Cdcl {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseSink for Cdcl {
    fn add(&mut self, lit: Lit) {
        if lit == 0 {
            self.clauses.push(mem::take(&mut self.clause));
            stats::bump(&self.stats.clauses);
        } else {
            self.var_count = self.var_count.max(to_var(lit));
            self.clause.push(lit);
        }
    }
}

impl Solver for Cdcl {
    fn solve(&mut self) -> Status {
        debug!(
            "solving {} clauses over {} variables",
            self.clauses.len(),
            self.var_count
        );
        let mut search = Search::new(self.var_count, &self.clauses, Arc::clone(&self.stats));
        let status = search.run();
        self.model = match status {
            Status::Sat => search.model(),
            _ => vec![],
        };
        status
    }

    fn value(&self, var: Var) -> Lit {
        let lit = var as Lit;
        if self.model.get(var).copied().unwrap_or(false) {
            lit
        } else {
            -lit
        }
    }

    fn statistics(&self) -> Arc<dyn Statistics> {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{Clause, Status};

    use super::{Cdcl, ClauseSink, Solver, Statistics};

    fn solve(clauses: &[Clause]) -> (Status, Cdcl) {
        let mut solver = Cdcl::new();
        for clause in clauses {
            for &lit in clause {
                solver.add(lit);
            }
            solver.add(0);
        }
        let status = solver.solve();
        (status, solver)
    }

    fn check(clauses: Vec<Clause>, sat: bool) {
        let (status, solver) = solve(&clauses);
        if sat {
            assert_eq!(status, Status::Sat);
            let satisfied = |clause: &Clause| {
                clause
                    .iter()
                    .any(|&lit| solver.value(lit.unsigned_abs() as usize) == lit)
            };
            assert!(clauses.iter().all(satisfied));
        } else {
            assert_eq!(status, Status::Unsat);
        }
    }

    #[test]
    /// Formulas from the lecture.
    fn basic_sat() {
        let clauses = vec![vec![1, 2], vec![-1, 2], vec![-1, -2, 3], vec![-1, -2, -3]];
        check(clauses, true);

        let clauses = vec![
            vec![-1, -2, 3],
            vec![2, -1, 3],
            vec![1, -2, 3],
            vec![-3, 4, 5],
            vec![-3, 4, -5],
            vec![-3, -4, 5],
            vec![-3, -4, -5],
        ];
        check(clauses, true);
    }

    #[test]
    fn basic_unsat() {
        let clauses = vec![
            vec![1, 2],
            vec![-2, 3],
            vec![-2, -3],
            vec![-1, -2, -4],
            vec![-1, 2, -4],
            vec![-1, 2, 4],
        ];

        check(clauses, false);
    }

    #[test]
    /// Formulas with non-trivial propagation before the first decision.
    fn kickstart() {
        let clauses = vec![vec![1], vec![-1, 2], vec![-1, -2]];
        check(clauses, false);
    }

    #[test]
    fn empty_clause_and_tautologies() {
        check(vec![vec![1, -1], vec![2, 2]], true);
        check(vec![vec![1], vec![]], false);
        let (status, solver) = solve(&[]);
        assert_eq!(status, Status::Sat);
        assert_eq!(solver.value(7), -7);
    }

    #[test]
    fn pigeonhole_three_into_two() {
        // p(i, h) = 2 * i + h - 2 for pigeon i in 1..=3, hole h in 1..=2
        let p = |i: i32, h: i32| 2 * i + h - 2;
        let mut clauses: Vec<Clause> = (1..=3).map(|i| vec![p(i, 1), p(i, 2)]).collect();
        for h in 1..=2 {
            for i in 1..=3 {
                for j in i + 1..=3 {
                    clauses.push(vec![-p(i, h), -p(j, h)]);
                }
            }
        }
        check(clauses, false);
    }

    #[test]
    fn counts_statistics() {
        let (_, solver) = solve(&[vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]]);
        assert!(solver.stats().conflicts() > 0);
        let mut out = String::new();
        Statistics::report(&*solver.statistics(), &mut out).unwrap();
        assert!(out.starts_with("c clauses:"));
        assert!(out.lines().next().unwrap().ends_with(" 4"));
    }
}
