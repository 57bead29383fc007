use std::sync::Arc;

use log::{debug, trace};

use crate::types::{to_var, Clause, Lit, Status};

use super::{
    assignment::{Assignment, Reason},
    branching::Evsids,
    map::LitMap,
    restart::Restarts,
    stats::{bump, Stats},
};

const RESTART_BASE: u64 = 16;

/// One CDCL run over a fixed set of clauses.
pub struct Search {
    clauses: Vec<Clause>,
    inconsistent: bool,

    assignment: Assignment,

    watched: LitMap<Vec<usize>>,
    prop_head: usize,

    evsids: Evsids,
    restarts: Restarts,

    stats: Arc<Stats>,
}

/// Sorts and deduplicates `clause`, `None` for tautologies.
fn normalize(clause: &[Lit]) -> Option<Clause> {
    let mut clause = clause.to_vec();
    clause.sort_unstable();
    clause.dedup();
    if clause.iter().any(|&lit| clause.binary_search(&-lit).is_ok()) {
        return None;
    }
    Some(clause)
}

impl Search {
    pub fn new(var_count: usize, clauses: &[Clause], stats: Arc<Stats>) -> Self {
        let mut search = Search {
            clauses: Vec::with_capacity(clauses.len()),
            inconsistent: false,
            assignment: Assignment::new(var_count),
            watched: LitMap::new(var_count),
            prop_head: 0,
            evsids: Evsids::new(var_count),
            restarts: Restarts::new(RESTART_BASE),
            stats,
        };

        for clause in clauses.iter().filter_map(|clause| normalize(clause)) {
            if clause.is_empty() {
                search.inconsistent = true;
            }
            search.add(clause);
        }

        search
    }

    fn add(&mut self, clause: Clause) -> usize {
        let i = self.clauses.len();
        if let [lit0, lit1, ..] = clause[..] {
            self.watched[lit0].push(i);
            self.watched[lit1].push(i);
        }
        self.clauses.push(clause);
        i
    }

    fn propagate(&mut self) -> Option<usize> {
        while let Some(&lit) = self.assignment.trail().get(self.prop_head) {
            bump(&self.stats.propagations);
            let lit = -lit;

            let mut i = 0;
            'clause: while i < self.watched[lit].len() {
                let c = self.watched[lit][i];
                let clause = &mut self.clauses[c];

                // The two watched literals are kept at index 0 and 1.
                if clause[1] != lit {
                    clause.swap(0, 1);
                }
                debug_assert_eq!(clause[1], lit);

                for j in 0..clause.len() {
                    match self.assignment.eval(clause[j]) {
                        Some(true) => {
                            i += 1;
                            continue 'clause;
                        }
                        None if j != 0 => {
                            clause.swap(1, j);
                            debug_assert_ne!(clause[0], clause[1]);

                            self.watched[lit].swap_remove(i);
                            let watch = clause[1];
                            self.watched[watch].push(c);

                            continue 'clause;
                        }
                        _ => (),
                    }
                }

                if self.assignment.eval(clause[0]).is_none() {
                    let unit = clause[0];
                    self.assignment
                        .set(unit, Reason::Propagation { i_clause: c });
                } else {
                    return Some(c);
                }

                i += 1;
            }

            self.prop_head += 1;
        }

        None
    }

    /// First-UIP learning. Returns the learned clause with the asserting
    /// literal first and the level to backtrack to.
    fn analyze(&mut self, i_conflict: usize) -> (Clause, usize) {
        let mut learnt = self.clauses[i_conflict].clone();
        let last_level = self.assignment.last_level();

        let mut i_trail = self.assignment.trail().len();
        let i_assert = loop {
            for &lit in &learnt {
                self.evsids.bump(to_var(lit));
            }

            let mut current = learnt
                .iter()
                .enumerate()
                .filter(|(_, &lit)| self.assignment.level(lit) == Some(last_level));
            let first = current.next().map(|(i, _)| i);
            if current.next().is_none() {
                break first.unwrap_or(0);
            }

            i_trail -= 1;
            let on_lit = self.assignment.trail()[i_trail];

            let i_reason = match self.assignment.reason(on_lit) {
                Some(Reason::Propagation { i_clause }) => i_clause,
                _ => continue,
            };
            let reason = &self.clauses[i_reason];
            debug_assert!(reason.contains(&on_lit));

            let len_before = learnt.len();
            learnt.retain(|&lit| lit != -on_lit);
            if learnt.len() != len_before {
                learnt.extend(reason.iter().filter(|&&lit| lit != on_lit));
                learnt.sort_unstable();
                learnt.dedup();
            }
        };

        learnt.swap(0, i_assert);

        let backtrack_level = if learnt.len() == 1 {
            1
        } else {
            let (i_max, _) = learnt[1..]
                .iter()
                .enumerate()
                .max_by_key(|(_, &lit)| self.assignment.level(lit))
                .unwrap_or((0, &0));
            learnt.swap(1, i_max + 1);

            self.assignment.level(learnt[1]).unwrap_or(0) + 1
        };

        self.evsids.decay();

        (learnt, backtrack_level)
    }

    fn backtrack(&mut self, level: usize) {
        for lit in self.assignment.backtrack(level) {
            self.evsids.insert(to_var(lit));
        }
        self.prop_head = std::cmp::min(self.prop_head, self.assignment.trail().len());
    }

    pub fn run(&mut self) -> Status {
        if self.inconsistent {
            return Status::Unsat;
        }

        for i in 0..self.clauses.len() {
            if let [lit] = self.clauses[i][..] {
                match self.assignment.eval(lit) {
                    None => self
                        .assignment
                        .set(lit, Reason::Propagation { i_clause: i }),
                    Some(false) => return Status::Unsat,
                    Some(true) => (),
                }
            }
        }

        if self.propagate().is_some() {
            return Status::Unsat;
        }

        while let Some(var) = self.evsids.choose(&self.assignment) {
            bump(&self.stats.decisions);
            self.assignment.set(-(var as Lit), Reason::Decision);

            while let Some(i_conflict) = self.propagate() {
                bump(&self.stats.conflicts);
                self.restarts.conflict();

                if self.assignment.last_level() == 0 {
                    return Status::Unsat;
                }

                let (learnt, level) = self.analyze(i_conflict);
                trace!("learned {learnt:?} backtracking to level {}", level - 1);
                bump(&self.stats.learned);

                self.backtrack(level);

                let lit_assert = learnt[0];
                let i_clause = self.add(learnt);
                self.assignment
                    .set(lit_assert, Reason::Propagation { i_clause });
            }

            if self.restarts.due() {
                bump(&self.stats.restarts);
                debug!(
                    "restart {} after {} conflicts",
                    self.stats.restarts(),
                    self.stats.conflicts()
                );
                self.backtrack(1);
            }
        }

        Status::Sat
    }

    pub fn model(&self) -> Vec<bool> {
        self.assignment.model()
    }
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn normalize_clauses() {
        assert_eq!(normalize(&[3, -1, 3]), Some(vec![-1, 3]));
        assert_eq!(normalize(&[2, -2, 1]), None);
        assert_eq!(normalize(&[]), Some(vec![]));
    }
}
