use crate::types::{to_var, Lit, Var};

use super::map::{var_map, VarMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reason {
    Decision,
    Propagation { i_clause: usize },
}

#[derive(Clone)]
struct VarData {
    value: bool,
    level: usize,
    reason: Reason,
}

/// Partial assignment with its trail and decision levels.
pub struct Assignment {
    data: VarMap<Option<VarData>>,
    trail: Vec<Lit>,
    /// Trail position of every decision.
    levels: Vec<usize>,
}

impl Assignment {
    pub fn new(var_count: usize) -> Self {
        Self {
            data: var_map(var_count),
            trail: vec![],
            levels: vec![],
        }
    }

    pub fn eval(&self, lit: Lit) -> Option<bool> {
        self.value(to_var(lit))
            .map(|value| value == lit.is_positive())
    }

    pub fn value(&self, var: Var) -> Option<bool> {
        self.data[var].as_ref().map(|data| data.value)
    }

    pub fn set(&mut self, lit: Lit, reason: Reason) {
        debug_assert_eq!(self.eval(lit), None);
        if reason == Reason::Decision {
            self.levels.push(self.trail.len());
        }
        self.trail.push(lit);

        self.data[to_var(lit)] = Some(VarData {
            value: lit.is_positive(),
            level: self.last_level(),
            reason,
        });
    }

    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    pub fn level(&self, lit: Lit) -> Option<usize> {
        self.data[to_var(lit)].as_ref().map(|data| data.level)
    }

    pub fn reason(&self, lit: Lit) -> Option<Reason> {
        self.data[to_var(lit)].as_ref().map(|data| data.reason)
    }

    pub fn last_level(&self) -> usize {
        self.levels.len()
    }

    /// Revert all changes at `level` (incl.) and above.
    /// Returns the literals that were unassigned.
    pub fn backtrack(&mut self, level: usize) -> Vec<Lit> {
        if level > self.last_level() {
            return vec![];
        }
        let i = match level {
            0 => 0,
            _ => self.levels[level - 1],
        };
        self.levels.truncate(level.saturating_sub(1));
        let undone = self.trail.split_off(i);
        for &lit in &undone {
            self.data[to_var(lit)] = None;
        }
        undone
    }

    /// Values of all variables, unassigned ones reported as false.
    pub fn model(&self) -> Vec<bool> {
        self.data
            .iter()
            .map(|data| data.as_ref().map_or(false, |data| data.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Assignment, Reason};

    #[test]
    fn basic() {
        let mut ass = Assignment::new(3);

        assert_eq!(ass.last_level(), 0);

        ass.set(3, Reason::Propagation { i_clause: 0 });
        ass.set(1, Reason::Decision);
        ass.set(-2, Reason::Propagation { i_clause: 1 });

        assert_eq!(ass.last_level(), 1);
        assert_eq!(ass.level(3), Some(0));
        assert_eq!(ass.level(1), Some(1));
        assert_eq!(ass.level(2), Some(1));
        assert_eq!(ass.eval(-2), Some(true));
        assert_eq!(ass.reason(1), Some(Reason::Decision));

        assert_eq!(ass.backtrack(1), vec![1, -2]);
        assert_eq!(ass.eval(2), None);
        assert_eq!(ass.eval(1), None);
        assert_eq!(ass.eval(3), Some(true));
        assert_eq!(ass.trail(), &[3]);
        assert_eq!(ass.model(), vec![false, false, false, true]);
    }

    #[test]
    fn backtrack_above_last_level() {
        let mut ass = Assignment::new(2);
        ass.set(1, Reason::Decision);
        assert!(ass.backtrack(2).is_empty());
        assert_eq!(ass.trail(), &[1]);
    }
}
