use crate::types::Var;

use super::{
    assignment::Assignment,
    map::{var_map, VarMap},
};

const RESCALE_LIMIT: f64 = 1e100;

/// Variable activities in the style of exponential VSIDS, kept in a binary
/// max-heap of candidate decision variables.
pub struct Evsids {
    activity: VarMap<f64>,
    increment: f64,
    bumped: VarMap<bool>,
    round: Vec<Var>,
    heap: Vec<Var>,
    position: VarMap<Option<usize>>,
}

impl Evsids {
    pub fn new(var_count: usize) -> Self {
        let mut evsids = Self {
            activity: var_map(var_count),
            increment: 1.0,
            bumped: var_map(var_count),
            round: vec![],
            heap: Vec::with_capacity(var_count),
            position: var_map(var_count),
        };
        for var in 1..=var_count {
            evsids.insert(var);
        }
        evsids
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.position[self.heap[i]] = Some(i);
        self.position[self.heap[j]] = Some(j);
    }

    fn above(&self, i: usize, j: usize) -> bool {
        self.activity[self.heap[i]] > self.activity[self.heap[j]]
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.above(i, parent) {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let mut max = i;
            for child in [2 * i + 1, 2 * i + 2] {
                if child < self.heap.len() && self.above(child, max) {
                    max = child;
                }
            }
            if max == i {
                break;
            }
            self.swap(i, max);
            i = max;
        }
    }

    /// Makes `var` a decision candidate again, e.g. after it was unassigned.
    pub fn insert(&mut self, var: Var) {
        if self.position[var].is_none() {
            self.heap.push(var);
            self.position[var] = Some(self.heap.len() - 1);
            self.sift_up(self.heap.len() - 1);
        }
    }

    fn pop(&mut self) -> Option<Var> {
        let top = *self.heap.first()?;
        let last = self.heap.len() - 1;
        self.swap(0, last);
        self.heap.pop();
        self.position[top] = None;
        self.sift_down(0);
        Some(top)
    }

    /// Bumps `var` at most once between two calls of [`Evsids::decay`].
    pub fn bump(&mut self, var: Var) {
        if self.bumped[var] {
            return;
        }
        self.bumped[var] = true;
        self.round.push(var);

        self.activity[var] += self.increment;
        if let Some(i) = self.position[var] {
            self.sift_up(i);
        }

        if self.activity[var] > RESCALE_LIMIT {
            for activity in &mut self.activity {
                *activity /= RESCALE_LIMIT;
            }
            self.increment /= RESCALE_LIMIT;
        }
    }

    pub fn decay(&mut self) {
        self.increment *= 1.01;
        for var in self.round.drain(..) {
            self.bumped[var] = false;
        }
    }

    /// Unassigned variable with the highest activity.
    pub fn choose(&mut self, assignment: &Assignment) -> Option<Var> {
        while let Some(var) = self.pop() {
            if assignment.value(var).is_none() {
                return Some(var);
            }
        }
        None
    }
}
