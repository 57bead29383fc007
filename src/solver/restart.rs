/// The Luby sequence scaled by `base`.
pub struct Luby {
    base: u64,
    uv: (i64, i64),
}

impl Luby {
    pub fn new(base: u64) -> Self {
        Self { base, uv: (1, 1) }
    }
}

impl Iterator for Luby {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        let (u, v) = self.uv;
        // Based on Knuth's formula, see https://oeis.org/A182105.
        self.uv = if u & -u == v { (u + 1, 1) } else { (u, 2 * v) };
        Some(self.base * v as u64)
    }
}

/// Restart schedule: restart once the conflicts since the last restart
/// reach the next Luby interval.
pub struct Restarts {
    intervals: Luby,
    limit: u64,
    conflicts: u64,
}

impl Restarts {
    pub fn new(base: u64) -> Self {
        let mut intervals = Luby::new(base);
        let limit = intervals.next().unwrap_or(base);
        Self {
            intervals,
            limit,
            conflicts: 0,
        }
    }

    pub fn conflict(&mut self) {
        self.conflicts += 1;
    }

    /// Whether to restart now; advances the schedule if so.
    pub fn due(&mut self) -> bool {
        if self.conflicts < self.limit {
            return false;
        }
        self.conflicts = 0;
        self.limit = self.intervals.next().unwrap_or(self.limit);
        true
    }
}
