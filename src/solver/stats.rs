use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

use super::Statistics;

/// Search counters of [`Cdcl`](super::Cdcl).
///
/// All counters are atomics so that a signal handler may read them while
/// the search is updating them.
pub struct Stats {
    started: Instant,
    pub(super) clauses: AtomicU64,
    pub(super) conflicts: AtomicU64,
    pub(super) decisions: AtomicU64,
    pub(super) propagations: AtomicU64,
    pub(super) restarts: AtomicU64,
    pub(super) learned: AtomicU64,
}

pub(super) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn per(count: u64, total: f64) -> f64 {
    if total > 0.0 {
        count as f64 / total
    } else {
        0.0
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            clauses: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
            decisions: AtomicU64::new(0),
            propagations: AtomicU64::new(0),
            restarts: AtomicU64::new(0),
            learned: AtomicU64::new(0),
        }
    }

    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    pub fn decisions(&self) -> u64 {
        self.decisions.load(Ordering::Relaxed)
    }

    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics for Stats {
    fn report(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let seconds = self.started.elapsed().as_secs_f64();
        let clauses = self.clauses.load(Ordering::Relaxed);
        let conflicts = self.conflicts();
        let decisions = self.decisions();
        let propagations = self.propagations.load(Ordering::Relaxed);
        let restarts = self.restarts();
        let learned = self.learned.load(Ordering::Relaxed);

        writeln!(out, "c {:<14}{:>14}", "clauses:", clauses)?;
        writeln!(
            out,
            "c {:<14}{:>14} {:>14.2} per second",
            "conflicts:",
            conflicts,
            per(conflicts, seconds)
        )?;
        writeln!(
            out,
            "c {:<14}{:>14} {:>14.2} per conflict",
            "decisions:",
            decisions,
            per(decisions, conflicts as f64)
        )?;
        writeln!(
            out,
            "c {:<14}{:>14} {:>14.2} per second",
            "propagations:",
            propagations,
            per(propagations, seconds)
        )?;
        writeln!(
            out,
            "c {:<14}{:>14} {:>14.2} interval",
            "restarts:",
            restarts,
            per(conflicts, restarts as f64)
        )?;
        writeln!(
            out,
            "c {:<14}{:>14} {:>14.2} per conflict",
            "learned:",
            learned,
            per(learned, conflicts as f64)
        )?;
        writeln!(out, "c")?;
        writeln!(out, "c {:<14}{:>14.2} seconds", "wall-clock:", seconds)
    }
}

#[cfg(test)]
mod tests {
    use crate::solver::Statistics;

    use super::{bump, Stats};

    #[test]
    fn report_lines() {
        let stats = Stats::new();
        bump(&stats.conflicts);
        bump(&stats.conflicts);
        bump(&stats.decisions);

        let mut out = String::new();
        stats.report(&mut out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.iter().all(|line| line.starts_with('c')));
        assert!(lines[1].starts_with("c conflicts:"));
        assert!(lines[1].contains(" 2 "));
        assert!(lines[2].ends_with("0.50 per conflict"));
    }
}
