//! Reporting of fatal and interrupting signals.
//!
//! While an [`InterruptReporter`] is alive, SIGABRT, SIGBUS, SIGINT, SIGSEGV
//! and SIGTERM are caught. The first caught signal prints the solver
//! statistics (unless logging is muted), restores the handlers that were
//! installed before and raises the signal again. Later signals are ignored
//! by the handler, so statistics are printed at most once per process.

use std::{
    fmt::{self, Write},
    io, mem, ptr,
    sync::{
        atomic::{AtomicI32, AtomicPtr, Ordering},
        Arc,
    },
};

use libc::{c_int, c_void, sighandler_t};
use log::debug;
use signal_hook::{
    consts::{SIGABRT, SIGBUS, SIGINT, SIGSEGV, SIGTERM},
    low_level,
};

use crate::{
    error::{Error, Result},
    logger,
    solver::Statistics,
};

const SIGNALS: [(c_int, &str); 5] = [
    (SIGABRT, "SIGABRT"),
    (SIGBUS, "SIGBUS"),
    (SIGINT, "SIGINT"),
    (SIGSEGV, "SIGSEGV"),
    (SIGTERM, "SIGTERM"),
];

/// What the handler needs while a reporter is installed: the statistics to
/// print and the complete previous action of every signal in [`SIGNALS`].
struct Installed {
    statistics: Arc<dyn Statistics>,
    previous: [libc::sigaction; SIGNALS.len()],
}

/// Remembers the first caught signal.
pub struct Latch(AtomicI32);

impl Latch {
    pub const fn new() -> Self {
        Self(AtomicI32::new(0))
    }

    /// Returns `true` for the first signal only.
    pub fn fire(&self, signal: c_int) -> bool {
        self.0
            .compare_exchange(0, signal, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn caught(&self) -> Option<c_int> {
        match self.0.load(Ordering::SeqCst) {
            0 => None,
            signal => Some(signal),
        }
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}

static CAUGHT: Latch = Latch::new();

static INSTALLED: AtomicPtr<Installed> = AtomicPtr::new(ptr::null_mut());

pub fn signal_name(signal: c_int) -> &'static str {
    SIGNALS
        .iter()
        .find(|&&(monitored, _)| monitored == signal)
        .map_or("SIGNUNKNOWN", |&(_, name)| name)
}

/// Writes the interrupt report for `signal` unless `latch` already fired.
/// Returns whether this was the first signal.
pub fn report(
    latch: &Latch,
    signal: c_int,
    statistics: Option<&dyn Statistics>,
    muted: bool,
    out: &mut dyn Write,
) -> bool {
    if !latch.fire(signal) {
        return false;
    }
    if !muted {
        let name = signal_name(signal);
        let _ = write!(out, "c\nc caught signal {signal} ('{name}')\n");
        if let Some(statistics) = statistics {
            let _ = statistics.report(out);
        }
        let _ = write!(out, "c\nc raising signal {signal} ('{name}')\nc\n");
    }
    true
}

/// Fixed size buffer in front of `write(2)` on stdout, usable from a signal
/// handler.
struct RawStdout {
    buffer: [u8; 512],
    len: usize,
}

impl RawStdout {
    fn new() -> Self {
        Self {
            buffer: [0; 512],
            len: 0,
        }
    }

    fn flush(&mut self) {
        let mut written = 0;
        while written < self.len {
            let pending = &self.buffer[written..self.len];
            let n = unsafe {
                libc::write(
                    libc::STDOUT_FILENO,
                    pending.as_ptr() as *const c_void,
                    pending.len(),
                )
            };
            if n <= 0 {
                break;
            }
            written += n as usize;
        }
        self.len = 0;
    }
}

impl Write for RawStdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            if self.len == self.buffer.len() {
                self.flush();
            }
            let n = bytes.len().min(self.buffer.len() - self.len);
            self.buffer[self.len..self.len + n].copy_from_slice(&bytes[..n]);
            self.len += n;
            bytes = &bytes[n..];
        }
        Ok(())
    }
}

/// Reinstates the saved actions, flags and masks included.
fn restore(previous: &[libc::sigaction]) {
    for (&(signal, _), action) in SIGNALS.iter().zip(previous) {
        unsafe {
            libc::sigaction(signal, action, ptr::null_mut());
        }
    }
}

fn unblock(signal: c_int) {
    unsafe {
        let mut set: libc::sigset_t = mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, signal);
        libc::pthread_sigmask(libc::SIG_UNBLOCK, &set, ptr::null_mut());
    }
}

extern "C" fn catch_signal(signal: c_int) {
    // The state stays valid until the reporter is dropped, which restores
    // the previous actions before freeing it.
    let installed = unsafe { INSTALLED.load(Ordering::SeqCst).as_ref() };
    let mut out = RawStdout::new();
    let first = report(
        &CAUGHT,
        signal,
        installed.map(|installed| &*installed.statistics),
        logger::muted(),
        &mut out,
    );
    if !first {
        return;
    }
    out.flush();
    if let Some(installed) = installed {
        restore(&installed.previous);
    }

    // Deliver to the previous action right away instead of after returning.
    unblock(signal);
    let _ = low_level::raise(signal);

    // The previous action returned. The stack overflow handler of std does
    // so for a SIGSEGV or SIGBUS sent by another process.
    let _ = low_level::emulate_default_handler(signal);
}

fn handler_action() -> libc::sigaction {
    let handler: extern "C" fn(c_int) = catch_signal;
    let mut action: libc::sigaction = unsafe { mem::zeroed() };
    action.sa_sigaction = handler as sighandler_t;
    action.sa_flags = libc::SA_RESTART;
    unsafe {
        libc::sigemptyset(&mut action.sa_mask);
    }
    action
}

/// Guard for the installed signal handlers. Dropping it reinstates the
/// actions found at installation.
pub struct InterruptReporter {
    _private: (),
}

impl InterruptReporter {
    pub fn install(statistics: Arc<dyn Statistics>) -> Result<Self> {
        let mut installed = Box::new(Installed {
            statistics,
            previous: unsafe { mem::zeroed() },
        });
        for (&(signal, _), previous) in SIGNALS.iter().zip(&mut installed.previous) {
            if unsafe { libc::sigaction(signal, ptr::null(), previous) } != 0 {
                return Err(Error::Signal(io::Error::last_os_error()));
            }
        }

        let stale = INSTALLED.swap(Box::into_raw(installed), Ordering::SeqCst);
        if !stale.is_null() {
            drop(unsafe { Box::from_raw(stale) });
        }

        // From here on dropping the reporter undoes a partial installation.
        let reporter = Self { _private: () };
        let action = handler_action();
        for &(signal, _) in &SIGNALS {
            if unsafe { libc::sigaction(signal, &action, ptr::null_mut()) } != 0 {
                return Err(Error::Signal(io::Error::last_os_error()));
            }
        }
        debug!("installed signal handlers");

        Ok(reporter)
    }

    /// The first signal caught while a reporter was installed.
    pub fn caught() -> Option<c_int> {
        CAUGHT.caught()
    }
}

impl Drop for InterruptReporter {
    fn drop(&mut self) {
        let installed = INSTALLED.load(Ordering::SeqCst);
        if let Some(state) = unsafe { installed.as_ref() } {
            restore(&state.previous);
        }
        INSTALLED.store(ptr::null_mut(), Ordering::SeqCst);
        if !installed.is_null() {
            drop(unsafe { Box::from_raw(installed) });
        }
        debug!("restored signal handlers");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fmt::{self, Write},
        mem, ptr,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use libc::{c_int, sighandler_t};
    use signal_hook::consts::{SIGINT, SIGSEGV, SIGTERM};

    use crate::solver::Statistics;

    use super::{report, signal_name, InterruptReporter, Latch, RawStdout};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Statistics for Counting {
        fn report(&self, out: &mut dyn fmt::Write) -> fmt::Result {
            self.0.fetch_add(1, Ordering::SeqCst);
            writeln!(out, "c conflicts: 42")
        }
    }

    fn current_action(signal: c_int) -> (sighandler_t, c_int) {
        unsafe {
            let mut action: libc::sigaction = mem::zeroed();
            libc::sigaction(signal, ptr::null(), &mut action);
            (action.sa_sigaction, action.sa_flags)
        }
    }

    #[test]
    fn names() {
        assert_eq!(signal_name(SIGINT), "SIGINT");
        assert_eq!(signal_name(SIGTERM), "SIGTERM");
        assert_eq!(signal_name(0), "SIGNUNKNOWN");
    }

    #[test]
    fn report_format() {
        let latch = Latch::new();
        let stats = Counting::default();
        let mut out = String::new();
        assert!(report(&latch, SIGINT, Some(&stats), false, &mut out));
        assert_eq!(
            out,
            format!(
                "c\nc caught signal {SIGINT} ('SIGINT')\nc conflicts: 42\n\
                 c\nc raising signal {SIGINT} ('SIGINT')\nc\n"
            )
        );
        assert_eq!(latch.caught(), Some(SIGINT));
    }

    #[test]
    fn two_rapid_signals_report_once() {
        let latch = Latch::new();
        let stats = Counting::default();
        let mut out = String::new();
        assert!(report(&latch, SIGINT, Some(&stats), false, &mut out));
        assert!(!report(&latch, SIGTERM, Some(&stats), false, &mut out));
        assert_eq!(stats.0.load(Ordering::SeqCst), 1);
        assert_eq!(out.matches("caught signal").count(), 1);
        assert_eq!(latch.caught(), Some(SIGINT));
    }

    #[test]
    fn muted_report() {
        let latch = Latch::new();
        let stats = Counting::default();
        let mut out = String::new();
        assert!(report(&latch, SIGTERM, Some(&stats), true, &mut out));
        assert!(out.is_empty());
        assert_eq!(stats.0.load(Ordering::SeqCst), 0);
        assert!(!report(&latch, SIGTERM, None, true, &mut out));
    }

    #[test]
    fn raw_stdout_buffers() {
        let mut out = RawStdout::new();
        write!(out, "c caught signal {}", 2).unwrap();
        assert_eq!(&out.buffer[..out.len], b"c caught signal 2");
    }

    #[test]
    fn install_and_restore() {
        // SIGSEGV usually carries the stack overflow handler of std, which
        // needs its SA_SIGINFO and SA_ONSTACK flags back.
        let before = [current_action(SIGTERM), current_action(SIGSEGV)];
        let reporter = InterruptReporter::install(Arc::new(Counting::default())).unwrap();
        assert_ne!(current_action(SIGTERM).0, before[0].0);
        assert_ne!(current_action(SIGSEGV).0, before[1].0);
        drop(reporter);
        assert_eq!([current_action(SIGTERM), current_action(SIGSEGV)], before);
    }
}
