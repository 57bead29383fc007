//! Comment line logging. Every record ends up as a `c ` line on stdout so it
//! can be interleaved with the `s` and `v` lines of the solution.

use std::io::{self, Write};

use log::{info, Level, LevelFilter, Log, Metadata, Record};

const SECTION_WIDTH: usize = 78;

/// Writes log records as DIMACS comments.
pub struct CommentLogger;

static LOGGER: CommentLogger = CommentLogger;

/// Renders the message of a record, `c` alone for an empty message.
fn render(level: Level, message: &str) -> String {
    match (level, message.is_empty()) {
        (Level::Trace, _) => format!("c LOG {message}"),
        (_, true) => "c".to_string(),
        (_, false) => format!("c {message}"),
    }
}

impl Log for CommentLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = render(record.level(), &record.args().to_string());
        let mut stdout = io::stdout().lock();
        // Losing a comment line is not worth aborting the run.
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

/// Installs the logger. Calling it again only changes the level.
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

pub fn muted() -> bool {
    log::max_level() == LevelFilter::Off
}

fn section_line(name: &str) -> String {
    let mut line = format!("---- [ {name} ] ");
    while line.len() + 2 < SECTION_WIDTH {
        line.push('-');
    }
    line
}

/// Prints a section separator.
pub fn section(name: &str) {
    info!("");
    info!("{}", section_line(name));
    info!("");
}
