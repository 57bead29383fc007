use std::{
    fs::{self, File},
    io::{self, Read, Stdin},
    path::Path,
    process::{Child, ChildStdout, Command, Stdio},
};

use log::{debug, info};

use crate::error::{Error, Result};

/// Label used in messages when reading from standard input.
pub const STDIN: &str = "<stdin>";

/// Compressed inputs are piped through an external tool picked by suffix.
const DECOMPRESSORS: [(&str, &str); 3] = [(".gz", "gzip"), (".bz2", "bzip2"), (".xz", "xz")];

enum Source {
    Stdin(Stdin),
    File(File),
    Pipe(Child, ChildStdout),
}

/// The DIMACS input, owning the underlying file, pipe or stdin handle.
pub struct Input {
    path: String,
    source: Source,
}

fn readable(path: &Path) -> bool {
    fs::metadata(path).is_ok() && File::open(path).is_ok()
}

pub fn decompressor(path: &str) -> Option<&'static str> {
    DECOMPRESSORS
        .iter()
        .find(|(suffix, _)| path.ends_with(suffix))
        .map(|&(_, program)| program)
}

impl Input {
    pub fn stdin() -> Self {
        Self {
            path: STDIN.to_string(),
            source: Source::Stdin(io::stdin()),
        }
    }

    /// Opens `path`, starting a decompression process for compressed files.
    pub fn open(path: &str) -> Result<Self> {
        if !readable(Path::new(path)) {
            return Err(Error::Access(path.to_string()));
        }
        let open_error = |source: io::Error| Error::Open {
            path: path.to_string(),
            source,
        };

        let source = match decompressor(path) {
            Some(program) => {
                debug!("decompressing '{path}' with '{program} -c -d'");
                let mut child = Command::new(program)
                    .args(["-c", "-d"])
                    .arg(path)
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .spawn()
                    .map_err(open_error)?;
                match child.stdout.take() {
                    Some(stdout) => Source::Pipe(child, stdout),
                    None => {
                        return Err(open_error(io::Error::new(
                            io::ErrorKind::BrokenPipe,
                            "decompressor has no output pipe",
                        )))
                    }
                }
            }
            None => Source::File(File::open(path).map_err(open_error)?),
        };

        Ok(Self {
            path: path.to_string(),
            source,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Releases the input. Only called after a successful parse.
    pub fn close(self) -> Result<()> {
        match self.source {
            Source::Stdin(_) => (),
            Source::File(file) => drop(file),
            Source::Pipe(mut child, stdout) => {
                drop(stdout);
                let status = child.wait().map_err(|source| Error::Read {
                    path: self.path.clone(),
                    source,
                })?;
                debug!("decompressor exited with {status}");
            }
        }
        info!("closed '{}'", self.path);
        Ok(())
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.source {
            Source::Stdin(stdin) => stdin.read(buf),
            Source::File(file) => file.read(buf),
            Source::Pipe(_, stdout) => stdout.read(buf),
        }
    }
}
