//! Line-counted log file rotation.
//!
//! The active file is `path`. Once it holds `max_lines` lines it is
//! compressed to `path.1.gz`, older archives shift up by one, and anything
//! past `path.9.gz` is dropped. An existing file under the limit is appended
//! to on open.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use flate2::{write::GzEncoder, Compression};
use tracing_subscriber::fmt::MakeWriter;

/// Number of compressed archives kept next to the active file.
pub const ARCHIVES: usize = 9;

/// A cloneable, thread-safe writer that rotates its file by line count.
#[derive(Debug, Clone)]
pub struct RotateWriter {
    inner: Arc<Mutex<RotateState>>,
}

#[derive(Debug)]
struct RotateState {
    path: PathBuf,
    max_lines: usize,
    lines: usize,
    file: File,
}

impl RotateWriter {
    /// Open (or create) `path`, rotating first if it is already full.
    pub fn open(path: impl Into<PathBuf>, max_lines: usize) -> io::Result<Self> {
        let path = path.into();
        let max_lines = max_lines.max(1);
        let lines = count_lines(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut state = RotateState {
            path,
            max_lines,
            lines,
            file,
        };
        if state.lines >= state.max_lines {
            state.rotate()?;
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
        })
    }
}

impl RotateState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        match fs::remove_file(archive_path(&self.path, ARCHIVES)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }
        for n in (1..ARCHIVES).rev() {
            let from = archive_path(&self.path, n);
            if from.exists() {
                fs::rename(&from, archive_path(&self.path, n + 1))?;
            }
        }

        compress(&self.path, &archive_path(&self.path, 1))?;

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.lines = 0;
        Ok(())
    }
}

impl Write for RotateWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if state.lines >= state.max_lines {
            // Logging from inside the log writer would recurse.
            if let Err(e) = state.rotate() {
                eprintln!("log rotation of {:?} failed: {}", state.path, e);
            }
        }

        state.file.write_all(buf)?;
        state.lines += buf.iter().filter(|&&b| b == b'\n').count();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .file
            .flush()
    }
}

impl<'a> MakeWriter<'a> for RotateWriter {
    type Writer = RotateWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// `path.N.gz`
pub fn archive_path(path: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}.gz", n));
    PathBuf::from(name)
}

fn count_lines(path: &Path) -> io::Result<usize> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut reader = BufReader::new(file);
    let mut buf = [0u8; 8192];
    let mut lines = 0;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(lines);
        }
        lines += buf[..n].iter().filter(|&&b| b == b'\n').count();
    }
}

fn compress(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = File::open(src)?;
    let mut encoder = GzEncoder::new(File::create(dst)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()
}
