use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Level;

static LOG_FILE: OnceLock<File> = OnceLock::new();
static TUI_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Mark whether the terminal UI owns the screen. While it does, log lines
/// without a log file are dropped instead of corrupting the alternate screen.
pub fn set_tui_active(active: bool) {
    TUI_ACTIVE.store(active, Ordering::SeqCst);
}

pub struct DelegatingWriter {
    inner: DelegatingInner,
}

enum DelegatingInner {
    File(&'static File),
    Stderr(io::Stderr),
    Sink(io::Sink),
}

impl DelegatingWriter {
    fn new() -> Self {
        let inner = if let Some(file) = LOG_FILE.get() {
            DelegatingInner::File(file)
        } else if TUI_ACTIVE.load(Ordering::SeqCst) {
            DelegatingInner::Sink(io::sink())
        } else {
            DelegatingInner::Stderr(io::stderr())
        };
        DelegatingWriter { inner }
    }
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            DelegatingInner::File(f) => f.write(buf),
            DelegatingInner::Stderr(s) => s.write(buf),
            DelegatingInner::Sink(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            DelegatingInner::File(f) => f.flush(),
            DelegatingInner::Stderr(s) => s.flush(),
            DelegatingInner::Sink(s) => s.flush(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubscriberMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new()
    }
}

/// Initialize the tracing subscriber. Output goes to `log_file` when given
/// (appending), otherwise to stderr until the terminal UI takes over. Safe
/// to call multiple times; only the first log file and subscriber stick.
pub fn init_default(log_file: Option<&Path>) -> io::Result<()> {
    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let _ = LOG_FILE.set(file);
    }
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(SubscriberMakeWriter)
        .with_target(false)
        .with_thread_names(false)
        .with_ansi(LOG_FILE.get().is_none())
        .try_init();
    Ok(())
}
