//! Route `tracing` events from the core crate to the browser console
//!
//! The core reports skipped balances, malformed drafts, ignored stored themes
//! and config fallbacks through `tracing`. Without a subscriber those events
//! vanish in the browser, so `init` installs a `tracing-subscriber` formatter
//! whose writer hands each formatted line to `console.*` by level.

use std::io;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Which console method an event goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleSink {
    Debug,
    Log,
    Warn,
    Error,
}

impl ConsoleSink {
    pub fn for_level(level: &Level) -> Self {
        match *level {
            Level::ERROR => ConsoleSink::Error,
            Level::WARN => ConsoleSink::Warn,
            Level::INFO => ConsoleSink::Log,
            _ => ConsoleSink::Debug,
        }
    }

    fn emit(self, line: &str) {
        let line: wasm_bindgen::JsValue = line.into();
        match self {
            ConsoleSink::Debug => web_sys::console::debug_1(&line),
            ConsoleSink::Log => web_sys::console::log_1(&line),
            ConsoleSink::Warn => web_sys::console::warn_1(&line),
            ConsoleSink::Error => web_sys::console::error_1(&line),
        }
    }
}

/// Formatted event text without the trailing newline; `None` when empty
pub fn finish_line(buf: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(buf);
    let line = text.trim_end();
    (!line.is_empty()).then(|| line.to_string())
}

/// Buffers one formatted event and prints it when dropped
pub struct ConsoleWriter {
    sink: ConsoleSink,
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if let Some(line) = finish_line(&self.buf) {
            self.sink.emit(&line);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Console;

impl<'a> MakeWriter<'a> for Console {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            sink: ConsoleSink::Log,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            sink: ConsoleSink::for_level(meta.level()),
            buf: Vec::new(),
        }
    }
}

/// Install the console subscriber; `false` if one was already set
pub fn init(max_level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_writer(Console)
        .with_max_level(max_level)
        .with_ansi(false)
        .without_time()
        .try_init()
        .is_ok()
}
