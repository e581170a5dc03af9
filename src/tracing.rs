use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Writes every log line to stderr and, when configured, to a log file too.
#[derive(Clone)]
struct TeeWriter {
    file: Arc<Mutex<Option<std::fs::File>>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for TeeWriter {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = io::stderr().write(buf)?;
        if let Some(file) = &mut *self.file.lock().unwrap() {
            let _ = file.write_all(buf);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut *self.file.lock().unwrap() {
            let _ = file.flush();
        }
        Ok(())
    }
}

/// Install the global subscriber. `log::…!` call sites are bridged through
/// `tracing-log`; filtering follows `RUST_LOG` with an `info` default.
pub fn init(log_file: Option<&Path>) {
    let _ = tracing_log::LogTracer::init();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file = log_file.and_then(|path| {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let _ = std::fs::create_dir_all(parent);
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });
    let writer = TeeWriter {
        file: Arc::new(Mutex::new(file)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .try_init();
}
