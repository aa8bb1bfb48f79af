use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_cli_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("subtitle_clean=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("subtitle_clean=info"))
    };

    // try_init: tests and the CLI may both install a subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

pub fn init_json_logger() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("subtitle_clean=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .json(),
        )
        .try_init();
}

/// Routes log lines to the devtools console. Timestamps are dropped because
/// `std::time` is unavailable on `wasm32-unknown-unknown`.
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub fn init_console_logger() {
    let filter = EnvFilter::new("subtitle_clean=info");

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .without_time()
                .with_writer(ConsoleWriter::default)
                .compact(),
        )
        .try_init();
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
#[derive(Default)]
struct ConsoleWriter {
    buffer: Vec<u8>,
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
impl std::io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&self.buffer);
            web_sys::console::log_1(&line.trim_end().into());
            self.buffer.clear();
        }
        Ok(())
    }
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}
