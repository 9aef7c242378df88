use {
    crate::config::{LogFormat, Settings},
    rand::prelude::*,
    slog::{o, Drain},
};

pub fn create_logger(cfg: &Settings) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = match cfg.other.log_format {
        LogFormat::Lines => {
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            slog_async::Async::new(drain).build().fuse()
        }
        LogFormat::Compact => {
            let drain = slog_term::CompactFormat::new(decorator).build().fuse();
            slog_async::Async::new(drain).build().fuse()
        }
    };
    let drain = drain.filter_level(cfg.log_level()).fuse();
    let start_id: u64 = random();
    let log = slog::Logger::root(
        drain,
        o!(
        "start-id"=>start_id
        ),
    );
    return log;
}

#[cfg(test)]
pub(crate) fn discard() -> slog::Logger {
    return slog::Logger::root(slog::Discard, o!());
}

/// In-memory log sink for tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuf {
    pub(crate) fn text(&self) -> String {
        return String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned();
    }
}

#[cfg(test)]
impl std::io::Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        return Ok(data.len());
    }

    fn flush(&mut self) -> std::io::Result<()> {
        return Ok(());
    }
}

/// Logger filtered the way `create_logger` filters, writing plain text into the returned buffer.
#[cfg(test)]
pub(crate) fn capture(cfg: &Settings) -> (slog::Logger, SharedBuf) {
    let buf = SharedBuf::default();
    let decorator = slog_term::PlainSyncDecorator::new(buf.clone());
    let drain = slog_term::FullFormat::new(decorator)
        .build()
        .fuse()
        .filter_level(cfg.log_level())
        .fuse();
    return (slog::Logger::root(drain, o!()), buf);
}
