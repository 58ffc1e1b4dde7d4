use evrelay::{LogLevel, RelayLogger};
use serde_json::Value;
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedSink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    fn lines(&self) -> Vec<Value> {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer)
            .lines()
            .map(|line| serde_json::from_str(line).expect("log line should be JSON"))
            .collect()
    }
}

impl Write for SharedSink {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn records_serialize_as_json_lines() {
    let sink = SharedSink::default();
    let mut logger = RelayLogger::with_sink(LogLevel::Info, Box::new(sink.clone()));
    logger
        .log(LogLevel::Info, "evrelay::handler", "batch fully delivered")
        .expect("log should write");
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "INFO");
    assert_eq!(lines[0]["module"], "evrelay::handler");
    assert_eq!(lines[0]["message"], "batch fully delivered");
    assert!(lines[0]["ts_ms"].is_u64());
}

#[test]
fn entries_below_the_level_filter_are_dropped() {
    let sink = SharedSink::default();
    let mut logger = RelayLogger::with_sink(LogLevel::Info, Box::new(sink.clone()));
    logger.set_level(LogLevel::Warn);
    logger
        .log(LogLevel::Info, "evrelay", "suppressed")
        .expect("suppressed entries still succeed");
    logger
        .log(LogLevel::Warn, "evrelay", "visible")
        .expect("log should write");
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "WARN");
    assert_eq!(lines[0]["message"], "visible");
}

#[test]
fn level_ordering_matches_severity() {
    assert!(LogLevel::Debug < LogLevel::Info);
    assert!(LogLevel::Info < LogLevel::Warn);
    assert!(LogLevel::Warn < LogLevel::Error);
    assert_eq!(LogLevel::Error.to_string(), "ERROR");
}
