//! Verifies the textual logging contract external audit tooling greps for:
//! "Error detector reset", "Error added: ...", "Loop detected ...".

use std::io;
use std::sync::{Arc, Mutex};

use swe_recover::{ErrorDetector, ErrorEvent, ErrorKind};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn with_captured_logs(f: impl FnOnce()) -> String {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(capture.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    capture.contents()
}

#[test]
fn test_reset_logs_marker() {
    let logs = with_captured_logs(|| {
        let mut detector = ErrorDetector::new();
        detector.reset();
    });
    assert!(logs.contains("Error detector reset"), "logs were: {}", logs);
}

#[test]
fn test_reset_for_instance_logs_id() {
    let logs = with_captured_logs(|| {
        let mut detector = ErrorDetector::new();
        detector.reset_for_instance("django__django-12345");
    });
    assert!(logs.contains("Error detector reset for instance django__django-12345"));
}

#[test]
fn test_record_logs_kind_and_location() {
    let logs = with_captured_logs(|| {
        let mut detector = ErrorDetector::new();
        detector.reset();
        detector.record(
            ErrorEvent::new(ErrorKind::Syntax, "SyntaxError").with_location("main.py", 42),
        );
        detector.record(ErrorEvent::new(ErrorKind::Import, "No module named x"));
    });
    assert!(logs.contains("Error added: syntax at main.py:42"));
    // No location: the suffix is omitted entirely.
    assert!(logs.contains("Error added: import\n"));
}

#[test]
fn test_loop_detection_logs_reason() {
    let logs = with_captured_logs(|| {
        let mut detector = ErrorDetector::new();
        detector.reset();
        for line in 1..=3 {
            detector.record(
                ErrorEvent::new(ErrorKind::Indentation, "IndentationError")
                    .with_location("views.py", line),
            );
        }
    });
    assert!(logs.contains("Loop detected: Repetitive indentation errors detected"));
}
