use chrono::Local;
use std::io::{self, Write};

/// Receives one human-readable status line per bookmark outcome.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Prints timestamped status lines to stdout.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        let time = Local::now().format("%H:%M:%S");
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "[{time}] {message}");
    }
}
