use tracing::{error, info};

/// Fire-and-forget user notifications. Nothing is returned to the caller.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Prints to the terminal: successes on stdout, errors on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        println!("{}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }
}

/// Routes notifications into the log, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "khata::notify", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "khata::notify", "{}", message);
    }
}
