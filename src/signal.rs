//! Single-shot cancellation shared between the interrupt handler and
//! the blocking subprocess waits.
//!
//! One primary sequential workflow races against one background signal
//! watcher. The watcher flips the token exactly once on the first
//! interrupt; every blocking wait polls the token so an interrupt
//! unblocks the workflow instead of leaving it hung. Cancellation is
//! cooperative: children are never killed here, the terminal delivers
//! the interrupt to the whole foreground group and they exit on their
//! own terms.

use std::process::{Child, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often blocking waits poll for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared cancellation state: Running -> CancelRequested -> Done.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    done: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// True once an interrupt has been observed.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation. Returns true only for the first request.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    /// Mark the workflow complete; signals arriving afterwards are ignored.
    pub fn finish(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    /// True once the workflow has torn down.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Install the SIGINT/SIGTERM handler.
///
/// Must be called once at program startup. The first signal cancels the
/// token and logs; a second interrupt while already cancelled has no
/// additional effect.
pub fn install_handler(token: Arc<CancelToken>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if token.is_done() {
            return;
        }
        if token.cancel() {
            tracing::info!("interrupt received, shutting down");
        }
    })
}

/// Wait for a spawned child, polling the token so an interrupt unblocks
/// the wait.
///
/// Once cancelled, the child has seen the same interrupt; this blocks
/// until it winds down and reports its exit status. No timeout is
/// enforced.
pub fn wait_child(token: &CancelToken, child: &mut Child) -> std::io::Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if token.is_cancelled() {
            return child.wait();
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_initial_state() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(!token.is_done());
    }

    #[test]
    fn test_first_cancel_wins() {
        let token = CancelToken::new();
        assert!(token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_second_cancel_is_noop() {
        let token = CancelToken::new();
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_finish_marks_done() {
        let token = CancelToken::new();
        token.finish();
        assert!(token.is_done());
        // completion does not imply cancellation
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_token_shared_across_threads() {
        let token = CancelToken::new();
        let watcher = Arc::clone(&token);
        let handle = std::thread::spawn(move || watcher.cancel());
        assert!(handle.join().unwrap());
        assert!(token.is_cancelled());
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_child_returns_exit_status() {
        let token = CancelToken::new();
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let status = wait_child(&token, &mut child).unwrap();
        assert!(status.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_child_observes_cancellation() {
        let token = CancelToken::new();
        let mut child = std::process::Command::new("sleep").arg("0.3").spawn().unwrap();
        token.cancel();
        // cancelled wait still resolves once the child exits
        let status = wait_child(&token, &mut child).unwrap();
        assert!(status.success());
    }
}
