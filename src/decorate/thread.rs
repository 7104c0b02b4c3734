use std::{
    sync::{Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::Instant,
};

use tracing::debug;

use crate::response::{ErrorInfo, Response};

static GLOBAL_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` while holding a process-wide lock.
///
/// The lock is not reentrant: calling `thread_safe` from inside `f`
/// deadlocks.
pub fn thread_safe<T, F: FnOnce() -> T>(f: F) -> T {
    let _guard = GLOBAL_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    f()
}

/// A background thread whose outcome is collected as a [`Response`].
#[derive(Debug)]
pub struct TaskHandle<T> {
    handle: JoinHandle<Response<T>>,
    started: Instant,
}

impl<T> TaskHandle<T> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the thread. Panics inside it show up as a failed response.
    pub fn join(self) -> Response<T> {
        match self.handle.join() {
            Ok(response) => response,
            Err(payload) => Response::from_outcome(Err(ErrorInfo::from_panic(payload.as_ref())), self.started.elapsed()),
        }
    }
}

pub fn spawn<T, F>(f: F) -> TaskHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let started = Instant::now();
    let handle = thread::spawn(move || {
        let response = Response::call(f);
        debug!(success = response.success(), elapsed = response.execution_time(), "task finished");
        response
    });
    TaskHandle { handle, started }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, time::Duration};

    #[test]
    fn lock_serializes_updates() {
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let max_inside = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    thread_safe(|| {
                        use std::sync::atomic::Ordering::SeqCst;
                        let inside = counter.fetch_add(1, SeqCst) + 1;
                        max_inside.fetch_max(inside, SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        counter.fetch_sub(1, SeqCst);
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_inside.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn spawned_task_result() {
        let task = spawn(|| (1..=10).sum::<i32>());
        let response = task.join();
        assert!(response.success());
        assert_eq!(response.result(), Some(&55));
    }

    #[test]
    fn spawned_task_panic_is_captured() {
        let response = spawn(|| -> u8 { panic!("worker died") }).join();
        assert!(!response.success());
        assert_eq!(response.error_message(), Some("worker died"));
        assert_eq!(response.error_name(), Some("panic"));
    }
}
