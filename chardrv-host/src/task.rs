use std::cell::RefCell;
use std::io;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use chardrv_os::TaskState;

use crate::os::lock;

thread_local! {
    static CURRENT: RefCell<Option<Arc<Control>>> = const { RefCell::new(None) };
}

struct Control {
    state: Mutex<TaskState>,
}

impl Control {
    fn set(&self, state: TaskState) {
        *lock(&self.state) = state;
    }

    fn get(&self) -> TaskState {
        *lock(&self.state)
    }
}

/// Marks the current task as blocked while `f` runs.
///
/// Threads not spawned through [`Task`] are not tracked.
pub(crate) fn blocking<R>(f: impl FnOnce() -> R) -> R {
    let current = CURRENT.with(|current| current.borrow().clone());
    if let Some(control) = &current {
        control.set(TaskState::Blocked);
    }
    let result = f();
    if let Some(control) = &current {
        control.set(TaskState::Running);
    }
    result
}

/// Named task backed by a std thread
///
/// The task reports `Ready` until its body starts, `Blocked` while it waits inside a
/// `HostOs` primitive or delay, and `Deleted` once the body returned or panicked.
/// `Suspended` is never reported.
pub struct Task {
    name: String,
    control: Arc<Control>,
    handle: JoinHandle<()>,
}

impl Task {
    pub fn spawn<F>(name: &str, body: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let control = Arc::new(Control {
            state: Mutex::new(TaskState::Ready),
        });
        let inner = control.clone();
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            inner.set(TaskState::Running);
            CURRENT.with(|current| *current.borrow_mut() = Some(inner.clone()));
            let _exit = Exit(inner);
            body();
        })?;
        debug!("Task {} spawned", name);

        Ok(Self {
            name: name.into(),
            control,
            handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> TaskState {
        self.control.get()
    }

    /// Waits for the task body to return.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

/// Reports deletion on every exit path of the task body
struct Exit(Arc<Control>);

impl Drop for Exit {
    fn drop(&mut self) {
        self.0.set(TaskState::Deleted);
        CURRENT.with(|current| current.borrow_mut().take());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use chardrv_core::Timeout;
    use chardrv_os::{Os, RawSemaphore};

    use super::*;
    use crate::HostOs;

    fn settle<F: Fn() -> bool>(done: F) -> bool {
        for _ in 0..500 {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn reports_blocked_while_waiting() {
        let semaphore = Arc::new(HostOs::create_semaphore(1, 0));
        let task = {
            let semaphore = semaphore.clone();
            Task::spawn("waiter", move || {
                semaphore.take(Timeout::Forever);
            })
            .unwrap()
        };

        assert_eq!(task.name(), "waiter");
        assert!(settle(|| task.state() == TaskState::Blocked));
        semaphore.give_from_isr();
        assert!(settle(|| task.state() == TaskState::Deleted));
        task.join().unwrap();
    }

    #[test]
    fn reports_running_between_waits() {
        let (tx, rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel::<()>();
        let task = Task::spawn("runner", move || {
            tx.send(()).unwrap();
            resume_rx.recv().unwrap();
        })
        .unwrap();

        rx.recv().unwrap();
        // Waiting on a std channel is not tracked
        assert_eq!(task.state(), TaskState::Running);
        resume_tx.send(()).unwrap();
        task.join().unwrap();
    }

    #[test]
    fn reports_deleted_after_panic() {
        let task = Task::spawn("panicker", || panic!("boom")).unwrap();
        assert!(settle(|| task.state() == TaskState::Deleted));
        assert!(task.join().is_err());
    }

    #[test]
    fn delay_blocks_task() {
        let task = Task::spawn("sleeper", || {
            HostOs::delay(embassy_time::Duration::from_millis(200));
        })
        .unwrap();
        assert!(settle(|| task.state() == TaskState::Blocked));
        task.join().unwrap();
    }
}
