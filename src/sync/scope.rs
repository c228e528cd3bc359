use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;

/// Cancellation flag tied to a screen's active lifetime
#[derive(Debug, Clone)]
pub struct LifetimeToken(Arc<AtomicBool>);

impl LifetimeToken {
    fn new() -> Self {
        LifetimeToken(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs background work whose results belong to one screen.
///
/// Each job runs on its own thread. Its result reaches [`Scope::drain`]
/// only if the scope is still live when the job finishes; results that
/// complete after [`Scope::close`] (or drop) are discarded. The job itself
/// is not interrupted.
pub struct Scope<T> {
    token: LifetimeToken,
    tx: mpsc::Sender<T>,
    rx: mpsc::Receiver<T>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> Scope<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Scope {
            token: LifetimeToken::new(),
            tx,
            rx,
            workers: Vec::new(),
        }
    }

    pub fn token(&self) -> LifetimeToken {
        self.token.clone()
    }

    pub fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.workers.retain(|h| !h.is_finished());
        let token = self.token.clone();
        let tx = self.tx.clone();
        self.workers.push(std::thread::spawn(move || {
            let out = job();
            if token.is_live() {
                let _ = tx.send(out);
            } else {
                tracing::debug!("discarding result that finished after its screen closed");
            }
        }));
    }

    /// Results delivered so far, oldest first. Empty once closed.
    pub fn drain(&self) -> Vec<T> {
        if !self.token.is_live() {
            return Vec::new();
        }
        self.rx.try_iter().collect()
    }

    /// Jobs started and not yet finished
    pub fn pending(&self) -> usize {
        self.workers.iter().filter(|h| !h.is_finished()).count()
    }

    /// Block until every job started so far has finished
    pub fn wait_idle(&mut self) {
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("background job panicked");
            }
        }
    }

    pub fn close(&mut self) {
        self.token.cancel();
    }

    pub fn is_live(&self) -> bool {
        self.token.is_live()
    }
}

impl<T: Send + 'static> Default for Scope<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Scope<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
