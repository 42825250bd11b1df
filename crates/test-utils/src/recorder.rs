use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Shared, ordered log of which tasks ran.
///
/// Clones share the same log, so a recorder can be handed to any number of
/// tasks and inspected after the flow is done.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.events.lock().unwrap().push(name.to_string());
    }

    /// A task that records `name` each time it runs.
    pub fn task<P: 'static>(&self, name: &str) -> impl Fn(&P) + Send + Sync + 'static + use<P> {
        let recorder = self.clone();
        let name = name.to_string();
        move |_: &P| recorder.record(&name)
    }

    /// A task that records `name` only after checking that every name in
    /// `before` has already been recorded; otherwise it records
    /// `"<name>:early"`.
    pub fn task_after<P: 'static>(
        &self,
        name: &str,
        before: &[&str],
    ) -> impl Fn(&P) + Send + Sync + 'static + use<P> {
        let recorder = self.clone();
        let name = name.to_string();
        let before: Vec<String> = before.iter().map(|s| s.to_string()).collect();
        move |_: &P| {
            let ready = before.iter().all(|b| recorder.count(b) > 0);
            if ready {
                recorder.record(&name);
            } else {
                recorder.record(&format!("{name}:early"));
            }
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.as_str() == name)
            .count()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .position(|e| e.as_str() == name)
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One-way latch that tasks can block on until the test releases it.
#[derive(Debug, Clone, Default)]
pub struct Latch {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    /// Block until released, giving up after five seconds so a broken test
    /// cannot hang the blocking pool forever.
    pub fn wait(&self) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap();
        let (guard, _timeout) = cvar
            .wait_timeout_while(guard, Duration::from_secs(5), |released| !*released)
            .unwrap();
        *guard
    }
}
