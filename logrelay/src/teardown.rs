//! Work that has to happen synchronously before the process goes away.
//!
//! Reporters register a hook with their hub's [`Teardown`] registry that submits whatever is still buffered using
//! [`Delivery::Blocking`][crate::submit::Delivery::Blocking].
//! The application decides when teardown happens: explicitly through [`Hub::teardown`][crate::Hub::teardown], at
//! the end of a scope through a [`TeardownGuard`], or on a termination signal through [`exit_on_signals`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::hub::Hub;
use crate::isolate::isolate;

type Hook = Arc<dyn Fn() + Send + Sync>;

/// An ordered registry of teardown hooks.
///
/// Running the registry runs every hook, in registration order, on the calling thread.
/// Running it again runs the hooks again, so hooks must tolerate repeated calls.
#[derive(Default)]
pub struct Teardown {
    hooks: Mutex<Vec<Hook>>,
}

impl Teardown {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hook` to run at teardown.
    pub fn register(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    /// Runs all hooks.
    ///
    /// A panicking hook does not keep the others from running.
    pub fn run(&self) {
        // Hooks may register further hooks or log, so the lock is not held while they run.
        let hooks = self
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        tracing::debug!(hooks = hooks.len(), "running teardown hooks");

        for hook in hooks {
            if isolate(&*hook).is_none() {
                tracing::debug!("teardown hook panicked");
            }
        }
    }

    /// Returns the number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("hooks", &self.len())
            .finish()
    }
}

/// Runs the teardown of a hub when dropped.
///
/// ```rust
/// let hub = logrelay::Hub::new();
/// let _teardown = hub.teardown_guard();
///
/// // ... set up reporters and run the application ...
/// ```
#[derive(Debug)]
#[must_use = "teardown runs when the guard is dropped"]
pub struct TeardownGuard {
    hub: Hub,
}

impl TeardownGuard {
    pub(crate) fn new(hub: Hub) -> Self {
        Self { hub }
    }
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        self.hub.teardown();
    }
}

/// Runs the teardown of `hub` when one of `signals` arrives, then exits the process with `128 + signal`.
///
/// The signals are handled on a dedicated thread, so teardown hooks run in a normal context and may block.
///
/// ```rust,no_run
/// use signal_hook::consts::{SIGINT, SIGTERM};
///
/// let hub = logrelay::Hub::new();
/// logrelay::teardown::exit_on_signals(&hub, &[SIGINT, SIGTERM]).unwrap();
/// ```
#[cfg(unix)]
pub fn exit_on_signals(
    hub: &Hub,
    signals: &[std::ffi::c_int],
) -> std::io::Result<std::thread::JoinHandle<()>> {
    let mut signals = signal_hook::iterator::Signals::new(signals)?;
    let hub = hub.downgrade();

    std::thread::Builder::new()
        .name("logrelay-teardown".into())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                tracing::debug!(signal, "termination signal received");
                if let Some(hub) = hub.upgrade() {
                    hub.teardown();
                }
                std::process::exit(128 + signal);
            }
        })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::Teardown;

    #[test]
    fn hooks_run_in_order_and_survive_panics() {
        let teardown = Teardown::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        teardown.register({
            let order = order.clone();
            move || order.lock().unwrap().push("first")
        });
        teardown.register(|| panic!("hook failure"));
        teardown.register({
            let order = order.clone();
            move || order.lock().unwrap().push("third")
        });

        teardown.run();

        assert_eq!(*order.lock().unwrap(), ["first", "third"]);
    }

    #[test]
    fn hooks_run_on_every_call() {
        let teardown = Teardown::new();
        let calls = Arc::new(AtomicUsize::new(0));

        teardown.register({
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::Relaxed);
            }
        });

        teardown.run();
        teardown.run();

        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}
