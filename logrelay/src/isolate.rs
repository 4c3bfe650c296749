//! Fault isolation for user-provided code.
//!
//! Listeners, serializers and teardown hooks run through [`isolate`], which swallows their panics.
//! The panic trap uses [`is_isolating`] to leave those panics alone, they are not uncaught.

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Runs `f`, returning `None` if it panicked.
pub(crate) fn isolate<T>(f: impl FnOnce() -> T) -> Option<T> {
    DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = catch_unwind(AssertUnwindSafe(f));
    DEPTH.with(|depth| depth.set(depth.get() - 1));
    result.ok()
}

/// Whether the current thread is inside [`isolate`].
pub(crate) fn is_isolating() -> bool {
    DEPTH.with(|depth| depth.get() > 0)
}

#[cfg(test)]
mod tests {
    use super::{is_isolating, isolate};

    #[test]
    fn swallows_panics_and_tracks_depth() {
        assert!(!is_isolating());
        assert_eq!(isolate(|| isolate(is_isolating)), Some(Some(true)));
        assert_eq!(isolate(|| -> u8 { panic!("listener bug") }), None);
        assert!(!is_isolating());
    }
}
