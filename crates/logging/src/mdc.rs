//! crates/logging/src/mdc.rs
//! Per-thread mapped diagnostic context.
//!
//! Entries written on a thread are visible to backends rendering records
//! emitted from that same thread and nowhere else. They persist until removed
//! or until the thread ends. While the thread's locals are being destroyed the
//! context reads as empty and writes are dropped.

use std::cell::RefCell;
use std::collections::BTreeMap;

thread_local! {
    static MDC: RefCell<BTreeMap<String, String>> = const { RefCell::new(BTreeMap::new()) };
}

/// Sets `key` to `value` for the calling thread, replacing any prior value.
pub fn put(key: impl Into<String>, value: impl Into<String>) {
    let (key, value) = (key.into(), value.into());
    let _ = MDC.try_with(|map| {
        map.borrow_mut().insert(key, value);
    });
}

/// Current value for `key` on the calling thread.
#[must_use]
pub fn get(key: &str) -> Option<String> {
    MDC.try_with(|map| map.borrow().get(key).cloned())
        .ok()
        .flatten()
}

/// Removes `key` from the calling thread's context, returning its value.
pub fn remove(key: &str) -> Option<String> {
    MDC.try_with(|map| map.borrow_mut().remove(key))
        .ok()
        .flatten()
}

/// Removes every entry for the calling thread.
pub fn clear() {
    let _ = MDC.try_with(|map| map.borrow_mut().clear());
}

/// Returns `true` when the calling thread has no entries.
#[must_use]
pub fn is_empty() -> bool {
    MDC.try_with(|map| map.borrow().is_empty()).unwrap_or(true)
}

/// Copy of the calling thread's entries, sorted by key.
#[must_use]
pub fn snapshot() -> BTreeMap<String, String> {
    MDC.try_with(|map| map.borrow().clone()).unwrap_or_default()
}

/// Runs `f` with a borrow of the calling thread's entries.
///
/// `f` must not call [`put`], [`remove`] or [`clear`].
pub fn with<R>(mut f: impl FnMut(&BTreeMap<String, String>) -> R) -> R {
    let result = MDC.try_with(|map| f(&map.borrow()));
    match result {
        Ok(value) => value,
        Err(_) => f(&BTreeMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn put_get_remove() {
        clear();
        put("x", "3");
        assert_eq!(get("x").as_deref(), Some("3"));
        put("x", "4");
        assert_eq!(get("x").as_deref(), Some("4"));
        assert_eq!(remove("x").as_deref(), Some("4"));
        assert!(get("x").is_none());
        assert!(is_empty());
    }

    #[test]
    fn snapshot_is_sorted() {
        clear();
        put("y", "foo");
        put("x", "3");
        let keys: Vec<String> = snapshot().into_keys().collect();
        assert_eq!(keys, ["x", "y"]);
        assert_eq!(with(BTreeMap::len), 2);
        clear();
    }

    #[test]
    fn access_during_thread_teardown_is_harmless() {
        struct Late;

        impl Drop for Late {
            fn drop(&mut self) {
                put("late", "1");
                assert!(get("missing").is_none());
                let _ = snapshot();
                let _ = with(BTreeMap::len);
                clear();
            }
        }

        thread_local! {
            static LATE: RefCell<Option<Late>> = const { RefCell::new(None) };
        }

        thread::spawn(|| {
            LATE.with(|slot| *slot.borrow_mut() = Some(Late));
            put("early", "0");
        })
        .join()
        .unwrap();
    }

    #[test]
    fn entries_are_thread_confined() {
        clear();
        put("request", "42");
        let seen = thread::spawn(|| get("request")).join().unwrap();
        assert!(seen.is_none());
        assert_eq!(get("request").as_deref(), Some("42"));
        clear();
    }
}
