//! Shared, lockable sheets.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::trace;

use super::sheet::Sheet;
use crate::error::Result;
use crate::event::{EventBus, SheetEvent, SubscriptionId};

struct Shared {
    sheet: RwLock<Sheet>,
    bus: EventBus<SheetEvent>,
}

/// A sheet behind a read/write lock, plus its event bus.
///
/// Clones refer to the same sheet.
#[derive(Clone)]
pub struct SheetHandle {
    shared: Arc<Shared>,
}

impl SheetHandle {
    pub fn new(sheet: Sheet) -> SheetHandle {
        SheetHandle {
            shared: Arc::new(Shared {
                sheet: RwLock::new(sheet),
                bus: EventBus::new(),
            }),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Sheet> {
        self.shared.sheet.read()
    }

    /// Lock for writing. Events queued while the guard is alive are
    /// published after the lock is released.
    pub fn write(&self) -> SheetWriteGuard<'_> {
        trace!("sheet write lock");
        SheetWriteGuard {
            guard: self.shared.sheet.write(),
            bus: &self.shared.bus,
        }
    }

    /// Run `f` under the write lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Sheet) -> R) -> R {
        let mut guard = self.write();
        f(&mut guard)
    }

    pub fn name(&self) -> String {
        self.read().name().to_string()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SheetEvent) + Send + Sync + 'static,
    {
        self.shared.bus.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.bus.unsubscribe(id)
    }

    pub fn ptr_eq(&self, other: &SheetHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Replace this sheet's content with a copy of `source`.
    pub fn copy_from(&self, source: &SheetHandle) -> Result<()> {
        if self.ptr_eq(source) {
            return Ok(());
        }
        let source = source.read();
        self.write().copy_from(&source)
    }
}

impl fmt::Debug for SheetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetHandle")
            .field("subscribers", &self.shared.bus.subscriber_count())
            .finish_non_exhaustive()
    }
}

/// Write guard returned by [`SheetHandle::write`].
pub struct SheetWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, Sheet>,
    bus: &'a EventBus<SheetEvent>,
}

impl Deref for SheetWriteGuard<'_> {
    type Target = Sheet;

    fn deref(&self) -> &Sheet {
        &self.guard
    }
}

impl DerefMut for SheetWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Sheet {
        &mut self.guard
    }
}

impl Drop for SheetWriteGuard<'_> {
    fn drop(&mut self) {
        let events = self.guard.take_events();
        if events.is_empty() || self.bus.is_empty() {
            return;
        }
        let bus = self.bus;
        RwLockWriteGuard::unlocked(&mut self.guard, || {
            trace!(count = events.len(), "publishing sheet events");
            for event in &events {
                bus.publish(event);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::model::cell_ref::CellRef;
    use parking_lot::Mutex;

    #[test]
    fn test_events_published_after_release() {
        let handle = SheetHandle::new(Sheet::new("S"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (h, s) = (handle.clone(), Arc::clone(&seen));
        handle.subscribe(move |event| {
            // The lock must be free again when a subscriber runs.
            let value = h.read().display(0, 0);
            s.lock().push((event.kind(), value));
        });

        {
            let mut sheet = handle.write();
            sheet.set(0, 0, 42).unwrap();
            assert!(seen.lock().is_empty());
        }
        let seen = seen.lock();
        let kinds: Vec<&str> = seen.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, ["ROWS_ADDED", "COLUMNS_ADDED", "CELL_VALUE_CHANGED"]);
        assert!(seen.iter().all(|(_, v)| v == "42"));
    }

    #[test]
    fn test_subscriber_may_write_to_the_sheet() {
        let handle = SheetHandle::new(Sheet::new("S"));
        let h = handle.clone();
        handle.subscribe(move |event| {
            if let SheetEvent::CellValueChanged { cell, .. } = event
                && *cell == CellRef::new(0, 0)
            {
                h.update(|sheet| sheet.set(0, 1, "echo")).unwrap();
            }
        });
        handle.update(|sheet| sheet.set(0, 0, "ping")).unwrap();
        assert_eq!(handle.read().display(0, 1), "echo");
    }

    #[test]
    fn test_copy_between_handles() {
        let a = SheetHandle::new(Sheet::new("A"));
        let b = SheetHandle::new(Sheet::new("B"));
        a.update(|s| s.set(1, 1, "v")).unwrap();
        b.copy_from(&a).unwrap();
        a.copy_from(&a).unwrap();
        assert_eq!(b.read().display(1, 1), "v");
        assert_eq!(b.name(), "B");
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let handle = SheetHandle::new(Sheet::new("S"));
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        let id = handle.subscribe(move |_| *h.lock() += 1);
        handle.update(|s| s.set_zoom(2.0)).unwrap();
        assert!(handle.unsubscribe(id));
        handle.update(|s| s.set_zoom(3.0)).unwrap();
        assert_eq!(*hits.lock(), 1);
    }
}
