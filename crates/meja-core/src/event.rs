//! Publish/subscribe notification for sheets and workbooks.
//!
//! Subscribers are called synchronously, in subscription order, on the
//! thread that completed the mutation. No lock of the model is held while
//! a callback runs.

use dashmap::DashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::model::{CellRef, CellValue};

/// Something a bus can carry.
pub trait Event: fmt::Debug {
    /// Stable upper-case name of the event kind, e.g. `ZOOM_CHANGED`.
    fn kind(&self) -> &'static str;
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

pub struct EventBus<E> {
    next_id: AtomicU64,
    subscribers: DashMap<u64, Callback<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        EventBus {
            next_id: AtomicU64::new(0),
            subscribers: DashMap::new(),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, Arc::new(callback));
        SubscriptionId(id)
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id.0).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn publish(&self, event: &E) {
        trace!(kind = event.kind(), ?event, "publish");
        // Snapshot first so callbacks may (un)subscribe.
        let mut targets: Vec<(u64, Callback<E>)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        targets.sort_unstable_by_key(|(id, _)| *id);
        for (_, callback) in targets {
            callback(event);
        }
    }
}

/// Changes to a sheet.
#[derive(Clone, Debug, PartialEq)]
pub enum SheetEvent {
    ZoomChanged { old: f32, new: f32 },
    /// Column widths, row heights, merges or the sheet content were rearranged.
    LayoutChanged,
    SplitChanged {
        old: (usize, usize),
        new: (usize, usize),
    },
    ActiveCellChanged {
        old: Option<CellRef>,
        new: Option<CellRef>,
    },
    CellValueChanged {
        cell: CellRef,
        old: CellValue,
        new: CellValue,
    },
    CellStyleChanged {
        cell: CellRef,
        old: String,
        new: String,
    },
    /// Rows `first..last` were created.
    RowsAdded { first: usize, last: usize },
    /// Columns `first..last` were created.
    ColumnsAdded { first: usize, last: usize },
}

impl Event for SheetEvent {
    fn kind(&self) -> &'static str {
        match self {
            SheetEvent::ZoomChanged { .. } => "ZOOM_CHANGED",
            SheetEvent::LayoutChanged => "LAYOUT_CHANGED",
            SheetEvent::SplitChanged { .. } => "SPLIT_CHANGED",
            SheetEvent::ActiveCellChanged { .. } => "ACTIVE_CELL_CHANGED",
            SheetEvent::CellValueChanged { .. } => "CELL_VALUE_CHANGED",
            SheetEvent::CellStyleChanged { .. } => "CELL_STYLE_CHANGED",
            SheetEvent::RowsAdded { .. } => "ROWS_ADDED",
            SheetEvent::ColumnsAdded { .. } => "COLUMNS_ADDED",
        }
    }
}

/// Changes to a workbook.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkbookEvent {
    ActiveSheetChanged {
        old: Option<usize>,
        new: Option<usize>,
    },
    SheetAdded { index: usize, name: String },
    SheetRemoved { index: usize, name: String },
    LocationChanged {
        old: Option<PathBuf>,
        new: Option<PathBuf>,
    },
}

impl Event for WorkbookEvent {
    fn kind(&self) -> &'static str {
        match self {
            WorkbookEvent::ActiveSheetChanged { .. } => "ACTIVE_SHEET_CHANGED",
            WorkbookEvent::SheetAdded { .. } => "SHEET_ADDED",
            WorkbookEvent::SheetRemoved { .. } => "SHEET_REMOVED",
            WorkbookEvent::LocationChanged { .. } => "LOCATION_CHANGED",
        }
    }
}
