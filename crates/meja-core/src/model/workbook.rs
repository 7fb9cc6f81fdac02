//! Workbooks: an ordered set of sheets sharing one style registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::handle::SheetHandle;
use super::sheet::Sheet;
use super::style::{CellStyle, StyleRegistry};
use crate::error::{MejaError, Result};
use crate::event::{EventBus, SubscriptionId, WorkbookEvent};
use crate::format::Locale;

/// A set of sheets with shared styles, a locale and an optional location.
///
/// Workbook events are published synchronously once the change is applied.
#[derive(Debug)]
pub struct Workbook {
    sheets: Vec<SheetHandle>,
    styles: Arc<StyleRegistry>,
    current: Option<usize>,
    location: Option<PathBuf>,
    locale: Locale,
    bus: EventBus<WorkbookEvent>,
}

impl Default for Workbook {
    fn default() -> Self {
        Workbook::new(Locale::default())
    }
}

impl Workbook {
    pub fn new(locale: Locale) -> Workbook {
        Workbook {
            sheets: Vec::new(),
            styles: Arc::new(StyleRegistry::new()),
            current: None,
            location: None,
            locale,
            bus: EventBus::new(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Change the locale of the workbook and all of its sheets.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
        for sheet in &self.sheets {
            sheet.write().set_locale(locale);
        }
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn set_location(&mut self, location: Option<PathBuf>) {
        if self.location == location {
            return;
        }
        let old = std::mem::replace(&mut self.location, location.clone());
        self.bus.publish(&WorkbookEvent::LocationChanged { old, new: location });
    }

    // ---- sheets ----

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheets(&self) -> impl Iterator<Item = &SheetHandle> {
        self.sheets.iter()
    }

    pub fn sheet(&self, index: usize) -> Result<&SheetHandle> {
        self.sheets.get(index).ok_or(MejaError::SheetIndexOutOfRange {
            index,
            count: self.sheets.len(),
        })
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.read().name() == name)
    }

    pub fn sheet_by_name(&self, name: &str) -> Result<&SheetHandle> {
        let index = self
            .sheet_index(name)
            .ok_or_else(|| MejaError::NoSuchSheet(name.to_string()))?;
        self.sheet(index)
    }

    /// Append a new empty sheet. The first sheet becomes the current one.
    pub fn create_sheet(&mut self, name: &str) -> Result<SheetHandle> {
        if self.sheet_index(name).is_some() {
            return Err(MejaError::DuplicateSheetName(name.to_string()));
        }
        let handle = SheetHandle::new(Sheet::with_styles(
            name,
            Arc::clone(&self.styles),
            self.locale,
        ));
        self.sheets.push(handle.clone());
        let index = self.sheets.len() - 1;
        debug!(sheet = name, index, "created sheet");
        self.bus.publish(&WorkbookEvent::SheetAdded {
            index,
            name: name.to_string(),
        });
        if self.current.is_none() {
            self.set_current_sheet(index)?;
        }
        Ok(handle)
    }

    pub fn remove_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(MejaError::SheetIndexOutOfRange {
                index,
                count: self.sheets.len(),
            });
        }
        let removed = self.sheets.remove(index);
        let name = removed.name();
        debug!(sheet = %name, index, "removed sheet");
        self.bus.publish(&WorkbookEvent::SheetRemoved { index, name });

        let old = self.current;
        let new = match old {
            _ if self.sheets.is_empty() => None,
            Some(cur) if cur > index => Some(cur - 1),
            Some(cur) => Some(cur.min(self.sheets.len() - 1)),
            None => None,
        };
        if new != old || old == Some(index) {
            self.current = new;
            self.bus.publish(&WorkbookEvent::ActiveSheetChanged { old, new });
        }
        Ok(())
    }

    pub fn remove_sheet_by_name(&mut self, name: &str) -> Result<()> {
        let index = self
            .sheet_index(name)
            .ok_or_else(|| MejaError::NoSuchSheet(name.to_string()))?;
        self.remove_sheet(index)
    }

    pub fn current_sheet_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_sheet(&self) -> Option<&SheetHandle> {
        self.current.and_then(|i| self.sheets.get(i))
    }

    pub fn set_current_sheet(&mut self, index: usize) -> Result<()> {
        self.sheet(index)?;
        if self.current != Some(index) {
            let old = self.current.replace(index);
            self.bus.publish(&WorkbookEvent::ActiveSheetChanged {
                old,
                new: Some(index),
            });
        }
        Ok(())
    }

    // ---- styles ----

    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.styles
    }

    pub fn default_cell_style(&self) -> Arc<CellStyle> {
        self.styles.default_style()
    }

    /// Look up a style by name, creating it from defaults when unknown.
    pub fn cell_style(&self, name: &str) -> Arc<CellStyle> {
        self.styles.get(name)
    }

    pub fn has_cell_style(&self, name: &str) -> bool {
        self.styles.contains(name)
    }

    pub fn cell_style_names(&self) -> Vec<String> {
        self.styles.names()
    }

    pub fn copy_cell_style(&self, name: &str, style: &CellStyle) {
        self.styles.copy_style(name, style);
    }

    pub fn update_cell_style<R>(&self, name: &str, f: impl FnOnce(&mut CellStyle) -> R) -> R {
        self.styles.update(name, f)
    }

    /// Copy styles and then every sheet of `other` into this workbook.
    /// Sheets that already exist by name are overwritten.
    pub fn copy_from(&mut self, other: &Workbook) -> Result<()> {
        self.styles.copy_from(&other.styles);
        for source in other.sheets() {
            let name = source.name();
            let target = match self.sheet_index(&name) {
                Some(index) => self.sheet(index)?.clone(),
                None => self.create_sheet(&name)?,
            };
            target.copy_from(source)?;
        }
        Ok(())
    }

    // ---- events ----

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&WorkbookEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }
}
