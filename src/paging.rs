use crate::error::{AppError, AppResult};
use serde::Serialize;

/// In-memory "load more" window over a list.
///
/// The window starts at `min(initial, len)` items and grows by `step` on each
/// `load_more` until it covers the whole list. Replacing the data resets it.
#[derive(Debug, Clone)]
pub struct Pager<T> {
    data: Vec<T>,
    initial: usize,
    step: usize,
    displayed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub displayed_count: usize,
    pub total: usize,
    pub has_more: bool,
    pub initial_items_per_page: usize,
    pub items_per_page: usize,
}

impl<T> Pager<T> {
    pub fn new(data: Vec<T>, initial_items_per_page: usize, items_per_page: usize) -> AppResult<Self> {
        if initial_items_per_page == 0 || items_per_page == 0 {
            return Err(AppError::InvalidPageSize);
        }
        let displayed = initial_items_per_page.min(data.len());
        Ok(Self {
            data,
            initial: initial_items_per_page,
            step: items_per_page,
            displayed,
        })
    }

    pub fn load_more(&mut self) {
        self.displayed = self.displayed.saturating_add(self.step).min(self.data.len());
    }

    pub fn has_more(&self) -> bool {
        self.displayed < self.data.len()
    }

    pub fn displayed(&self) -> &[T] {
        &self.data[..self.displayed]
    }

    pub fn displayed_count(&self) -> usize {
        self.displayed
    }

    /// Swap in a new source list. The window goes back to its initial size,
    /// clamped to the new length.
    pub fn set_data(&mut self, data: Vec<T>) {
        self.data = data;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.displayed = self.initial.min(self.data.len());
    }

    pub fn window(&self) -> PageWindow {
        PageWindow {
            displayed_count: self.displayed,
            total: self.data.len(),
            has_more: self.has_more(),
            initial_items_per_page: self.initial,
            items_per_page: self.step,
        }
    }
}
