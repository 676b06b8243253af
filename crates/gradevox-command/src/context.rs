//! Per-session context passed into the parser and resolver.
//!
//! Holds the recently touched students (most recent first) and the column
//! the teacher last graded, so "and Jon 85" keeps writing to the same column.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use gradevox_core::RosterRow;

/// A student recently written to by an applied command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentStudent {
    pub row_index: usize,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    recent: VecDeque<RecentStudent>,
    capacity: usize,
    active_column: Option<String>,
}

impl SessionContext {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            active_column: None,
        }
    }

    /// Move `row` to the front of the recent list, trimming the oldest entry
    /// when over capacity.
    pub fn touch(&mut self, row: &RosterRow) {
        self.recent.retain(|r| r.row_index != row.index);
        self.recent.push_front(RecentStudent {
            row_index: row.index,
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
        });
        while self.recent.len() > self.capacity {
            self.recent.pop_back();
        }
    }

    pub fn most_recent(&self) -> Option<&RecentStudent> {
        self.recent.front()
    }

    pub fn recent(&self) -> impl Iterator<Item = &RecentStudent> {
        self.recent.iter()
    }

    /// Drop a row that no longer exists, shifting the indices of rows after
    /// it down by one.
    pub fn forget_row(&mut self, row_index: usize) {
        self.recent.retain(|r| r.row_index != row_index);
        for r in self.recent.iter_mut() {
            if r.row_index > row_index {
                r.row_index -= 1;
            }
        }
    }

    /// Recent entries no longer line up with row positions after a sort.
    pub fn clear_recent(&mut self) {
        self.recent.clear();
    }

    pub fn set_active_column(&mut self, column: impl Into<String>) {
        self.active_column = Some(column.into());
    }

    pub fn active_column(&self) -> Option<&str> {
        self.active_column.as_deref()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(5)
    }
}
