//! Edit sink: where validated edits leave the core.
//!
//! The host owns the roster. The session hands it [`GradeEdit`]s and roster
//! operations through [`EditSink`] and reads a fresh [`Roster`] snapshot for
//! the next utterance. [`InMemoryRoster`] is the sink used by the command-line
//! host and the tests.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use gradevox_core::{GradeEdit, GradevoxError, Result, Roster, RosterRow};

use crate::types::{SortDirection, SortField};

/// A row to append to the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub student_id: Option<String>,
}

pub trait EditSink {
    fn apply_grade(&mut self, edit: &GradeEdit) -> Result<()>;

    /// Apply several edits. Sinks with their own history should record the
    /// batch as one step.
    fn apply_batch(&mut self, edits: &[GradeEdit]) -> Result<()> {
        for edit in edits {
            self.apply_grade(edit)?;
        }
        Ok(())
    }

    /// Append a row and return its index.
    fn add_row(&mut self, student: &NewStudent) -> Result<usize>;

    fn delete_row(&mut self, row_index: usize) -> Result<()>;

    fn sort_rows(&mut self, field: &SortField, direction: SortDirection) -> Result<()>;

    /// Returns false when there is nothing to undo.
    fn undo(&mut self) -> Result<bool>;

    /// Returns false when there is nothing to redo.
    fn redo(&mut self) -> Result<bool>;
}

// =============================================================================
// In-memory roster
// =============================================================================

/// A roster held in memory with snapshot-based undo and redo.
///
/// Row indices always equal row positions; they are renumbered after a
/// delete or sort.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    roster: Roster,
    undo_stack: Vec<Roster>,
    redo_stack: Vec<Roster>,
}

impl InMemoryRoster {
    pub fn new(mut roster: Roster) -> Self {
        renumber(&mut roster.rows);
        Self {
            roster,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn into_roster(self) -> Roster {
        self.roster
    }

    fn checkpoint(&mut self) {
        self.undo_stack.push(self.roster.clone());
        self.redo_stack.clear();
    }

    fn validate(&self, edit: &GradeEdit) -> Result<()> {
        if !self.roster.has_column(&edit.column) {
            return Err(GradevoxError::UnknownColumn(edit.column.clone()));
        }
        if edit.row_index >= self.roster.len() {
            return Err(GradevoxError::RowOutOfRange {
                index: edit.row_index,
                len: self.roster.len(),
            });
        }
        Ok(())
    }

    fn write(&mut self, edit: &GradeEdit) {
        if let Some(row) = self.roster.rows.get_mut(edit.row_index) {
            row.fields.insert(edit.column.clone(), edit.value.clone());
        }
    }
}

impl EditSink for InMemoryRoster {
    fn apply_grade(&mut self, edit: &GradeEdit) -> Result<()> {
        self.validate(edit)?;
        self.checkpoint();
        self.write(edit);
        tracing::debug!(row_index = edit.row_index, column = %edit.column, "Cell written");
        Ok(())
    }

    fn apply_batch(&mut self, edits: &[GradeEdit]) -> Result<()> {
        if edits.is_empty() {
            return Ok(());
        }
        for edit in edits {
            self.validate(edit)?;
        }
        self.checkpoint();
        for edit in edits {
            self.write(edit);
        }
        tracing::debug!(count = edits.len(), "Batch written");
        Ok(())
    }

    fn add_row(&mut self, student: &NewStudent) -> Result<usize> {
        if student.first_name.trim().is_empty() {
            return Err(GradevoxError::Roster("New student has no name".into()));
        }
        if let Some(id) = &student.student_id {
            if self.roster.find_by_student_id(id).is_some() {
                return Err(GradevoxError::Roster(format!(
                    "Student id {} already exists",
                    id
                )));
            }
        }

        self.checkpoint();
        let index = self.roster.len();
        let mut row = RosterRow::new(index, &student.first_name, &student.last_name);
        row.student_id = student.student_id.clone();
        self.roster.rows.push(row);
        Ok(index)
    }

    fn delete_row(&mut self, row_index: usize) -> Result<()> {
        if row_index >= self.roster.len() {
            return Err(GradevoxError::RowOutOfRange {
                index: row_index,
                len: self.roster.len(),
            });
        }
        self.checkpoint();
        self.roster.rows.remove(row_index);
        renumber(&mut self.roster.rows);
        Ok(())
    }

    fn sort_rows(&mut self, field: &SortField, direction: SortDirection) -> Result<()> {
        if let SortField::Column(column) = field {
            if !self.roster.has_column(column) {
                return Err(GradevoxError::UnknownColumn(column.clone()));
            }
        }
        self.checkpoint();
        self.roster.rows.sort_by(|a, b| {
            let ordering = compare_rows(a, b, field);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        renumber(&mut self.roster.rows);
        Ok(())
    }

    fn undo(&mut self) -> Result<bool> {
        let Some(previous) = self.undo_stack.pop() else {
            return Ok(false);
        };
        let current = std::mem::replace(&mut self.roster, previous);
        self.redo_stack.push(current);
        Ok(true)
    }

    fn redo(&mut self) -> Result<bool> {
        let Some(next) = self.redo_stack.pop() else {
            return Ok(false);
        };
        let current = std::mem::replace(&mut self.roster, next);
        self.undo_stack.push(current);
        Ok(true)
    }
}

fn renumber(rows: &mut [RosterRow]) {
    for (i, row) in rows.iter_mut().enumerate() {
        row.index = i;
    }
}

fn compare_rows(a: &RosterRow, b: &RosterRow, field: &SortField) -> Ordering {
    match field {
        SortField::FirstName => compare_text(&a.first_name, &b.first_name)
            .then_with(|| compare_text(&a.last_name, &b.last_name)),
        SortField::LastName => compare_text(&a.last_name, &b.last_name)
            .then_with(|| compare_text(&a.first_name, &b.first_name)),
        SortField::StudentId => compare_cells(a.student_id.as_deref(), b.student_id.as_deref()),
        SortField::Column(column) => compare_cells(a.value(column), b.value(column)),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Numbers sort numerically, then text; empty cells always sort last in
/// ascending order.
fn compare_cells(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => compare_text(a, b),
        },
    }
}
