//! Three-stage triage board: discovery, review, confirmed.
//!
//! Every transition removes a book from one column and prepends it to
//! another, updating its `workflow_stage`. The only check is that the book
//! is currently in the source column. Discovery never moves straight to
//! confirmed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::book::{Book, WorkflowStage};
use crate::pipeline::{exclude_triaged, merge_last_seen};

/// Errors from board transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The book is not in the column the transition starts from.
    #[error("book {id} is not in {expected}")]
    NotInStage { id: String, expected: &'static str },
}

/// Result type for board transitions.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// A triage move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// discovery -> review
    Shortlist,
    /// review -> confirmed
    Approve,
    /// confirmed -> review
    Reopen,
    /// review -> dropped from the board
    Discard,
}

impl Transition {
    pub fn from_stage(&self) -> WorkflowStage {
        match self {
            Transition::Shortlist => WorkflowStage::Discovery,
            Transition::Approve | Transition::Discard => WorkflowStage::Review,
            Transition::Reopen => WorkflowStage::Confirmed,
        }
    }

    /// Destination column, `None` when the book leaves the board.
    pub fn to_stage(&self) -> Option<WorkflowStage> {
        match self {
            Transition::Shortlist | Transition::Reopen => Some(WorkflowStage::Review),
            Transition::Approve => Some(WorkflowStage::Confirmed),
            Transition::Discard => None,
        }
    }
}

/// The caller-owned triage state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowBoard {
    #[serde(default)]
    pub discovery: Vec<Book>,
    #[serde(default)]
    pub review: Vec<Book>,
    #[serde(default)]
    pub confirmed: Vec<Book>,
}

impl WorkflowBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids already in review or confirmed; new candidates with these ids are hidden.
    pub fn excluded_ids(&self) -> HashSet<String> {
        self.review
            .iter()
            .chain(self.confirmed.iter())
            .map(|b| b.id.clone())
            .collect()
    }

    /// Replace the discovery column with fresh candidates, minus triaged ids.
    ///
    /// A repeated candidate id is kept once, so one shortlist clears it.
    /// Returns how many candidates were kept.
    pub fn replace_discovery(&mut self, candidates: Vec<Book>) -> usize {
        let excluded = self.excluded_ids();
        self.discovery = exclude_triaged(merge_last_seen(vec![candidates]), &excluded)
            .into_iter()
            .map(|mut b| {
                b.workflow_stage = WorkflowStage::Discovery;
                b
            })
            .collect();
        self.discovery.len()
    }

    /// Find a book in any column.
    pub fn find(&self, id: &str) -> Option<&Book> {
        self.discovery
            .iter()
            .chain(self.review.iter())
            .chain(self.confirmed.iter())
            .find(|b| b.id == id)
    }

    /// Apply a transition to the book with the given id.
    ///
    /// Returns the moved record with its stage updated. A discarded book
    /// leaves the board and may surface again on a later fetch.
    pub fn apply(&mut self, transition: Transition, id: &str) -> WorkflowResult<Book> {
        let from = transition.from_stage();
        let column = self.column_mut(from);
        let position = column
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| WorkflowError::NotInStage {
                id: id.to_string(),
                expected: from.as_label(),
            })?;
        let mut book = column.remove(position);

        debug!(id, ?transition, "workflow transition");

        if let Some(stage) = transition.to_stage() {
            book.workflow_stage = stage;
            self.column_mut(stage).insert(0, book.clone());
        }
        Ok(book)
    }

    /// Move a discovery candidate into review.
    pub fn shortlist(&mut self, id: &str) -> WorkflowResult<Book> {
        self.apply(Transition::Shortlist, id)
    }

    /// Confirm a reviewed book for the order.
    pub fn approve(&mut self, id: &str) -> WorkflowResult<Book> {
        self.apply(Transition::Approve, id)
    }

    /// Send a confirmed book back to review.
    pub fn reopen(&mut self, id: &str) -> WorkflowResult<Book> {
        self.apply(Transition::Reopen, id)
    }

    /// Drop a reviewed book from the board.
    pub fn discard(&mut self, id: &str) -> WorkflowResult<Book> {
        self.apply(Transition::Discard, id)
    }

    fn column_mut(&mut self, stage: WorkflowStage) -> &mut Vec<Book> {
        match stage {
            WorkflowStage::Discovery => &mut self.discovery,
            WorkflowStage::Review => &mut self.review,
            WorkflowStage::Confirmed => &mut self.confirmed,
        }
    }
}
