use crate::error::GroomError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    #[serde(rename = "MalformedInputError")]
    MalformedInput,
    #[serde(rename = "DuplicateIdWarning")]
    DuplicateId,
    #[serde(rename = "UnclassifiableItemError")]
    Unclassifiable,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::MalformedInput => write!(f, "MalformedInputError"),
            IssueKind::DuplicateId => write!(f, "DuplicateIdWarning"),
            IssueKind::Unclassifiable => write!(f, "UnclassifiableItemError"),
        }
    }
}

/// A per-item problem recorded during a run. Never fatal on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: IssueKind,
    pub item_id: String,
    pub message: String,
}

impl Issue {
    /// Convert a per-item error into an issue record.
    ///
    /// Returns `None` for errors that are not per-item.
    pub fn from_error(err: &GroomError) -> Option<Self> {
        let (kind, item_id) = match err {
            GroomError::MalformedInput { record, .. } => (IssueKind::MalformedInput, record),
            GroomError::DuplicateId(id) => (IssueKind::DuplicateId, id),
            GroomError::Unclassifiable { id, .. } => (IssueKind::Unclassifiable, id),
            _ => return None,
        };
        Some(Self {
            kind,
            item_id: item_id.clone(),
            message: err.to_string(),
        })
    }

    pub fn is_warning(&self) -> bool {
        self.kind == IssueKind::DuplicateId
    }
}
