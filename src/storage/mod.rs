//! In-memory ticket store with derived indices, filters and change events.
//!
//! - `store`: the [`TaskStore`] and its lifecycle
//! - `index`: derived projects/people/tags
//! - `filters`: filter state and the filter pipeline
//! - `events`: typed publish/subscribe

pub mod events;
pub mod filters;
pub mod index;
mod store;

pub use events::{Delivery, EventBus, StoreEvent, SubscriptionId, Topic};
pub use filters::{FilterState, NO_REPORTER};
pub use index::DerivedIndex;
pub use store::{StoreState, TaskStore};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the front end lays tickets out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Board,
}

impl ViewMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Board => "board",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "list" => Ok(Self::List),
            "board" | "kanban" => Ok(Self::Board),
            other => Err(crate::error::TrackerError::validation(
                "view",
                format!("unknown view mode '{other}'"),
            )),
        }
    }
}
