//! Natural-language todo commands.
//!
//! [`parse_intent`] turns free text such as "call dentist tomorrow" or
//! "done with the dentist call" into a structured [`Intent`]. Parsing is pure:
//! the caller supplies the open todos and the current date, and applies the
//! result itself.

mod assignee;
mod dates;
mod parser;

pub use assignee::{infer_assignee, COBY, RODION};
pub use dates::parse_due_date;
pub use parser::parse_intent;

use chrono::NaiveDate;

/// An open todo the parser may match against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRef {
    pub id: String,
    pub title: String,
}

impl TodoRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Create {
        title: String,
        assignee: String,
        due_date: Option<NaiveDate>,
    },
    Complete {
        todo_id: String,
    },
    Update {
        todo_id: String,
        due_date: Option<NaiveDate>,
    },
    /// A completion phrase that matched no open todo.
    Unclear,
}
