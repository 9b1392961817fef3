mod messages;
mod projects;
mod repository;
mod schema;
mod tiles;
mod todos;

pub use repository::{new_id, Repository};
pub use todos::{LinkedTodo, PullStats, TodoFilter, SYNC_CREATOR};
