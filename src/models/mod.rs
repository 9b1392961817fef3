mod message;
mod project;
mod tile;
mod todo;

pub use message::{Message, Role};
pub use project::{
    DocType, ItemStatus, NewProjectDoc, NewProjectItem, Project, ProjectDoc, ProjectDocUpdate,
    ProjectItem, ProjectItemUpdate, ProjectStatus, ProjectUpdate,
};
pub use tile::{FilterMode, NewTile, Tile, TileUpdate};
pub use todo::{NewTodo, Todo, TodoUpdate, DEFAULT_ASSIGNEE};

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in partial-update payloads.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
