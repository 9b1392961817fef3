//! One-way pull and opt-in push between local todos and a GitHub Project
//! board. The board is authoritative on conflicts.

mod github;
mod reconcile;

pub use github::{GhCli, ProjectBoard, RemoteAssignee, RemoteItem};
pub use reconcile::{pull, push, PushStats};
