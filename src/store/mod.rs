//! Database access for users and todos.

pub mod todo;
pub mod user;
