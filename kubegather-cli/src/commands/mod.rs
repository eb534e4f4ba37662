//! CLI command implementations.
//!
//! - `get`: Fetch one kubeconfig and merge it
//! - `gather`: Merge every catalog source
//! - `delete`: Remove a context from the destination
//! - `list`: Relate catalog labels to destination contexts
//! - `completions`: Generate shell completion scripts

pub mod completions;
pub mod delete;
pub mod gather;
pub mod get;
pub mod list;

pub use completions::CompletionsCommand;
pub use delete::DeleteCommand;
pub use gather::GatherCommand;
pub use get::GetCommand;
pub use list::ListCommand;
