//! CLI command implementations.

mod ask;
mod bills;
mod documents;
mod serve;
mod status;

pub use ask::cmd_ask;
pub use bills::cmd_bills;
pub use documents::{cmd_delete, cmd_extract, cmd_upload};
pub use serve::cmd_serve;
pub use status::{cmd_check, cmd_config};
