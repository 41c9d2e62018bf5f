//! CLI command implementations

mod core;
mod export;
mod serve;

pub use self::core::{cmd_init, cmd_status, open_db};
pub use self::export::cmd_export;
pub use self::serve::cmd_serve;
