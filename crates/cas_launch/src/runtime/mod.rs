//! Runtime components: command execution, environment discovery and dispatch

pub mod bootstrap;
pub mod command;
pub mod dispatch;
pub mod environments;
pub mod launcher;
pub mod shutdown;

pub use bootstrap::*;
pub use command::*;
pub use dispatch::*;
pub use environments::*;
pub use launcher::*;
pub use shutdown::*;
