//! Command vocabulary, matching, and dispatch.

pub mod dispatch;
pub mod interpreter;

pub use dispatch::{CommandEvent, CommandHandler, CommandRouter};
pub use interpreter::{CommandKind, Interpreter};
