//! Operator-facing console.
//!
//! - **shell**: the `rcon>` read / send / print loop
//! - **renderer**: turns response text into terminal output
//! - **input**: rustyline-backed line reader with history

pub mod input;
pub mod renderer;
pub mod shell;

pub use input::TerminalInput;
pub use renderer::Renderer;
pub use shell::{LineReader, LoopExit, ShellError};
