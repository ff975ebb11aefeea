//! Terminal line input
//!
//! Wraps a `rustyline` editor so the prompt gets line editing and arrow-key
//! history. Ctrl+C and Ctrl+D come back as `ReadEvent`s instead of errors.

use std::io;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use super::shell::{LineReader, ReadEvent};
use crate::history::CommandHistory;

/// Interactive reader backed by rustyline
pub struct TerminalInput {
    editor: DefaultEditor,
    /// Persistent history, `None` when disabled
    history: Option<CommandHistory>,
}

impl TerminalInput {
    pub fn new(history: Option<CommandHistory>) -> Result<Self, ReadlineError> {
        let mut editor = DefaultEditor::new()?;

        if let Some(ref history) = history {
            for command in history.commands() {
                if let Err(e) = editor.add_history_entry(command) {
                    warn!("Failed to seed line history: {}", e);
                    break;
                }
            }
        }

        Ok(Self { editor, history })
    }
}

impl LineReader for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                // Without a persistent history the editor still recalls this session
                let recorded = match self.history.as_mut() {
                    Some(history) => history.add(&line),
                    None => !line.trim().is_empty(),
                };
                if recorded {
                    if let Err(e) = self.editor.add_history_entry(line.trim()) {
                        warn!("Failed to record line history: {}", e);
                    }
                }
                Ok(ReadEvent::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadEvent::Eof),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        }
    }
}
