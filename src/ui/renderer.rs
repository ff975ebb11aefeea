//! Response renderer
//!
//! Turns the text of one server response into what gets printed at the
//! prompt. Two presentations exist and exactly one is active:
//!
//! - **Plain**: text is left as sent, except that `help` output has each
//!   `/command` moved onto its own line.
//! - **Color**: `§` format markers become terminal color sequences and a
//!   reset is appended so color never leaks into the next line.

use crossterm::style::{ResetColor, SetForegroundColor};

use crate::config::{Palette, RenderMode};

/// Sentinel that opens a format marker
pub const MARKER_SENTINEL: char = '§';

/// Commands whose output is a `/`-delimited listing
const HELP_PREFIX: &str = "help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    Color,
}

/// Response renderer
#[derive(Debug, Clone)]
pub struct Renderer {
    style: Style,
    /// Escape sequence for each marker, indexed like `Palette::colors`
    codes: [String; 16],
    reset: String,
}

impl Renderer {
    /// Build a renderer, resolving `RenderMode::Auto` against whether stdout
    /// is a terminal
    pub fn new(mode: RenderMode, palette: &Palette, stdout_is_terminal: bool) -> Self {
        let style = match mode {
            RenderMode::Plain => Style::Plain,
            RenderMode::Color => Style::Color,
            RenderMode::Auto if stdout_is_terminal => Style::Color,
            RenderMode::Auto => Style::Plain,
        };

        Self {
            style,
            codes: palette
                .colors
                .map(|color| SetForegroundColor(color).to_string()),
            reset: ResetColor.to_string(),
        }
    }

    pub fn is_color(&self) -> bool {
        self.style == Style::Color
    }

    /// Render `text`, the response to `command`
    pub fn render(&self, command: &str, text: &str) -> String {
        match self.style {
            Style::Plain => split_help(command, text),
            Style::Color => self.translate(text),
        }
    }

    /// Replace every marker in one left-to-right pass, then append the reset
    fn translate(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + self.reset.len());
        let mut chars = text.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch == MARKER_SENTINEL {
                if let Some(index) = chars.peek().copied().and_then(marker_index) {
                    chars.next();
                    out.push_str(&self.codes[index]);
                    continue;
                }
            }
            out.push(ch);
        }

        out.push_str(&self.reset);
        out
    }
}

/// Put each `/command` of a help listing on its own line
pub fn split_help(command: &str, text: &str) -> String {
    if command.starts_with(HELP_PREFIX) {
        text.replace('/', "\n/")
    } else {
        text.to_string()
    }
}

/// Position of a marker digit in the palette. Only `0-9` and lowercase `a-f`.
fn marker_index(digit: char) -> Option<usize> {
    match digit {
        '0'..='9' => Some(digit as usize - '0' as usize),
        'a'..='f' => Some(digit as usize - 'a' as usize + 10),
        _ => None,
    }
}
