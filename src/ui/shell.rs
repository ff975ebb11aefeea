//! The `rcon>` command loop
//!
//! Reads a line, sends it, prints the rendered response, repeats. The loop
//! ends on `quit`/`q`, end of input or Ctrl+C. A command too long to send is
//! reported and the loop carries on; every other connector error propagates
//! to the caller, which owns the session.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::renderer::Renderer;
use crate::core::{Connector, RconError};

/// Prompt shown before every read
pub const PROMPT: &str = "rcon> ";

/// Inputs that end the session
pub const QUIT_COMMANDS: [&str; 2] = ["quit", "q"];

/// Printed once before the first prompt
pub const BANNER: &str = "\n  Welcome to the rcon shell. Enter commands here to send them\n  \
                          to the RCON server. To quit, type \"quit\" or \"q\".\n\n";

/// Outcome of one blocking read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A line, without its trailing newline
    Line(String),
    /// Ctrl+C
    Interrupted,
    /// Ctrl+D or closed stdin
    Eof,
}

/// Blocking line input
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadEvent>;
}

/// Why the loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Quit,
    Interrupted,
    EndOfInput,
}

#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Rcon(#[from] RconError),

    #[error("Failed to read input: {0}")]
    Input(#[source] io::Error),

    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),
}

/// Whether `line` asks to end the session
pub fn is_quit(line: &str) -> bool {
    QUIT_COMMANDS.contains(&line.trim())
}

/// Run the command loop until the operator leaves
pub fn run<C, R, W>(
    connector: &mut C,
    input: &mut R,
    renderer: &Renderer,
    out: &mut W,
) -> Result<LoopExit, ShellError>
where
    C: Connector + ?Sized,
    R: LineReader + ?Sized,
    W: Write + ?Sized,
{
    out.write_all(BANNER.as_bytes()).map_err(ShellError::Output)?;
    out.flush().map_err(ShellError::Output)?;

    loop {
        let command = match input.read_line(PROMPT).map_err(ShellError::Input)? {
            ReadEvent::Line(line) => line,
            ReadEvent::Interrupted => return Ok(LoopExit::Interrupted),
            ReadEvent::Eof => return Ok(LoopExit::EndOfInput),
        };

        if is_quit(&command) {
            info!("Operator quit");
            return Ok(LoopExit::Quit);
        }

        let response = match connector.send(&command) {
            Ok(response) => response,
            // Rejected before anything reached the server
            Err(e @ RconError::CommandTooLong { .. }) => {
                warn!("{}", e);
                writeln!(out, "{}.", e).map_err(ShellError::Output)?;
                out.flush().map_err(ShellError::Output)?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Response {} ({} bytes)", response.id, response.text.len());

        if response.text.is_empty() {
            continue;
        }

        let rendered = renderer.render(&command, &response.text);
        writeln!(out, "{}", rendered).map_err(ShellError::Output)?;
        out.flush().map_err(ShellError::Output)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Palette, RenderMode};
    use crate::testing::{FakeConnector, ScriptedInput};

    fn plain() -> Renderer {
        Renderer::new(RenderMode::Plain, &Palette::ansi(), false)
    }

    fn run_script(connector: &mut FakeConnector, input: &mut ScriptedInput) -> (LoopExit, String) {
        let mut out = Vec::new();
        let exit = run(connector, input, &plain(), &mut out).unwrap();
        (exit, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_quit_tokens_send_nothing() {
        for token in ["quit", "q", "  quit ", "q\t"] {
            let mut connector = FakeConnector::new();
            let mut input = ScriptedInput::lines(&[token, "list"]);

            let (exit, out) = run_script(&mut connector, &mut input);

            assert_eq!(exit, LoopExit::Quit);
            assert!(connector.sent().is_empty());
            assert_eq!(out, BANNER);
        }
    }

    #[test]
    fn test_near_quit_is_a_command() {
        let mut connector = FakeConnector::new().reply("").reply("");
        let mut input = ScriptedInput::lines(&["quit now", "Q", "q"]);

        run_script(&mut connector, &mut input);
        assert_eq!(connector.sent(), vec!["quit now", "Q"]);
    }

    #[test]
    fn test_command_forwarded_verbatim() {
        let mut connector = FakeConnector::new().reply("ok");
        let mut input = ScriptedInput::lines(&["  say  hello ", "q"]);

        run_script(&mut connector, &mut input);
        assert_eq!(connector.sent(), vec!["  say  hello "]);
    }

    #[test]
    fn test_empty_response_prints_nothing() {
        let mut connector = FakeConnector::new().reply("").reply("Saved the game");
        let mut input = ScriptedInput::lines(&["whitelist reload", "save-all", "q"]);

        let (_, out) = run_script(&mut connector, &mut input);
        assert_eq!(out, format!("{}Saved the game\n", BANNER));
    }

    #[test]
    fn test_help_listing_split() {
        let mut connector = FakeConnector::new().reply("/ban/kick");
        let mut input = ScriptedInput::lines(&["help", "q"]);

        let (_, out) = run_script(&mut connector, &mut input);
        assert_eq!(out, format!("{}\n/ban\n/kick\n", BANNER));
    }

    #[test]
    fn test_responses_in_issue_order() {
        let mut connector = FakeConnector::new();
        let mut commands = Vec::new();
        for i in 0..20 {
            connector = connector.reply(&format!("response {}", i));
            commands.push(format!("cmd {}", i));
        }
        commands.push("q".to_string());
        let mut input = ScriptedInput::owned(commands);

        let (_, out) = run_script(&mut connector, &mut input);

        let printed: Vec<_> = out.lines().skip(BANNER.lines().count()).collect();
        let expected: Vec<_> = (0..20).map(|i| format!("response {}", i)).collect();
        assert_eq!(printed, expected);
        assert_eq!(connector.sent().len(), 20);
    }

    #[test]
    fn test_interrupt_and_eof() {
        let mut connector = FakeConnector::new().reply("x");
        let mut input = ScriptedInput::lines(&["list"]).then(ReadEvent::Interrupted);
        let (exit, _) = run_script(&mut connector, &mut input);
        assert_eq!(exit, LoopExit::Interrupted);

        let mut connector = FakeConnector::new();
        let mut input = ScriptedInput::lines(&[]);
        let (exit, _) = run_script(&mut connector, &mut input);
        assert_eq!(exit, LoopExit::EndOfInput);
    }

    #[test]
    fn test_send_error_propagates() {
        let mut connector = FakeConnector::new()
            .reply("first")
            .fail(RconError::Protocol("bad id".to_string()));
        let mut input = ScriptedInput::lines(&["a", "b", "c"]);
        let mut out = Vec::new();

        let result = run(&mut connector, &mut input, &plain(), &mut out);

        assert!(matches!(result, Err(ShellError::Rcon(RconError::Protocol(_)))));
        assert_eq!(connector.sent(), vec!["a", "b"]);
        assert_eq!(connector.disconnects(), 0);
    }

    #[test]
    fn test_too_long_command_is_reported_and_skipped() {
        let mut connector = FakeConnector::new()
            .fail(RconError::CommandTooLong { len: 2000, max: 1446 })
            .reply("ok");
        let mut input = ScriptedInput::lines(&["give @a stone", "list", "q"]);

        let (exit, out) = run_script(&mut connector, &mut input);

        assert_eq!(exit, LoopExit::Quit);
        assert_eq!(connector.sent(), vec!["give @a stone", "list"]);
        assert_eq!(
            out,
            format!(
                "{}Command is 2000 bytes, the server accepts at most 1446.\nok\n",
                BANNER
            )
        );
    }

    #[test]
    fn test_prompt_passed_to_reader() {
        let mut connector = FakeConnector::new();
        let mut input = ScriptedInput::lines(&["q"]);
        run_script(&mut connector, &mut input);
        assert_eq!(input.prompts(), vec![PROMPT]);
    }
}
