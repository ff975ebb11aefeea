//! Test doubles for the connector and the line reader

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use crate::core::{Connector, RconError, Response, Result};
use crate::ui::shell::{LineReader, ReadEvent};

#[derive(Default)]
struct CallLog {
    sent: Vec<String>,
    disconnects: usize,
}

/// Observes a `FakeConnector` after it has been moved away
#[derive(Clone)]
pub struct Probe(Rc<RefCell<CallLog>>);

impl Probe {
    pub fn sent(&self) -> Vec<String> {
        self.0.borrow().sent.clone()
    }

    pub fn disconnects(&self) -> usize {
        self.0.borrow().disconnects
    }
}

/// Connector answering from a queue; unqueued commands get an empty reply
pub struct FakeConnector {
    replies: VecDeque<Result<String>>,
    log: Probe,
    next_id: i32,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            replies: VecDeque::new(),
            log: Probe(Rc::new(RefCell::new(CallLog::default()))),
            next_id: 1,
        }
    }

    pub fn reply(mut self, text: &str) -> Self {
        self.replies.push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(mut self, error: RconError) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    pub fn probe(&self) -> Probe {
        self.log.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.log.sent()
    }

    pub fn disconnects(&self) -> usize {
        self.log.disconnects()
    }
}

impl Connector for FakeConnector {
    fn send(&mut self, command: &str) -> Result<Response> {
        self.log.0.borrow_mut().sent.push(command.to_string());
        let id = self.next_id;
        self.next_id += 1;
        let text = self.replies.pop_front().unwrap_or_else(|| Ok(String::new()))?;
        Ok(Response { text, id })
    }

    fn disconnect(&mut self) {
        self.log.0.borrow_mut().disconnects += 1;
    }
}

/// Line reader replaying a fixed script, then reporting EOF
pub struct ScriptedInput {
    events: VecDeque<ReadEvent>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    pub fn lines(lines: &[&str]) -> Self {
        Self::owned(lines.iter().map(|line| line.to_string()).collect())
    }

    pub fn owned(lines: Vec<String>) -> Self {
        Self {
            events: lines.into_iter().map(ReadEvent::Line).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn then(mut self, event: ReadEvent) -> Self {
        self.events.push_back(event);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.clone()
    }
}

impl LineReader for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadEvent> {
        self.prompts.push(prompt.to_string());
        Ok(self.events.pop_front().unwrap_or(ReadEvent::Eof))
    }
}
