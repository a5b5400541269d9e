#![allow(dead_code)]

use dls_protocol::{DlsError, Result, Transport};
use std::collections::VecDeque;

/// One transport call, in the order the session made it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Write(String),
    Read,
}

/// Transport that records every call and replays scripted response lines.
///
/// A `None` reply (or an exhausted script) reads as a timeout.
#[derive(Default)]
pub struct MockTransport {
    replies: VecDeque<Option<Vec<u8>>>,
    pub events: Vec<Event>,
}

impl MockTransport {
    pub fn with_replies(replies: &[&str]) -> Self {
        let mut mock = MockTransport::default();
        for reply in replies {
            mock = mock.then(reply);
        }
        mock
    }

    pub fn then(mut self, reply: &str) -> Self {
        self.replies.push_back(Some(reply.as_bytes().to_vec()));
        self
    }

    pub fn then_timeout(mut self) -> Self {
        self.replies.push_back(None);
        self
    }

    /// Request lines written so far
    pub fn writes(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Write(line) => Some(line.clone()),
                Event::Read => None,
            })
            .collect()
    }

    pub fn reads(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Read).count()
    }
}

impl Transport for MockTransport {
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.events
            .push(Event::Write(String::from_utf8_lossy(line).into_owned()));
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        self.events.push(Event::Read);
        self.replies.pop_front().flatten().ok_or(DlsError::Timeout)
    }
}

pub fn write(line: &str) -> Event {
    Event::Write(line.to_string())
}
