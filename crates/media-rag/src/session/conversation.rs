//! Sliding conversation window and cached visual context

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

/// Speaker of a history line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("User"),
            Role::Bot => f.write_str("Bot"),
        }
    }
}

/// Most recent exchange lines plus the summary of the last image turn.
///
/// The window evicts strictly FIFO. The visual context is only ever replaced,
/// never cleared: text-only turns keep referring to the last image.
#[derive(Debug, Clone)]
pub struct ConversationState {
    lines: VecDeque<String>,
    capacity: usize,
    last_visual_context: Option<String>,
}

impl ConversationState {
    /// Create an empty window holding at most `capacity` lines
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            last_visual_context: None,
        }
    }

    /// Append `"{role}: {text}"` to the window
    pub fn record_turn(&mut self, role: Role, text: &str) {
        self.append_line(format!("{}: {}", role, text));
    }

    fn append_line(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        while self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Window lines, oldest first, joined with newlines
    pub fn snapshot(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    /// Window lines, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Number of lines currently held
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when no line has been recorded
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Summary derived from the most recent image turn
    pub fn last_visual_context(&self) -> Option<&str> {
        self.last_visual_context.as_deref()
    }

    /// Replace the cached visual context
    pub fn set_visual_context(&mut self, summary: String) {
        self.last_visual_context = Some(summary);
    }

    /// Serializable view for the history endpoint
    pub fn view(&self) -> ConversationView {
        ConversationView {
            lines: self.lines.iter().cloned().collect(),
            capacity: self.capacity,
            has_visual_context: self.last_visual_context.is_some(),
        }
    }
}

/// Read-only snapshot of the conversation window
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub lines: Vec<String>,
    pub capacity: usize,
    pub has_visual_context: bool,
}
