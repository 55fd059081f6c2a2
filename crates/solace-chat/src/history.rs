//! Bounded message log for a single conversation.

use std::collections::VecDeque;

use solace_core::types::ChatMessage;

/// Ordered message log that keeps at most `capacity` messages, evicting the
/// oldest first.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
    evicted: usize,
}

impl MessageLog {
    /// A log holding at most `capacity` messages (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity.min(256)),
            capacity,
            evicted: 0,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
            self.evicted += 1;
        }
        self.messages.push_back(message);
    }

    /// The last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> impl DoubleEndedIterator<Item = &ChatMessage> + '_ {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip)
    }

    /// Render the last `n` messages as "User: ..." / "Assistant: ..." lines.
    pub fn transcript(&self, n: usize) -> String {
        self.recent(n)
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ChatMessage> + '_ {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages dropped so far to stay within capacity.
    pub fn evicted(&self) -> usize {
        self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(n: usize, capacity: usize) -> MessageLog {
        let mut log = MessageLog::new(capacity);
        for i in 0..n {
            if i % 2 == 0 {
                log.push(ChatMessage::user(format!("u{i}")));
            } else {
                log.push(ChatMessage::assistant(format!("a{i}")));
            }
        }
        log
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let log = log_with(6, 100);
        let recent: Vec<&str> = log.recent(3).map(|m| m.content.as_str()).collect();
        assert_eq!(recent, vec!["a3", "u4", "a5"]);
        assert_eq!(log.recent(50).count(), 6);
        assert_eq!(log.recent(0).count(), 0);
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let log = log_with(7, 4);
        assert_eq!(log.len(), 4);
        assert_eq!(log.evicted(), 3);
        let contents: Vec<&str> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a3", "u4", "a5", "u6"]);
    }

    #[test]
    fn test_transcript_labels() {
        let log = log_with(2, 10);
        assert_eq!(log.transcript(10), "User: u0\nAssistant: a1");
        assert_eq!(MessageLog::new(5).transcript(10), "");
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut log = MessageLog::new(0);
        log.push(ChatMessage::user("one"));
        log.push(ChatMessage::user("two"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().unwrap().content, "two");
    }
}
