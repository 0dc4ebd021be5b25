//! Outgoing command records and the pending-command queue.
//!
//! Commands travel from the block facade to the dispatcher as NUL-joined
//! string records: the first field is the tag, the rest are positional
//! arguments. The queue is bounded at 100 records, drops the oldest on
//! overflow, and pops newest-first, so the most recent user action wins
//! when the device falls behind.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Maximum number of pending records before the oldest is evicted.
pub const QUEUE_CAPACITY: usize = 100;

const FIELD_SEPARATOR: char = '\0';

/// A parsed outgoing command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scroll text across the LED matrix.
    ScrollText(String),
    /// Show a named predefined bitmap.
    LedMatrixPattern(String),
    /// Write five raw row bitmasks (low 5 bits each).
    LedMatrix([u8; 5]),
    /// Flag `"0"` writes an all-zero frame, anything else all-ones.
    ClearDisplay(String),
}

impl Command {
    /// Serialize into the queue record format.
    pub fn encode(&self) -> String {
        match self {
            Command::ScrollText(text) => format!("scroll_text\0{}", text),
            Command::LedMatrixPattern(name) => format!("led_matrix_pattern\0{}", name),
            Command::LedMatrix(rows) => format!(
                "led_matrix\0{}\0{}\0{}\0{}\0{}",
                rows[0], rows[1], rows[2], rows[3], rows[4]
            ),
            Command::ClearDisplay(flag) => format!("clear_display\0{}", flag),
        }
    }

    /// Parse a queue record. Unknown tags and malformed argument lists
    /// yield `None`; the dispatcher drops them without comment.
    pub fn parse(record: &str) -> Option<Command> {
        let mut fields = record.split(FIELD_SEPARATOR);
        let tag = fields.next()?;
        let args: Vec<&str> = fields.collect();
        match (tag, args.as_slice()) {
            ("scroll_text", [text]) => Some(Command::ScrollText((*text).to_string())),
            ("led_matrix_pattern", [name]) => {
                Some(Command::LedMatrixPattern((*name).to_string()))
            }
            ("led_matrix", [r1, r2, r3, r4, r5]) => {
                let mut rows = [0u8; 5];
                for (slot, raw) in rows.iter_mut().zip([r1, r2, r3, r4, r5]) {
                    *slot = raw.parse().ok()?;
                }
                Some(Command::LedMatrix(rows))
            }
            ("clear_display", [flag]) => Some(Command::ClearDisplay((*flag).to_string())),
            _ => None,
        }
    }
}

/// Bounded LIFO buffer of encoded command records.
///
/// Single producer (block server task), single consumer (dispatch task).
#[derive(Debug, Default)]
pub struct CommandQueue {
    records: Mutex<VecDeque<String>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, evicting the oldest when full.
    pub fn push(&self, record: String) {
        let mut records = self.records.lock().unwrap();
        if records.len() == QUEUE_CAPACITY {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Take the most recently enqueued record, if any.
    pub fn pop(&self) -> Option<String> {
        self.records.lock().unwrap().pop_back()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_nul_separated_fields() {
        assert_eq!(
            Command::ScrollText("HELLO".into()).encode(),
            "scroll_text\0HELLO"
        );
        assert_eq!(
            Command::LedMatrix([4, 8, 31, 8, 4]).encode(),
            "led_matrix\u{0}4\u{0}8\u{0}31\u{0}8\u{0}4"
        );
    }

    #[test]
    fn parse_round_trips() {
        for cmd in [
            Command::ScrollText("HI".into()),
            Command::LedMatrixPattern("Arrow Left".into()),
            Command::LedMatrix([0, 1, 2, 3, 31]),
            Command::ClearDisplay("0".into()),
        ] {
            assert_eq!(Command::parse(&cmd.encode()), Some(cmd));
        }
    }

    #[test]
    fn parse_rejects_unknown_tag() {
        assert_eq!(Command::parse("set_volume\u{0}9"), None);
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert_eq!(Command::parse("scroll_text"), None);
        assert_eq!(Command::parse("led_matrix\u{0}1\u{0}2"), None);
    }

    #[test]
    fn parse_rejects_non_numeric_rows() {
        assert_eq!(
            Command::parse("led_matrix\u{0}1\u{0}2\u{0}x\u{0}4\u{0}5"),
            None
        );
    }

    #[test]
    fn queue_pops_newest_first() {
        let queue = CommandQueue::new();
        queue.push("first".into());
        queue.push("second".into());
        queue.push("third".into());
        assert_eq!(queue.pop().as_deref(), Some("third"));
        assert_eq!(queue.pop().as_deref(), Some("second"));
        assert_eq!(queue.pop().as_deref(), Some("first"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn queue_keeps_only_the_newest_hundred() {
        let queue = CommandQueue::new();
        for i in 0..150 {
            queue.push(format!("record-{i}"));
        }
        assert_eq!(queue.len(), QUEUE_CAPACITY);
        // Newest first, and nothing older than record-50 survives.
        assert_eq!(queue.pop().as_deref(), Some("record-149"));
        let mut last = None;
        while let Some(record) = queue.pop() {
            last = Some(record);
        }
        assert_eq!(last.as_deref(), Some("record-50"));
    }
}
