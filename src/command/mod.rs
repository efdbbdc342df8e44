//! Outbound commands and their wire alphabet.

pub mod sink;

pub use sink::{CommandSink, LogSink, WebSocketSink};

const COMMAND_COUNT: usize = 6;

/// A discrete control command for the downstream consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    MoveLeft,
    MoveRight,
    Rotate,
    Drop,
    Confirm,
    AltConfirm,
}

impl Command {
    pub const ALL: [Command; COMMAND_COUNT] = [
        Self::MoveLeft,
        Self::MoveRight,
        Self::Rotate,
        Self::Drop,
        Self::Confirm,
        Self::AltConfirm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoveLeft => "move-left",
            Self::MoveRight => "move-right",
            Self::Rotate => "rotate",
            Self::Drop => "drop",
            Self::Confirm => "confirm",
            Self::AltConfirm => "alt-confirm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Single-character encoding of each command on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alphabet {
    chars: [char; COMMAND_COUNT],
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            chars: ['l', 'r', 'u', 'd', 'a', ' '],
        }
    }
}

impl Alphabet {
    pub fn encode(&self, command: Command) -> char {
        self.chars[command.slot()]
    }

    pub fn set(&mut self, command: Command, ch: char) {
        self.chars[command.slot()] = ch;
    }

    /// Commands sharing a character with an earlier command.
    pub fn collisions(&self) -> Vec<(Command, Command)> {
        let mut out = Vec::new();
        for (i, a) in Command::ALL.iter().enumerate() {
            for b in &Command::ALL[i + 1..] {
                if self.encode(*a) == self.encode(*b) {
                    out.push((*a, *b));
                }
            }
        }
        out
    }
}
