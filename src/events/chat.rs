//! Chat messages from the overlay host.

/// Marker that turns a chat line into a game command worth logging.
pub const COMMAND_MARKER: char = '!';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(username: impl Into<String>, text: impl Into<String>) -> Self {
        ChatMessage {
            username: username.into(),
            text: text.into(),
        }
    }

    pub fn is_command(&self) -> bool {
        self.text.starts_with(COMMAND_MARKER)
    }
}
