//! Chat feed capability.
//!
//! Chat comes from whatever hosts the overlay. The core only drains messages
//! through [`ChatEventSource`] and logs the `!commands`; parsing them is the
//! server's job.

use bevy_ecs::prelude::Resource;
use crossbeam_channel::Receiver;

use crate::events::chat::ChatMessage;

pub trait ChatEventSource: Send + Sync {
    /// Messages received since the last call.
    fn drain(&mut self) -> Vec<ChatMessage>;
}

/// Source used when the host provides no chat.
pub struct NoChat;

impl ChatEventSource for NoChat {
    fn drain(&mut self) -> Vec<ChatMessage> {
        Vec::new()
    }
}

/// Chat pushed in from another thread.
pub struct ChannelChat {
    rx: Receiver<ChatMessage>,
}

impl ChannelChat {
    pub fn new(rx: Receiver<ChatMessage>) -> Self {
        ChannelChat { rx }
    }
}

impl ChatEventSource for ChannelChat {
    fn drain(&mut self) -> Vec<ChatMessage> {
        self.rx.try_iter().collect()
    }
}

#[derive(Resource)]
pub struct ChatFeed(pub Box<dyn ChatEventSource>);

impl Default for ChatFeed {
    fn default() -> Self {
        ChatFeed(Box::new(NoChat))
    }
}
