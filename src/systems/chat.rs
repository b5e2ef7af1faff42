//! Chat intake.

use bevy_ecs::prelude::*;

use crate::resources::chat::ChatFeed;
use crate::resources::eventlog::EventLog;
use crate::resources::worldtime::WorldTime;

/// Drain the chat feed and log every `!command`; other chatter is dropped.
pub fn poll_chat(mut feed: ResMut<ChatFeed>, mut log: ResMut<EventLog>, time: Res<WorldTime>) {
    for message in feed.0.drain() {
        if message.is_command() {
            log.push(
                time.elapsed,
                format!("{}: {}", message.username, message.text),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::chat::ChatMessage;
    use crate::resources::chat::ChannelChat;
    use crossbeam_channel::unbounded;

    #[test]
    fn only_commands_reach_the_log() {
        let (tx, rx) = unbounded();
        let mut world = World::new();
        world.insert_resource(ChatFeed(Box::new(ChannelChat::new(rx))));
        world.insert_resource(EventLog::new());
        world.insert_resource(WorldTime::default());
        let mut schedule = Schedule::default();
        schedule.add_systems(poll_chat);

        tx.send(ChatMessage::new("viewer", "hello there")).unwrap();
        tx.send(ChatMessage::new("viewer", "!roll d20")).unwrap();
        tx.send(ChatMessage::new("mod", "not a !command")).unwrap();
        schedule.run(&mut world);

        let log = world.resource::<EventLog>();
        assert_eq!(log.len(), 1);
        assert_eq!(log.count_containing("viewer: !roll d20"), 1);
    }
}
