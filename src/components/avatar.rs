use bevy_ecs::prelude::Component;

/// Marks the entity that carries the local character's animation and loadout.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Avatar;
