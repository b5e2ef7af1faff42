//! Animation systems.
//!
//! - [`animation_system`] applies due walk-to-idle transitions and steps walk
//!   frames on the wall clock.
//! - [`idle_flavor_system`] ticks the cosmetic idle flavor timers.
//!
//! Both read [`WorldTime::now_ms`], never the frame delta, so frame pacing does
//! not change animation speed. Run [`animation_system`] first: a flavor firing
//! in the same tick as the return to idle must see the controller idle.

use bevy_ecs::prelude::*;

use crate::components::animation::{AnimationController, IdleFlavorScheduler};
use crate::resources::worldtime::WorldTime;

pub fn idle_flavor_system(
    mut query: Query<(&mut IdleFlavorScheduler, &mut AnimationController)>,
    time: Res<WorldTime>,
) {
    let now = time.now_ms();
    for (mut scheduler, mut controller) in query.iter_mut() {
        scheduler.tick(now, &mut controller);
    }
}

pub fn animation_system(mut query: Query<&mut AnimationController>, time: Res<WorldTime>) {
    let now = time.now_ms();
    for mut controller in query.iter_mut() {
        controller.advance(now);
    }
}
