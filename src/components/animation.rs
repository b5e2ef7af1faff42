//! Character animation state machine.
//!
//! [`AnimationController`] owns the coarse state (`Idle` / `Walk`) and the
//! walk frame index. Movement triggers put it in `Walk` and (re)arm a
//! debounced return to `Idle`; [`AnimationController::advance`] runs every
//! tick and steps frames on a wall-clock cadence, so the animation speed does
//! not depend on the display refresh rate.
//!
//! [`IdleFlavorScheduler`] is a separate, purely cosmetic timer that
//! occasionally swaps the plain idle pose for one of two flavor poses. It has
//! its own lifecycle and never touches the coarse state.

use bevy_ecs::prelude::Component;

use crate::resources::assetcatalog::AssetManifest;

/// Time spent in `Walk` after the last movement trigger.
pub const WALK_DWELL_MS: f64 = 600.0;
/// Frame interval used when the manifest declares no walk rate.
pub const DEFAULT_FRAME_INTERVAL_MS: f64 = 125.0;
/// Walk frame count used when the manifest declares fewer frames.
pub const MIN_WALK_FRAMES: usize = 6;
/// Period of the idle flavor scheduler.
pub const FLAVOR_PERIOD_MS: f64 = 30_000.0;
/// How long a flavor pose stays up.
pub const FLAVOR_DISPLAY_MS: f64 = 3000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimState {
    #[default]
    Idle,
    Walk,
}

/// Cosmetic idle sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleFlavor {
    #[default]
    Plain,
    Alt1,
    Alt2,
}

/// What the character is showing right now, coarse state and flavor combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Idle(IdleFlavor),
    Walk,
}

#[derive(Component, Debug, Clone)]
pub struct AnimationController {
    state: AnimState,
    flavor: IdleFlavor,
    frame_index: usize,
    last_advance_ms: f64,
    frame_interval_ms: f64,
    walk_frames: usize,
    /// Pending debounced return to idle.
    idle_at_ms: Option<f64>,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationController {
    pub fn new() -> Self {
        AnimationController {
            state: AnimState::Idle,
            flavor: IdleFlavor::Plain,
            frame_index: 0,
            last_advance_ms: 0.0,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            walk_frames: MIN_WALK_FRAMES,
            idle_at_ms: None,
        }
    }

    /// Controller tuned to the manifest's walk rate and frame count.
    pub fn from_manifest(manifest: Option<&AssetManifest>) -> Self {
        let mut controller = Self::new();
        if let Some(manifest) = manifest {
            if let Some(fps) = manifest.meta.walk_fps.filter(|f| f.is_finite() && *f > 0.0) {
                controller.frame_interval_ms = (1000.0 / fps).round();
            }
            controller.walk_frames = manifest.longest_walk().max(MIN_WALK_FRAMES);
        }
        controller
    }

    pub fn state(&self) -> AnimState {
        self.state
    }

    pub fn flavor(&self) -> IdleFlavor {
        self.flavor
    }

    pub fn pose(&self) -> Pose {
        match self.state {
            AnimState::Walk => Pose::Walk,
            AnimState::Idle => Pose::Idle(self.flavor),
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    /// Number of frames the current state cycles through.
    pub fn frame_count(&self) -> usize {
        match self.state {
            AnimState::Walk => self.walk_frames,
            AnimState::Idle => 1,
        }
    }

    pub fn is_walking(&self) -> bool {
        self.state == AnimState::Walk
    }

    /// Movement trigger: enter (or stay in) `Walk` and push the return to
    /// idle out to `now + WALK_DWELL_MS`, replacing any pending one.
    pub fn trigger_walk(&mut self, now_ms: f64) {
        self.state = AnimState::Walk;
        self.idle_at_ms = Some(now_ms + WALK_DWELL_MS);
    }

    /// Per-tick update. Safe to call at any rate.
    pub fn advance(&mut self, now_ms: f64) {
        if self.idle_at_ms.is_some_and(|at| now_ms >= at) {
            self.idle_at_ms = None;
            self.state = AnimState::Idle;
        }

        match self.state {
            AnimState::Walk => {
                if now_ms - self.last_advance_ms > self.frame_interval_ms {
                    self.frame_index = (self.frame_index + 1) % self.walk_frames;
                    self.last_advance_ms = now_ms;
                }
            }
            AnimState::Idle => self.frame_index = 0,
        }
    }

    pub(crate) fn set_flavor(&mut self, flavor: IdleFlavor) {
        self.flavor = flavor;
    }
}

/// Periodically shows an idle flavor pose while the character stands still.
#[derive(Component, Debug, Clone)]
pub struct IdleFlavorScheduler {
    period_ms: f64,
    display_ms: f64,
    next_fire_ms: f64,
    revert_at_ms: Option<f64>,
    next_flavor: IdleFlavor,
}

impl IdleFlavorScheduler {
    /// First firing one period after `start_ms`.
    pub fn new(start_ms: f64) -> Self {
        IdleFlavorScheduler {
            period_ms: FLAVOR_PERIOD_MS,
            display_ms: FLAVOR_DISPLAY_MS,
            next_fire_ms: start_ms + FLAVOR_PERIOD_MS,
            revert_at_ms: None,
            next_flavor: IdleFlavor::Alt1,
        }
    }

    pub fn next_fire_ms(&self) -> f64 {
        self.next_fire_ms
    }

    pub fn tick(&mut self, now_ms: f64, controller: &mut AnimationController) {
        if self.revert_at_ms.is_some_and(|at| now_ms >= at) {
            self.revert_at_ms = None;
            controller.set_flavor(IdleFlavor::Plain);
        }

        if now_ms < self.next_fire_ms {
            return;
        }
        // Catch up without firing once per missed period.
        while self.next_fire_ms <= now_ms {
            self.next_fire_ms += self.period_ms;
        }

        if controller.is_walking() {
            return;
        }
        controller.set_flavor(self.next_flavor);
        self.revert_at_ms = Some(now_ms + self.display_ms);
        self.next_flavor = match self.next_flavor {
            IdleFlavor::Alt1 => IdleFlavor::Alt2,
            _ => IdleFlavor::Alt1,
        };
    }
}
