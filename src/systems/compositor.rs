//! Layered character compositing.
//!
//! [`compose_character`] turns the avatar's [`Loadout`] and animation pose
//! into draw commands, one sprite per layer in manifest order. A layer whose
//! key, manifest entry, frame or image is missing is skipped; if no layer at
//! all produced a sprite the result is a single placeholder rectangle, so the
//! surface is never empty.
//!
//! Idle flavor poses shift the whole character: `Alt1` hops up and `Alt2`
//! leans sideways, each by a fraction of the surface extent.

use std::sync::Arc;

use bevy_ecs::prelude::*;

use crate::components::animation::{AnimState, AnimationController, IdleFlavor, Pose};
use crate::components::avatar::Avatar;
use crate::components::loadout::Loadout;
use crate::resources::assetcatalog::AssetCatalog;
use crate::resources::surface::{CharacterSurface, DrawCmd, DrawList, Rect, Rgba};

/// Placeholder body color.
pub const PLACEHOLDER_COLOR: Rgba = Rgba::hex(0x2ecc71);
/// Placeholder body on the reference 128 px surface.
pub const PLACEHOLDER_RECT: Rect = Rect::new(32.0, 16.0, 64.0, 96.0);
const REFERENCE_SIZE: f32 = 128.0;
/// Flavor pose displacement as a fraction of the surface extent.
const FLAVOR_SHIFT: f32 = 1.0 / 16.0;

/// Offset applied to every command for `pose` on a square of `extent` px.
pub fn pose_offset(pose: Pose, extent: f32) -> (f32, f32) {
    let shift = (extent * FLAVOR_SHIFT).round();
    match pose {
        Pose::Walk | Pose::Idle(IdleFlavor::Plain) => (0.0, 0.0),
        Pose::Idle(IdleFlavor::Alt1) => (0.0, -shift),
        Pose::Idle(IdleFlavor::Alt2) => (shift, 0.0),
    }
}

/// Frame path drawn for `key` in the controller's current state.
fn frame_path<'a>(
    catalog: &'a AssetCatalog,
    key: &str,
    anim: &AnimationController,
) -> Option<&'a str> {
    let frames = catalog.manifest()?.sprites.get(key)?;
    let sequence = match (anim.state(), frames.walk.as_deref()) {
        (AnimState::Walk, Some(walk)) if !walk.is_empty() => walk,
        _ => frames.idle.as_slice(),
    };
    let last = sequence.len().checked_sub(1)?;
    let path = sequence[anim.frame_index().min(last)].as_str();
    (!path.is_empty()).then_some(path)
}

/// Build the character draw list for a `width` x `height` surface.
pub fn compose_character(
    catalog: &AssetCatalog,
    loadout: &Loadout,
    anim: &AnimationController,
    width: u32,
    height: u32,
) -> DrawList {
    let extent = width.min(height) as f32;
    let (dx, dy) = pose_offset(anim.pose(), extent);
    let mut list = DrawList::new();
    list.push(DrawCmd::Clear);

    for layer in catalog.layers() {
        let Some(key) = loadout.resolve(layer) else {
            continue;
        };
        let Some(path) = frame_path(catalog, key, anim) else {
            continue;
        };
        if catalog.image(path).is_none() {
            continue;
        }
        list.push(DrawCmd::Sprite {
            path: Arc::from(path),
            dest: Rect::new(0.0, 0.0, extent, extent).offset(dx, dy),
        });
    }

    if !list.iter().any(DrawCmd::is_visible) {
        let scale = extent / REFERENCE_SIZE;
        let r = PLACEHOLDER_RECT;
        let rect = Rect::new(r.x * scale, r.y * scale, r.w * scale, r.h * scale);
        list.push(DrawCmd::FillRect {
            rect: rect.offset(dx, dy),
            color: PLACEHOLDER_COLOR,
        });
    }
    list
}

/// Recompose the avatar onto the [`CharacterSurface`] every tick.
pub fn compose_character_system(
    catalog: Res<AssetCatalog>,
    mut surface: ResMut<CharacterSurface>,
    avatar: Query<(&Loadout, &AnimationController), With<Avatar>>,
) {
    let Ok((loadout, anim)) = avatar.single() else {
        return;
    };
    let (width, height) = (surface.width, surface.height);
    surface.commands = compose_character(&catalog, loadout, anim, width, height);
}
