//! Short-lived text popped over the overlay, e.g. a dice result.

use bevy_ecs::prelude::Component;

/// Seconds a floating text stays on screen.
pub const FLOATING_TEXT_SECS: f32 = 2.0;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct FloatingText {
    pub text: String,
    /// Critical results are drawn highlighted.
    pub critical: bool,
    /// Window position of the text's top-left corner.
    pub x: f32,
    pub y: f32,
}

impl FloatingText {
    /// Place `text` at a random spot around the middle of a `width` x `height` window.
    pub fn scattered(text: impl Into<String>, critical: bool, width: u32, height: u32) -> Self {
        FloatingText {
            text: text.into(),
            critical,
            x: width as f32 / 2.0 - 50.0 + fastrand::f32() * 100.0,
            y: height as f32 / 2.0 + fastrand::f32() * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scattered_stays_near_center() {
        for _ in 0..100 {
            let text = FloatingText::scattered("20!", true, 480, 320);
            assert!((190.0..=290.0).contains(&text.x));
            assert!((160.0..=260.0).contains(&text.y));
        }
    }
}
