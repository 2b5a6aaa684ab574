use glam::{UVec2, Vec2};

use crate::frame::config::FrameConfig;

/// Display tint of the frame outline while inactive (RGBA).
pub const INACTIVE_TINT: [u8; 4] = [255, 255, 0, 100];
/// Display tint of the frame outline while active (RGBA).
pub const ACTIVE_TINT: [u8; 4] = [0, 255, 0, 150];

/// Axis-aligned world rectangle of the frame. Corners sit on the integer
/// tile lattice whenever the anchor does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl FrameBounds {
    /// Rectangle of `size` tiles around `anchor`, halving the size in
    /// integers so odd sizes stay on the lattice.
    pub fn around(anchor: Vec2, size: UVec2) -> Self {
        let min = anchor - (size / 2).as_vec2();
        Self {
            min,
            max: min + size.as_vec2(),
        }
    }

    /// Inclusive containment on both axes.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Pull a point that slipped past one side back in by one frame size.
    pub fn wrap_into(&self, p: Vec2) -> Vec2 {
        let size = self.size();
        let mut out = p;
        if out.x < self.min.x {
            out.x += size.x;
        } else if out.x > self.max.x {
            out.x -= size.x;
        }
        if out.y < self.min.y {
            out.y += size.y;
        } else if out.y > self.max.y {
            out.y -= size.y;
        }
        out
    }
}

/// The looping rectangle: size, anchor, activation flags and the bounds
/// frozen for the current activation.
#[derive(Debug, Clone)]
pub struct Region {
    size: UVec2,
    anchor: Vec2,
    frozen: Option<FrameBounds>,
    pub(crate) active: bool,
    pub(crate) usable: bool,
}

impl Region {
    pub fn new(size: UVec2, anchor: Vec2) -> Self {
        Self {
            size,
            anchor,
            frozen: None,
            active: false,
            usable: true,
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_usable(&self) -> bool {
        self.usable
    }

    /// Bounds frozen at activation, if active.
    pub fn frozen(&self) -> Option<FrameBounds> {
        self.frozen
    }

    /// Frozen bounds while active, otherwise the rectangle around the anchor.
    pub fn rect(&self) -> FrameBounds {
        self.frozen
            .unwrap_or_else(|| FrameBounds::around(self.anchor, self.size))
    }

    /// Follow the actor: anchor at its position plus the stance offset,
    /// rounded half away from zero onto the lattice.
    pub fn track(&mut self, actor_pos: Vec2, crouching: bool, config: &FrameConfig) {
        let offset = if crouching {
            config.crouch_y_offset
        } else {
            config.y_offset
        };
        self.anchor = (actor_pos + Vec2::new(0.0, offset)).round();
    }

    pub(crate) fn freeze(&mut self) -> FrameBounds {
        let bounds = FrameBounds::around(self.anchor, self.size);
        self.frozen = Some(bounds);
        bounds
    }

    pub(crate) fn release(&mut self) {
        self.frozen = None;
    }

    /// Outline tint for the host renderer.
    pub fn tint(&self) -> [u8; 4] {
        if self.active {
            ACTIVE_TINT
        } else {
            INACTIVE_TINT
        }
    }

    /// Whether the host should clip sprites against the frame rectangle.
    pub fn mask_enabled(&self) -> bool {
        self.frozen.is_some()
    }
}
