/// Identifies which texture atlas a sprite belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AtlasId(pub u32);

/// How a sprite interacts with the frame's sprite mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskInteraction {
    /// Ignores the mask entirely.
    None,
    /// Drawn only outside the frame rectangle (regular world bodies).
    #[default]
    VisibleOutsideMask,
    /// Drawn only inside the frame rectangle (bodies looping inside an active frame).
    VisibleInsideMask,
}

/// How an entity appears visually.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteComponent {
    /// Which atlas this sprite belongs to.
    pub atlas: AtlasId,
    /// Column in the atlas grid.
    pub col: f32,
    /// Row in the atlas grid.
    pub row: f32,
    /// Opacity (0.0 = invisible, 1.0 = opaque).
    pub alpha: f32,
    /// Mask interaction, switched by the frame on activation edges.
    pub mask: MaskInteraction,
}

impl Default for SpriteComponent {
    fn default() -> Self {
        Self {
            atlas: AtlasId(0),
            col: 0.0,
            row: 0.0,
            alpha: 1.0,
            mask: MaskInteraction::VisibleOutsideMask,
        }
    }
}
