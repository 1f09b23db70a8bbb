use kurbo::Vec2;

use crate::config::LayerPositioning;

/// One background layer, displaced vertically by the smoothed scroll offset
/// scaled by its speed coefficient. Coefficients below 1 read as depth
/// (slower than the content); decorative layers can run above 1.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ParallaxLayer {
    pub name: String,
    pub speed: f64,
}

/// A cursor-reactive decoration. `sway` is the maximum displacement in pixels
/// at full cursor deflection, per axis.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Decoration {
    pub name: String,
    pub sway: Vec2,
}

/// Layer displacement expressed in the host's preferred positioning idiom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerPlacement {
    /// Apply as a 2-D translation (GPU-compositable).
    Translate(Vec2),
    /// Apply as a top margin in pixels (layout-driven).
    MarginTop(f64),
}

pub fn layer_placement(
    layer: &ParallaxLayer,
    smooth_offset: f64,
    positioning: LayerPositioning,
) -> LayerPlacement {
    let shift = -smooth_offset * layer.speed;
    match positioning {
        LayerPositioning::Transform => LayerPlacement::Translate(Vec2::new(0.0, shift)),
        LayerPositioning::Margin => LayerPlacement::MarginTop(shift),
    }
}

/// Clamp a raw pointer offset into the normalized `[-1, 1]²` square.
pub fn clamp_cursor(raw: Vec2) -> Vec2 {
    Vec2::new(raw.x.clamp(-1.0, 1.0), raw.y.clamp(-1.0, 1.0))
}

pub fn decoration_offset(decoration: &Decoration, cursor: Vec2) -> Vec2 {
    Vec2::new(cursor.x * decoration.sway.x, cursor.y * decoration.sway.y)
}
