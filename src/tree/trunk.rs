use serde::Deserialize;

/// Trunk piece sprite metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrunkTexture {
    pub name: String,
    pub height: f64,
}

/// One placed trunk piece. `bottom` and `top` are y coordinates; `top < bottom`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrunkSegment {
    pub index: usize,
    pub texture: usize,
    pub bottom: f64,
    pub top: f64,
}

/// Guards the growth loop against degenerate sprite metadata.
const MIN_SEGMENT_HEIGHT: f64 = 1.0;

/// Append-only stack of trunk pieces above the trunk base.
///
/// Pieces alternate between the two textures by index parity. Up is negative y, so growing
/// the stack only ever moves [`current_top`](Self::current_top) further into negative y.
#[derive(Debug, Clone)]
pub struct TrunkStack {
    textures: [TrunkTexture; 2],
    base_top: f64,
    segments: Vec<TrunkSegment>,
}

impl TrunkStack {
    /// Empty stack sitting on a base whose top is at `base_top`.
    pub fn new(base_top: f64, textures: [TrunkTexture; 2]) -> Self {
        Self {
            textures,
            base_top,
            segments: Vec::new(),
        }
    }

    pub fn segments(&self) -> &[TrunkSegment] {
        &self.segments
    }

    pub fn texture(&self, index: usize) -> &TrunkTexture {
        &self.textures[index % 2]
    }

    pub fn current_top(&self) -> f64 {
        self.segments.last().map_or(self.base_top, |s| s.top)
    }

    /// Append pieces until the top reaches `required_top` (is at or above it on screen).
    ///
    /// Returns the pieces appended by this call.
    pub fn grow_if_needed(&mut self, required_top: f64) -> &[TrunkSegment] {
        let start = self.segments.len();
        while self.current_top() > required_top {
            let index = self.segments.len();
            let texture = index % 2;
            let bottom = self.current_top();
            let height = self.textures[texture].height.max(MIN_SEGMENT_HEIGHT);
            self.segments.push(TrunkSegment {
                index,
                texture,
                bottom,
                top: bottom - height,
            });
        }
        &self.segments[start..]
    }
}
