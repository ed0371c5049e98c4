//! Positioned nodes handed to the renderer.
//!
//! The tree only decides where pieces go; drawing them is the sink's business.

use crate::model::Side;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    TrunkBase {
        x: f64,
        bottom_y: f64,
        height: f64,
    },
    TrunkSegment {
        index: usize,
        texture: String,
        x: f64,
        bottom_y: f64,
        height: f64,
    },
    Branch {
        index: usize,
        variant: &'static str,
        x: f64,
        y: f64,
        angle_deg: f64,
        scale: f64,
        side: Side,
    },
}

pub trait SceneSink {
    fn insert(&mut self, node: SceneNode);
}

/// Discards every node (headless runs).
impl SceneSink for () {
    fn insert(&mut self, _node: SceneNode) {}
}

/// Keeps every node in insertion order.
#[derive(Debug, Default, Clone)]
pub struct SceneLog {
    nodes: Vec<SceneNode>,
}

impl SceneLog {
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn branch_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, SceneNode::Branch { .. }))
            .count()
    }

    pub fn trunk_segment_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, SceneNode::TrunkSegment { .. }))
            .count()
    }
}

impl SceneSink for SceneLog {
    fn insert(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }
}
