//! Retained scene graph.
//!
//! Every drawable is registered under a [`PrimitiveId`] and owned by whoever
//! holds the handle. Removing a connection is a single `remove_all` over the
//! handles it owns; the renderer only ever reads the graph.

use fnv::FnvHashMap;
use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(u64);

/// Scene layer a primitive belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    /// Unaffected by the globe transform (lights).
    Root,
    /// Child of the tilted, rotating globe group.
    Globe,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Ambient {
        color: [f32; 3],
        intensity: f32,
    },
    Directional {
        color: [f32; 3],
        intensity: f32,
        position: Vec3,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Translucent latitude/longitude wireframe sphere.
    Wireframe {
        radius: f32,
        segments: u32,
        rings: u32,
        color: [f32; 3],
        opacity: f32,
    },
    /// Open polyline; an arc while it is growing.
    Polyline {
        points: Vec<Vec3>,
        color: [f32; 3],
        opacity: f32,
    },
    /// Small sphere marking an arc endpoint.
    Marker {
        center: Vec3,
        radius: f32,
        color: [f32; 3],
        opacity: f32,
    },
    Light(Light),
}

impl Primitive {
    pub fn opacity(&self) -> Option<f32> {
        match self {
            Primitive::Wireframe { opacity, .. }
            | Primitive::Polyline { opacity, .. }
            | Primitive::Marker { opacity, .. } => Some(*opacity),
            Primitive::Light(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub layer: Layer,
    pub primitive: Primitive,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: FnvHashMap<PrimitiveId, SceneNode>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, layer: Layer, primitive: Primitive) -> PrimitiveId {
        let id = PrimitiveId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, SceneNode { layer, primitive });
        id
    }

    #[inline]
    pub fn add_to_globe(&mut self, primitive: Primitive) -> PrimitiveId {
        self.add(Layer::Globe, primitive)
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.nodes.get(&id).map(|n| &n.primitive)
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Set the opacity of a drawable primitive; lights and stale handles are ignored.
    pub fn set_opacity(&mut self, id: PrimitiveId, value: f32) {
        if let Some(node) = self.nodes.get_mut(&id) {
            match &mut node.primitive {
                Primitive::Wireframe { opacity, .. }
                | Primitive::Polyline { opacity, .. }
                | Primitive::Marker { opacity, .. } => *opacity = value.clamp(0.0, 1.0),
                Primitive::Light(_) => {}
            }
        }
    }

    /// Replace the points of a polyline with `points`.
    pub fn set_polyline(&mut self, id: PrimitiveId, points: &[Vec3]) {
        if let Some(SceneNode {
            primitive: Primitive::Polyline { points: dst, .. },
            ..
        }) = self.nodes.get_mut(&id)
        {
            dst.clear();
            dst.extend_from_slice(points);
        }
    }

    pub fn remove(&mut self, id: PrimitiveId) -> Option<Primitive> {
        self.nodes.remove(&id).map(|n| n.primitive)
    }

    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = PrimitiveId>) {
        for id in ids {
            self.nodes.remove(&id);
        }
    }

    /// Drop every primitive (used on teardown).
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion order, so draw order is stable across frames.
    pub fn nodes(&self) -> Vec<(PrimitiveId, &SceneNode)> {
        let mut out: Vec<_> = self.nodes.iter().map(|(id, n)| (*id, n)).collect();
        out.sort_unstable_by_key(|(id, _)| *id);
        out
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.nodes.values().filter_map(|n| match &n.primitive {
            Primitive::Light(l) => Some(l),
            _ => None,
        })
    }
}
