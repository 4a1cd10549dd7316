//! Plain scene graph derived from a glTF document
//!
//! Only what drawing needs is kept: scenes with their root nodes, node
//! transforms with their mesh and children, and each mesh's range in the
//! flat list of primitives. GPU handles are indexed parallel to that list.

use std::ops::Range;

use cgmath::{Matrix4, SquareMatrix};

#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub local: Matrix4<f32>,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            local: Matrix4::identity(),
            mesh: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshData {
    /// Indices into the flat primitive list.
    pub primitives: Range<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelGraph {
    /// Root nodes of each scene.
    pub scenes: Vec<Vec<usize>>,
    pub default_scene: Option<usize>,
    pub nodes: Vec<NodeData>,
    pub meshes: Vec<MeshData>,
    pub primitive_count: usize,
}

impl ModelGraph {
    pub fn from_document(document: &gltf::Document) -> Self {
        let mut primitive_count = 0;
        let meshes = document
            .meshes()
            .map(|mesh| {
                let start = primitive_count;
                primitive_count += mesh.primitives().len();
                MeshData {
                    primitives: start..primitive_count,
                }
            })
            .collect();

        let nodes = document
            .nodes()
            .map(|node| NodeData {
                local: Matrix4::from(node.transform().matrix()),
                mesh: node.mesh().map(|mesh| mesh.index()),
                children: node.children().map(|child| child.index()).collect(),
            })
            .collect();

        let scenes = document
            .scenes()
            .map(|scene| scene.nodes().map(|node| node.index()).collect())
            .collect();

        Self {
            scenes,
            default_scene: document.default_scene().map(|scene| scene.index()),
            nodes,
            meshes,
            primitive_count,
        }
    }

    /// The default scene, or the first one when none is marked default.
    pub fn active_scene(&self) -> Option<usize> {
        self.default_scene
            .filter(|&scene| scene < self.scenes.len())
            .or_else(|| (!self.scenes.is_empty()).then_some(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    /// A primitive of the node's own mesh, with its base-color texture.
    Mesh,
    /// Redraw of a model primitive after a node's mesh, untextured.
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub primitive: usize,
    pub model: Matrix4<f32>,
    pub kind: DrawKind,
}

/// Walks the active scene depth first, composing `world = parent · local`.
///
/// With `replay` set, every node that has a mesh is followed by a redraw of
/// all primitives of the model with that node's transform.
pub fn traverse(graph: &ModelGraph, replay: bool) -> Vec<DrawCall> {
    let mut draws = Vec::new();
    let Some(scene) = graph.active_scene() else {
        return draws;
    };

    // (node, parent world matrix)
    let mut stack: Vec<(usize, Matrix4<f32>)> = graph.scenes[scene]
        .iter()
        .rev()
        .map(|&root| (root, Matrix4::identity()))
        .collect();

    while let Some((index, parent)) = stack.pop() {
        let Some(node) = graph.nodes.get(index) else {
            log::warn!("Skipping missing node {index}");
            continue;
        };
        let world = parent * node.local;

        if let Some(mesh) = node.mesh.and_then(|mesh| graph.meshes.get(mesh)) {
            draws.extend(mesh.primitives.clone().map(|primitive| DrawCall {
                primitive,
                model: world,
                kind: DrawKind::Mesh,
            }));
            if replay {
                draws.extend((0..graph.primitive_count).map(|primitive| DrawCall {
                    primitive,
                    model: world,
                    kind: DrawKind::Replay,
                }));
            }
        }

        stack.extend(node.children.iter().rev().map(|&child| (child, world)));
    }

    draws
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, InnerSpace, Point3, Transform, Vector3};

    fn node(local: Matrix4<f32>, mesh: Option<usize>, children: Vec<usize>) -> NodeData {
        NodeData {
            local,
            mesh,
            children,
        }
    }

    /// Root translated by (10, 0, 0) with three children, each drawing mesh 0.
    fn three_children() -> ModelGraph {
        ModelGraph {
            scenes: vec![vec![0]],
            default_scene: Some(0),
            nodes: vec![
                node(Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)), None, vec![1, 2, 3]),
                node(Matrix4::from_angle_z(Deg(90.0)), Some(0), vec![]),
                node(Matrix4::from_scale(2.0), Some(0), vec![]),
                node(Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0)), Some(0), vec![]),
            ],
            meshes: vec![MeshData { primitives: 0..1 }],
            primitive_count: 1,
        }
    }

    #[test]
    fn visits_every_child() {
        let draws = traverse(&three_children(), false);
        assert_eq!(draws.len(), 3);
        assert!(draws.iter().all(|d| d.kind == DrawKind::Mesh && d.primitive == 0));
    }

    #[test]
    fn composes_parent_then_local() {
        let draws = traverse(&three_children(), false);
        let p = Point3::new(1.0, 0.0, 0.0);

        // rotate first, then translate: (1,0,0) -> (0,1,0) -> (10,1,0)
        let rotated = draws[0].model.transform_point(p);
        assert!((rotated - Point3::new(10.0, 1.0, 0.0)).magnitude() < 1e-5);

        let scaled = draws[1].model.transform_point(p);
        assert!((scaled - Point3::new(12.0, 0.0, 0.0)).magnitude() < 1e-5);

        let translated = draws[2].model.transform_point(p);
        assert!((translated - Point3::new(11.0, 1.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn accumulates_through_deep_chains() {
        let step = Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0));
        let graph = ModelGraph {
            scenes: vec![vec![0]],
            default_scene: None,
            nodes: vec![
                node(step, None, vec![1]),
                node(step, None, vec![2]),
                node(step * Matrix4::from_scale(3.0), Some(0), vec![]),
            ],
            meshes: vec![MeshData { primitives: 0..2 }],
            primitive_count: 2,
        };
        let draws = traverse(&graph, false);
        assert_eq!(draws.len(), 2);
        let origin = draws[0].model.transform_point(Point3::new(1.0, 0.0, 0.0));
        assert!((origin - Point3::new(6.0, 0.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn replay_redraws_the_whole_model_after_each_mesh() {
        let mut graph = three_children();
        graph.meshes.push(MeshData { primitives: 1..3 });
        graph.primitive_count = 3;
        graph.nodes[2].mesh = Some(1);

        let draws = traverse(&graph, true);
        // child 1: 1 + 3, child 2: 2 + 3, child 3: 1 + 3
        assert_eq!(draws.len(), 13);
        let replays: Vec<_> = draws.iter().filter(|d| d.kind == DrawKind::Replay).collect();
        assert_eq!(replays.len(), 9);
        assert_eq!(draws[1].model, draws[0].model);
    }

    #[test]
    fn falls_back_to_first_scene() {
        let mut graph = three_children();
        graph.default_scene = None;
        assert_eq!(graph.active_scene(), Some(0));
        graph.default_scene = Some(7);
        assert_eq!(graph.active_scene(), Some(0));
        assert!(traverse(&ModelGraph::default(), true).is_empty());
    }
}
