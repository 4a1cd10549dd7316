pub mod mesh;
pub mod scene;
pub mod vertex;

pub use mesh::GpuMesh;
pub use scene::{Bounds, ObjData, Scene, SceneInstance};
pub use vertex::Vertex3D;
