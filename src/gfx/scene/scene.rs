//! Static OBJ scene
//!
//! Geometry and materials are read with `tobj`, diffuse maps with `image`.
//! Loading is split into a CPU stage ([`ObjData`]) and the upload into a
//! [`Scene`], which owns every buffer and texture it created.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use cgmath::{InnerSpace, Point3, Vector3};

use crate::{
    error::{GlintError, Result},
    gfx::resources::{GpuMaterial, Material, TextureResource},
    wgpu_utils::BindGroupLayoutWithDesc,
};

use super::{mesh::GpuMesh, vertex::Vertex3D};

/// Axis-aligned bounds of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |bounds, p| Self {
                min: std::array::from_fn(|k| bounds.min[k].min(p[k])),
                max: std::array::from_fn(|k| bounds.max[k].max(p[k])),
            },
        ))
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: std::array::from_fn(|k| self.min[k].min(other.min[k])),
            max: std::array::from_fn(|k| self.max[k].max(other.max[k])),
        }
    }

    pub fn center(&self) -> Point3<f32> {
        crate::gfx::lighting::box_center(self.min, self.max)
    }

    pub fn diagonal_length(&self) -> f32 {
        (Vector3::from(self.max) - Vector3::from(self.min)).magnitude()
    }
}

/// Mesh read from the OBJ file, not yet on the GPU.
#[derive(Debug, Clone)]
pub struct ObjMesh {
    pub name: String,
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    /// Index into [`ObjData::materials`]; `None` uses the default material.
    pub material: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ObjMaterial {
    pub name: String,
    pub material: Material,
    pub diffuse_texture: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ObjData {
    pub meshes: Vec<ObjMesh>,
    pub materials: Vec<ObjMaterial>,
    pub bounds: Bounds,
}

impl ObjData {
    pub fn load(path: &Path) -> Result<Self> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| GlintError::Obj {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|err| {
            log::warn!("No usable MTL file for {}: {err}", path.display());
            Vec::new()
        });

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let materials: Vec<ObjMaterial> = materials
            .into_iter()
            .map(|mtl| ObjMaterial {
                material: Material {
                    ambient: mtl.ambient.unwrap_or([0.0; 3]),
                    diffuse: mtl.diffuse.unwrap_or([1.0; 3]),
                    glossy: mtl.specular.unwrap_or([0.0; 3]),
                    shininess: mtl.shininess.unwrap_or(1.0),
                },
                diffuse_texture: mtl
                    .diffuse_texture
                    .filter(|name| !name.is_empty())
                    .map(|name| base_dir.join(name.replace('\\', "/"))),
                name: mtl.name,
            })
            .collect();

        let meshes: Vec<ObjMesh> = models
            .into_iter()
            .map(|model| {
                let mesh = model.mesh;
                let vertex_count = mesh.positions.len() / 3;
                let normals = if mesh.normals.len() == mesh.positions.len() {
                    mesh.normals
                } else {
                    smooth_normals(&mesh.positions, &mesh.indices)
                };

                let vertices = (0..vertex_count)
                    .map(|i| Vertex3D {
                        position: [
                            mesh.positions[3 * i],
                            mesh.positions[3 * i + 1],
                            mesh.positions[3 * i + 2],
                        ],
                        normal: [normals[3 * i], normals[3 * i + 1], normals[3 * i + 2]],
                        tex_coords: if mesh.texcoords.len() >= 2 * (i + 1) {
                            // OBJ has v pointing up, textures are stored top row first
                            [mesh.texcoords[2 * i], 1.0 - mesh.texcoords[2 * i + 1]]
                        } else {
                            [0.0, 0.0]
                        },
                    })
                    .collect();

                ObjMesh {
                    name: model.name,
                    vertices,
                    indices: mesh.indices,
                    material: mesh.material_id.filter(|&id| id < materials.len()),
                }
            })
            .collect();

        let bounds = meshes
            .iter()
            .filter_map(|mesh| Bounds::from_points(mesh.vertices.iter().map(|v| &v.position)))
            .reduce(Bounds::union)
            .unwrap_or(Bounds {
                min: [0.0; 3],
                max: [0.0; 3],
            });

        log::info!(
            "Loaded {}: {} meshes, {} materials, diagonal {:.2}",
            path.display(),
            meshes.len(),
            materials.len(),
            bounds.diagonal_length()
        );

        Ok(Self {
            meshes,
            materials,
            bounds,
        })
    }
}

/// Area-weighted vertex normals for meshes without normals.
pub fn smooth_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex = |i: u32| {
        let i = i as usize * 3;
        Vector3::new(positions[i], positions[i + 1], positions[i + 2])
    };
    let mut accumulated = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len() / 3];

    for tri in indices.chunks_exact(3) {
        let face = (vertex(tri[1]) - vertex(tri[0])).cross(vertex(tri[2]) - vertex(tri[0]));
        for &i in tri {
            accumulated[i as usize] += face;
        }
    }

    accumulated
        .into_iter()
        .flat_map(|n| {
            let n = if n.magnitude2() > 0.0 {
                n.normalize()
            } else {
                Vector3::unit_y()
            };
            [n.x, n.y, n.z]
        })
        .collect()
}

struct SceneMesh {
    mesh: GpuMesh,
    material: usize,
}

/// An OBJ scene uploaded to the GPU.
pub struct Scene {
    meshes: Vec<SceneMesh>,
    materials: Vec<GpuMaterial>,
    bounds: Bounds,
}

impl Scene {
    /// Loads an OBJ file and uploads its meshes, materials and textures.
    ///
    /// Missing diffuse maps fall back to a white texture with a warning.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &BindGroupLayoutWithDesc,
        path: &Path,
    ) -> Result<Self> {
        let data = ObjData::load(path)?;
        Ok(Self::upload(device, queue, material_layout, data))
    }

    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &BindGroupLayoutWithDesc,
        data: ObjData,
    ) -> Self {
        let white = Arc::new(TextureResource::white(device, queue));
        let mut textures: HashMap<PathBuf, Arc<TextureResource>> = HashMap::new();

        let mut materials: Vec<GpuMaterial> = data
            .materials
            .iter()
            .map(|obj_material| {
                let texture = match &obj_material.diffuse_texture {
                    Some(path) => match textures.get(path) {
                        Some(texture) => texture.clone(),
                        None => {
                            let texture = match TextureResource::from_image_file(device, queue, path) {
                                Ok(texture) => Arc::new(texture),
                                Err(err) => {
                                    log::warn!("{err}, using white");
                                    white.clone()
                                }
                            };
                            textures.insert(path.clone(), texture.clone());
                            texture
                        }
                    },
                    None => white.clone(),
                };
                GpuMaterial::new(
                    device,
                    material_layout,
                    &obj_material.material,
                    texture,
                    &obj_material.name,
                )
            })
            .collect();

        let default_material = materials.len();
        materials.push(GpuMaterial::new(
            device,
            material_layout,
            &Material::default(),
            white,
            "Default Material",
        ));

        let meshes = data
            .meshes
            .iter()
            .map(|mesh| SceneMesh {
                mesh: GpuMesh::new(device, &mesh.name, &mesh.vertices, &mesh.indices),
                material: mesh.material.unwrap_or(default_material),
            })
            .collect();

        log::debug!("Uploaded {} scene textures", textures.len());

        Self {
            meshes,
            materials,
            bounds: data.bounds,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn diagonal_length(&self) -> f32 {
        self.bounds.diagonal_length()
    }

    /// Center and radius of the sphere enclosing the bounding box.
    pub fn bounding_sphere(&self) -> (Point3<f32>, f32) {
        (self.bounds.center(), 0.5 * self.bounds.diagonal_length())
    }

    /// Draws every mesh, binding its material at `material_group`.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, material_group: u32) {
        for scene_mesh in &self.meshes {
            pass.set_bind_group(
                material_group,
                self.materials[scene_mesh.material].bind_group(),
                &[],
            );
            scene_mesh.mesh.draw(pass);
        }
    }

    /// Draws geometry only, for depth passes.
    pub fn draw_geometry(&self, pass: &mut wgpu::RenderPass<'_>) {
        for scene_mesh in &self.meshes {
            scene_mesh.mesh.draw(pass);
        }
    }
}

/// World placement of a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneInstance {
    pub position: Vector3<f32>,
}

impl SceneInstance {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
        }
    }

    pub fn model_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bounds_cover_all_points() {
        let points = [[1.0, -2.0, 0.0], [-1.0, 2.0, 3.0], [0.5, 0.0, -3.0]];
        let bounds = Bounds::from_points(points.iter()).unwrap();
        assert_eq!(bounds.min, [-1.0, -2.0, -3.0]);
        assert_eq!(bounds.max, [1.0, 2.0, 3.0]);
        assert!((bounds.diagonal_length() - (4.0f32 + 16.0 + 36.0).sqrt()).abs() < 1e-5);
        assert_eq!(bounds.center(), Point3::new(0.0, 0.0, 0.0));
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn smooth_normals_of_a_flat_quad_point_up() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0, -1.0];
        let normals = smooth_normals(&positions, &[0, 1, 2, 2, 3, 0]);
        for n in normals.chunks(3) {
            assert!((n[1] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn loads_geometry_and_materials_from_obj() {
        let dir = tempfile::tempdir().unwrap();
        let mtl = dir.path().join("quad.mtl");
        std::fs::File::create(&mtl)
            .unwrap()
            .write_all(b"newmtl red\nKa 0.1 0.1 0.1\nKd 1 0 0\nKs 0.5 0.5 0.5\nNs 20\nmap_Kd textures\\red.png\n")
            .unwrap();
        let obj = dir.path().join("quad.obj");
        std::fs::File::create(&obj)
            .unwrap()
            .write_all(
                b"mtllib quad.mtl\no quad\nv 0 0 0\nv 2 0 0\nv 2 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nvn 0 0 1\nusemtl red\nf 1/1/1 2/2/1 3/3/1 4/4/1\n",
            )
            .unwrap();

        let data = ObjData::load(&obj).unwrap();

        assert_eq!(data.meshes.len(), 1);
        assert_eq!(data.meshes[0].indices.len(), 6);
        assert_eq!(data.meshes[0].material, Some(0));
        assert_eq!(data.bounds.max, [2.0, 1.0, 0.0]);
        assert_eq!(data.meshes[0].vertices[0].tex_coords, [0.0, 1.0]);

        let red = &data.materials[0];
        assert_eq!(red.material.diffuse, [1.0, 0.0, 0.0]);
        assert_eq!(red.material.shininess, 20.0);
        assert_eq!(
            red.diffuse_texture.as_deref(),
            Some(dir.path().join("textures/red.png").as_path())
        );
    }

    #[test]
    fn missing_obj_is_an_error() {
        let err = ObjData::load(Path::new("/definitely/not/here.obj")).unwrap_err();
        assert!(matches!(err, GlintError::Obj { .. }));
    }

    #[test]
    fn instance_translates_the_scene() {
        let model = SceneInstance::at(2.0, 0.0, -2.0).model_matrix();
        assert_eq!(model.w.truncate(), Vector3::new(2.0, 0.0, -2.0));
    }
}
