//! glTF models uploaded to the GPU
//!
//! Every glTF buffer is uploaded once and primitives bind their attributes
//! straight out of it using the accessor offset and stride. Attributes the
//! vertex stage cannot read in place (missing, not 32-bit float, or not
//! 4-byte aligned) are repacked into a buffer owned by the primitive.

use std::{collections::HashMap, path::Path, sync::Arc};

use gltf::{
    accessor::{DataType, Dimensions},
    mesh::Mode,
    Semantic,
};
use wgpu::util::DeviceExt;

use crate::{
    error::{GlintError, Result},
    gfx::{
        programs::{gltf_forward::MATERIAL_GROUP, GltfForwardProgram, PrimitivePipelineKey},
        rendering::{PipelineManager, VertexLayout},
        resources::{GpuMaterial, Material, TextureResource},
    },
};

use super::graph::{DrawCall, DrawKind, ModelGraph};

/// Maps a glTF primitive mode to a wgpu topology. Fans are drawn as
/// triangle lists and loops as line strips once their indices are rewritten
/// by [`rewrite_indices`].
pub fn primitive_topology(mode: Mode) -> wgpu::PrimitiveTopology {
    match mode {
        Mode::Triangles | Mode::TriangleFan => wgpu::PrimitiveTopology::TriangleList,
        Mode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Mode::Points => wgpu::PrimitiveTopology::PointList,
        Mode::Lines => wgpu::PrimitiveTopology::LineList,
        Mode::LineStrip | Mode::LineLoop => wgpu::PrimitiveTopology::LineStrip,
    }
}

/// Index list drawing `mode` with the topology [`primitive_topology`] picks,
/// or `None` when the source indices can be used as they are.
pub fn rewrite_indices(mode: Mode, indices: &[u32]) -> Option<Vec<u32>> {
    match mode {
        Mode::TriangleFan => Some(
            indices
                .windows(2)
                .skip(1)
                .flat_map(|edge| [indices[0], edge[0], edge[1]])
                .collect(),
        ),
        Mode::LineLoop => Some(indices.iter().chain(indices.first()).copied().collect()),
        _ => None,
    }
}

/// Expands 8-bit images with one to four channels to RGBA. Missing color
/// channels read as zero and a missing alpha as opaque.
pub fn rgba8_pixels(format: gltf::image::Format, pixels: &[u8]) -> Option<Vec<u8>> {
    use gltf::image::Format;

    let channels = match format {
        Format::R8 => 1,
        Format::R8G8 => 2,
        Format::R8G8B8 => 3,
        Format::R8G8B8A8 => return Some(pixels.to_vec()),
        _ => return None,
    };
    Some(
        pixels
            .chunks_exact(channels)
            .flat_map(|texel| {
                let mut rgba = [0, 0, 0, 255];
                rgba[..channels].copy_from_slice(texel);
                rgba
            })
            .collect(),
    )
}

struct AttributeSpec {
    semantic: Semantic,
    location: u32,
    format: wgpu::VertexFormat,
    dimensions: Dimensions,
}

fn attribute_specs() -> [AttributeSpec; 3] {
    [
        AttributeSpec {
            semantic: Semantic::Positions,
            location: 0,
            format: wgpu::VertexFormat::Float32x3,
            dimensions: Dimensions::Vec3,
        },
        AttributeSpec {
            semantic: Semantic::Normals,
            location: 1,
            format: wgpu::VertexFormat::Float32x3,
            dimensions: Dimensions::Vec3,
        },
        AttributeSpec {
            semantic: Semantic::TexCoords(0),
            location: 2,
            format: wgpu::VertexFormat::Float32x2,
            dimensions: Dimensions::Vec2,
        },
    ]
}

enum BufferSource {
    /// Index into the uploaded glTF buffers.
    Shared(usize),
    Owned(wgpu::Buffer),
}

struct BufferRange {
    source: BufferSource,
    offset: u64,
}

struct IndexData {
    range: BufferRange,
    format: wgpu::IndexFormat,
    count: u32,
}

pub struct GpuPrimitive {
    vertex_buffers: Vec<BufferRange>,
    indices: Option<IndexData>,
    vertex_count: u32,
    key: PrimitivePipelineKey,
    /// Base-color image, if the material has one.
    image: Option<usize>,
}

impl GpuPrimitive {
    pub fn key(&self) -> &PrimitivePipelineKey {
        &self.key
    }
}

/// Byte offset and stride of an accessor that the vertex stage can read in place.
fn in_place_binding(accessor: &gltf::Accessor<'_>, dimensions: Dimensions) -> Option<(usize, u64, u64)> {
    if accessor.data_type() != DataType::F32
        || accessor.dimensions() != dimensions
        || accessor.normalized()
        || accessor.sparse().is_some()
    {
        return None;
    }
    let view = accessor.view()?;
    let offset = (view.offset() + accessor.offset()) as u64;
    let stride = view.stride().unwrap_or_else(|| accessor.size()) as u64;
    let aligned = offset % wgpu::VERTEX_STRIDE_ALIGNMENT == 0 && stride % wgpu::VERTEX_STRIDE_ALIGNMENT == 0;
    aligned.then_some((view.buffer().index(), offset, stride))
}

fn create_owned(device: &wgpu::Device, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> BufferRange {
    BufferRange {
        source: BufferSource::Owned(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        })),
        offset: 0,
    }
}

struct PrimitiveBuilder<'a> {
    device: &'a wgpu::Device,
    buffers: &'a [gltf::buffer::Data],
}

impl PrimitiveBuilder<'_> {
    fn build(&self, primitive: &gltf::Primitive<'_>, label: &str) -> Result<Option<GpuPrimitive>> {
        let mode = primitive.mode();
        let topology = primitive_topology(mode);

        let Some(positions) = primitive.get(&Semantic::Positions) else {
            log::warn!("{label} has no positions, skipping");
            return Ok(None);
        };
        let vertex_count = positions.count();
        let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).map(|data| &data.0[..]));

        let mut vertex_buffers = Vec::new();
        let mut vertex_layouts = Vec::new();
        for spec in attribute_specs() {
            let accessor = primitive.get(&spec.semantic);
            if let Some((buffer, offset, stride)) =
                accessor.as_ref().and_then(|a| in_place_binding(a, spec.dimensions))
            {
                vertex_buffers.push(BufferRange {
                    source: BufferSource::Shared(buffer),
                    offset,
                });
                vertex_layouts.push(VertexLayout::single(stride, spec.format, spec.location));
                continue;
            }

            let contents: Vec<u8> = match spec.semantic {
                Semantic::Positions => {
                    let data: Vec<[f32; 3]> = reader.read_positions().map(|it| it.collect()).unwrap_or_default();
                    bytemuck::cast_slice(&padded(data, vertex_count, [0.0; 3])).to_vec()
                }
                Semantic::Normals => {
                    let data: Vec<[f32; 3]> = reader.read_normals().map(|it| it.collect()).unwrap_or_default();
                    bytemuck::cast_slice(&padded(data, vertex_count, [0.0, 0.0, 1.0])).to_vec()
                }
                _ => {
                    let data: Vec<[f32; 2]> = reader
                        .read_tex_coords(0)
                        .map(|it| it.into_f32().collect())
                        .unwrap_or_default();
                    bytemuck::cast_slice(&padded(data, vertex_count, [0.0; 2])).to_vec()
                }
            };
            log::debug!("{label}: repacked attribute at location {}", spec.location);
            vertex_buffers.push(create_owned(
                self.device,
                &format!("{label} Attribute {}", spec.location),
                &contents,
                wgpu::BufferUsages::VERTEX,
            ));
            vertex_layouts.push(VertexLayout::single(spec.format.size(), spec.format, spec.location));
        }

        let rewritten = matches!(mode, Mode::TriangleFan | Mode::LineLoop)
            .then(|| match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<_>>(),
                None => (0..vertex_count as u32).collect(),
            })
            .and_then(|source| rewrite_indices(mode, &source));
        if rewritten.as_ref().is_some_and(Vec::is_empty) {
            log::warn!("{label} has too few vertices for {mode:?}, skipping");
            return Ok(None);
        }

        let indices = if let Some(values) = rewritten {
            log::debug!("{label}: rewrote {mode:?} into {} indices", values.len());
            Some(IndexData {
                range: create_owned(
                    self.device,
                    &format!("{label} Indices"),
                    bytemuck::cast_slice(&values),
                    wgpu::BufferUsages::INDEX,
                ),
                format: wgpu::IndexFormat::Uint32,
                count: values.len() as u32,
            })
        } else {
            primitive.indices().and_then(|accessor| {
                let count = accessor.count() as u32;
                let in_place = accessor.view().filter(|_| accessor.sparse().is_none()).and_then(|view| {
                    let offset = (view.offset() + accessor.offset()) as u64;
                    let format = match accessor.data_type() {
                        DataType::U16 => wgpu::IndexFormat::Uint16,
                        DataType::U32 => wgpu::IndexFormat::Uint32,
                        _ => return None,
                    };
                    (offset % format.byte_size() as u64 == 0).then_some(IndexData {
                        range: BufferRange {
                            source: BufferSource::Shared(view.buffer().index()),
                            offset,
                        },
                        format,
                        count,
                    })
                });
                in_place.or_else(|| {
                    let values: Vec<u32> = reader.read_indices()?.into_u32().collect();
                    let label = format!("{label} Indices");
                    Some(if accessor.data_type() == DataType::U32 {
                        IndexData {
                            range: create_owned(self.device, &label, bytemuck::cast_slice(&values), wgpu::BufferUsages::INDEX),
                            format: wgpu::IndexFormat::Uint32,
                            count,
                        }
                    } else {
                        let values: Vec<u16> = values.into_iter().map(|i| i as u16).collect();
                        IndexData {
                            range: create_owned(self.device, &label, bytemuck::cast_slice(&values), wgpu::BufferUsages::INDEX),
                            format: wgpu::IndexFormat::Uint16,
                            count,
                        }
                    })
                })
            })
        };

        let strip_index_format = indices
            .as_ref()
            .filter(|_| topology.is_strip())
            .map(|indices| indices.format);
        let image = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_texture()
            .map(|info| info.texture().source().index());

        Ok(Some(GpuPrimitive {
            vertex_buffers,
            indices,
            vertex_count: vertex_count as u32,
            key: PrimitivePipelineKey {
                topology,
                strip_index_format,
                vertex_layouts,
            },
            image,
        }))
    }
}

fn padded<T: Copy>(mut data: Vec<T>, len: usize, fill: T) -> Vec<T> {
    data.resize(len, fill);
    data
}

fn log_summary(path: &Path, document: &gltf::Document) {
    log::info!(
        "Loaded {}: {} accessors, {} animations, {} buffers, {} buffer views, {} materials, \
         {} meshes, {} nodes, {} textures, {} images, {} skins, {} samplers, {} cameras, {} scenes",
        path.display(),
        document.accessors().count(),
        document.animations().count(),
        document.buffers().count(),
        document.views().count(),
        document.materials().count(),
        document.meshes().count(),
        document.nodes().count(),
        document.textures().count(),
        document.images().count(),
        document.skins().count(),
        document.samplers().count(),
        document.cameras().count(),
        document.scenes().count(),
    );
}

type ImportedDocument = (gltf::Document, Vec<gltf::buffer::Data>, Vec<gltf::image::Data>);

/// Reads a glTF file with its buffers and images. Unreadable or malformed
/// files are logged and give `None`, except for primitive modes outside the
/// glTF set which are a hard error.
fn import_document(path: &Path) -> Result<Option<ImportedDocument>> {
    match gltf::import(path) {
        Ok(imported) => Ok(Some(imported)),
        Err(source) => {
            if let gltf::Error::Validation(errors) = &source {
                if let Some((at, _)) = errors.iter().find(|(at, _)| at.as_str().ends_with(".mode")) {
                    return Err(GlintError::UnsupportedPrimitiveMode {
                        path: path.to_path_buf(),
                        location: at.as_str().to_owned(),
                    });
                }
            }
            let reason = source.to_string();
            let err = GlintError::Gltf {
                path: path.to_path_buf(),
                source,
            };
            log::error!("{err}: {reason}");
            Ok(None)
        }
    }
}

pub struct GpuModel {
    graph: ModelGraph,
    buffers: Vec<wgpu::Buffer>,
    /// Parallel to the graph's flat primitive list.
    primitives: Vec<Option<GpuPrimitive>>,
    materials: HashMap<usize, GpuMaterial>,
    fallback: GpuMaterial,
}

impl GpuModel {
    /// Loads and uploads a glTF file, preparing a pipeline for every
    /// primitive layout.
    ///
    /// A file that cannot be read or parsed is logged and yields an empty
    /// model. A primitive mode outside the glTF set is a hard error.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        manager: &PipelineManager,
        program: &mut GltfForwardProgram,
        path: &Path,
    ) -> Result<Self> {
        let fallback = GpuMaterial::new(
            device,
            program.material_layout(),
            &Material::default(),
            Arc::new(TextureResource::white(device, queue)),
            "glTF Fallback Material",
        );

        let Some((document, buffer_data, images)) = import_document(path)? else {
            return Ok(Self {
                graph: ModelGraph::default(),
                buffers: Vec::new(),
                primitives: Vec::new(),
                materials: HashMap::new(),
                fallback,
            });
        };
        log_summary(path, &document);

        let buffers = buffer_data
            .iter()
            .enumerate()
            .map(|(index, data)| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("glTF Buffer {index}")),
                    contents: &data.0,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::INDEX,
                })
            })
            .collect();

        let builder = PrimitiveBuilder {
            device,
            buffers: &buffer_data,
        };
        let mut primitives = Vec::new();
        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let label = format!("Mesh {} Primitive {}", mesh.index(), primitive.index());
                primitives.push(builder.build(&primitive, &label)?);
            }
        }

        for primitive in primitives.iter().flatten() {
            program.prepare_pipeline(manager, primitive.key())?;
        }

        let mut materials = HashMap::new();
        for image_index in primitives.iter().flatten().filter_map(|p| p.image) {
            if materials.contains_key(&image_index) {
                continue;
            }
            let Some(image) = images.get(image_index) else {
                continue;
            };
            let Some(pixels) = rgba8_pixels(image.format, &image.pixels) else {
                log::warn!("Image {image_index} has unsupported format {:?}", image.format);
                continue;
            };
            let label = format!("glTF Image {image_index}");
            let texture = TextureResource::create_from_rgba_data(
                device,
                queue,
                &pixels,
                image.width,
                image.height,
                &label,
            );
            materials.insert(
                image_index,
                GpuMaterial::new(
                    device,
                    program.material_layout(),
                    &Material::default(),
                    Arc::new(texture),
                    &label,
                ),
            );
        }

        log::info!(
            "Uploaded {} primitives, {} textures, {} pipelines",
            primitives.iter().flatten().count(),
            materials.len(),
            program.pipeline_count()
        );

        Ok(Self {
            graph: ModelGraph::from_document(&document),
            buffers,
            primitives,
            materials,
            fallback,
        })
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    fn buffer<'a>(&'a self, range: &'a BufferRange) -> Option<wgpu::BufferSlice<'a>> {
        let buffer = match &range.source {
            BufferSource::Shared(index) => self.buffers.get(*index)?,
            BufferSource::Owned(buffer) => buffer,
        };
        Some(buffer.slice(range.offset..))
    }

    /// Records `draws`; draw `i` uses object uniform slot `i`.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        program: &GltfForwardProgram,
        draws: &[DrawCall],
    ) -> Result<()> {
        program.bind(pass);
        for (slot, draw) in draws.iter().enumerate() {
            let Some(Some(primitive)) = self.primitives.get(draw.primitive) else {
                continue;
            };
            program.bind_primitive(pass, primitive.key(), slot)?;

            let material = match draw.kind {
                DrawKind::Mesh => primitive.image.and_then(|image| self.materials.get(&image)),
                DrawKind::Replay => None,
            };
            pass.set_bind_group(MATERIAL_GROUP, material.unwrap_or(&self.fallback).bind_group(), &[]);

            for (location, range) in primitive.vertex_buffers.iter().enumerate() {
                if let Some(slice) = self.buffer(range) {
                    pass.set_vertex_buffer(location as u32, slice);
                }
            }
            match &primitive.indices {
                Some(indices) => {
                    if let Some(slice) = self.buffer(&indices.range) {
                        pass.set_index_buffer(slice, indices.format);
                        pass.draw_indexed(0..indices.count, 0, 0..1);
                    }
                }
                None => pass.draw(0..primitive.vertex_count, 0..1),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::gltf_model::traverse;
    use gltf::image::Format;

    #[test]
    fn modes_map_to_topologies() {
        assert_eq!(primitive_topology(Mode::Triangles), wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(primitive_topology(Mode::LineStrip), wgpu::PrimitiveTopology::LineStrip);
        assert_eq!(primitive_topology(Mode::Points), wgpu::PrimitiveTopology::PointList);
        assert_eq!(primitive_topology(Mode::TriangleFan), wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(primitive_topology(Mode::LineLoop), wgpu::PrimitiveTopology::LineStrip);
    }

    #[test]
    fn fans_become_triangle_lists() {
        assert_eq!(
            rewrite_indices(Mode::TriangleFan, &[0, 1, 2, 3, 4]).unwrap(),
            vec![0, 1, 2, 0, 2, 3, 0, 3, 4]
        );
        assert_eq!(rewrite_indices(Mode::TriangleFan, &[7, 3, 5]).unwrap(), vec![7, 3, 5]);
        assert!(rewrite_indices(Mode::TriangleFan, &[0, 1]).unwrap().is_empty());
    }

    #[test]
    fn loops_are_closed_into_strips() {
        assert_eq!(rewrite_indices(Mode::LineLoop, &[4, 5, 6]).unwrap(), vec![4, 5, 6, 4]);
        assert!(rewrite_indices(Mode::LineLoop, &[]).unwrap().is_empty());
    }

    #[test]
    fn other_modes_keep_their_indices() {
        for mode in [Mode::Triangles, Mode::TriangleStrip, Mode::Lines, Mode::LineStrip, Mode::Points] {
            assert!(rewrite_indices(mode, &[0, 1, 2]).is_none());
        }
    }

    #[test]
    fn unreadable_file_yields_nothing_to_draw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gltf");
        std::fs::write(&path, b"{ this is not json").unwrap();
        assert!(import_document(&path).unwrap().is_none());
        assert!(import_document(&dir.path().join("missing.gltf")).unwrap().is_none());
        assert!(traverse(&ModelGraph::default(), true).is_empty());
    }

    #[test]
    fn unknown_primitive_mode_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mode.gltf");
        std::fs::write(
            &path,
            r#"{"asset":{"version":"2.0"},"meshes":[{"primitives":[{"attributes":{},"mode":9}]}]}"#,
        )
        .unwrap();
        let err = import_document(&path).unwrap_err();
        assert!(matches!(
            err,
            GlintError::UnsupportedPrimitiveMode { ref location, .. } if location == "meshes[0].primitives[0].mode"
        ));
    }

    #[test]
    fn expands_narrow_images_to_rgba() {
        assert_eq!(rgba8_pixels(Format::R8, &[7, 9]).unwrap(), vec![7, 0, 0, 255, 9, 0, 0, 255]);
        assert_eq!(rgba8_pixels(Format::R8G8, &[1, 2]).unwrap(), vec![1, 2, 0, 255]);
        assert_eq!(
            rgba8_pixels(Format::R8G8B8, &[1, 2, 3, 4, 5, 6]).unwrap(),
            vec![1, 2, 3, 255, 4, 5, 6, 255]
        );
        assert_eq!(rgba8_pixels(Format::R8G8B8A8, &[1, 2, 3, 4]).unwrap(), vec![1, 2, 3, 4]);
        assert!(rgba8_pixels(Format::R16, &[0, 0]).is_none());
    }

    #[test]
    fn missing_attribute_data_is_padded() {
        assert_eq!(padded(Vec::new(), 2, [0.0f32, 0.0, 1.0]), vec![[0.0, 0.0, 1.0]; 2]);
        assert_eq!(padded(vec![1u8, 2, 3], 2, 0), vec![1, 2]);
    }
}
