//! # Primitive Shape Generation
//!
//! Unit cube and UV sphere with normals and texture coordinates.

use super::GeometryData;
use std::f32::consts::PI;

/// Axis-aligned cube spanning [-0.5, 0.5] on every axis, four vertices per face.
pub fn cube() -> GeometryData {
    let mut data = GeometryData::new();

    // (normal, u axis, v axis) per face; u x v == normal keeps CCW winding
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];
    let corners = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    for (normal, u_axis, v_axis) in faces {
        let base = data.vertices.len() as u32;
        for [u, v] in corners {
            let position: [f32; 3] = std::array::from_fn(|k| {
                0.5 * normal[k] + (u - 0.5) * u_axis[k] + (v - 0.5) * v_axis[k]
            });
            data.vertices.push(position);
            data.normals.push(normal);
            data.tex_coords.push([u, 1.0 - v]);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Unit sphere centered at the origin.
///
/// `longitude_segments` slices around the Y axis, `latitude_segments` from
/// pole to pole.
pub fn sphere(longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let point = [sin_theta * sin_phi, cos_theta, sin_theta * cos_phi];
            data.vertices.push(point);
            data.normals.push(point);
            data.tex_coords
                .push([long as f32 / long_segs as f32, lat as f32 / lat_segs as f32]);
        }
    }

    let row = long_segs + 1;
    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let top = lat * row + long;
            let bottom = top + row;
            data.indices
                .extend_from_slice(&[top, bottom, top + 1, bottom, bottom + 1, top + 1]);
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[test]
    fn cube_has_four_vertices_per_face() {
        let cube = cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        for v in &cube.vertices {
            assert!(v.iter().all(|c| c.abs() <= 0.5 + 1e-6));
        }
    }

    #[test]
    fn cube_triangles_face_outward() {
        let cube = cube();
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| cube.vertices[tri[k] as usize]);
            let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let n = cross(ab, ac);
            let expected = cube.normals[tri[0] as usize];
            let dot = n[0] * expected[0] + n[1] * expected[1] + n[2] * expected[2];
            assert!(dot > 0.0);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_the_unit_sphere() {
        let sphere = sphere(32, 16);
        assert_eq!(sphere.vertex_count(), 33 * 17);
        assert_eq!(sphere.triangle_count(), 32 * 16 * 2);
        assert_eq!(sphere.normals.len(), sphere.tex_coords.len());
        for v in &sphere.vertices {
            let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn interleaved_vertices_keep_every_attribute() {
        let cube = cube();
        let vertices = cube.to_vertices();
        assert_eq!(vertices.len(), 24);
        assert_eq!(vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[0].tex_coords, [0.0, 1.0]);
    }
}
