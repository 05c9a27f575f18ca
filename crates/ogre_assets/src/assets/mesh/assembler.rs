//! Merges decoded faces and vertex columns into a geometry buffer

use crate::foundation::math::Vec3;

use super::{FaceList, GeometryBuffer, TriangleFace, VertexBuffer};

/// Merges a face list with vertex columns into the final geometry.
pub struct GeometryAssembler;

impl GeometryAssembler {
    /// Assemble the final geometry for one submesh.
    ///
    /// Returns `None` when a present channel's length disagrees with the
    /// buffer's declared count, or when a face index falls outside the
    /// vertex range while per-face attributes are materialized. The caller
    /// keeps an empty geometry for that submesh; siblings are unaffected.
    ///
    /// When the source carries no normals at all, flat per-face normals are
    /// derived from the final vertex/face geometry and accumulated into
    /// normalized per-vertex normals.
    pub fn assemble(faces: &FaceList, buffer: &VertexBuffer) -> Option<GeometryBuffer> {
        let count = buffer.count;
        let channel_ok = |len: usize| len == count;
        if buffer.positions.as_ref().is_some_and(|p| !channel_ok(p.len()))
            || buffer.normals.as_ref().is_some_and(|n| !channel_ok(n.len()))
            || buffer.uvs.as_ref().is_some_and(|u| !channel_ok(u.len()))
        {
            return None;
        }

        let mut geometry = GeometryBuffer::default();
        if let Some(positions) = &buffer.positions {
            geometry.vertices = positions.clone();
        }
        if let Some(normals) = &buffer.normals {
            geometry.normals = normals.clone();
        }

        for triple in &faces.faces {
            let mut face = TriangleFace {
                indices: *triple,
                normal: None,
                vertex_normals: None,
            };
            if let Some(normals) = &buffer.normals {
                face.vertex_normals = Some(lookup3(normals, *triple)?);
            }
            if let Some(uvs) = &buffer.uvs {
                geometry.face_vertex_uvs.push(lookup3(uvs, *triple)?);
            }
            geometry.faces.push(face);
        }

        if buffer.normals.is_none() && !geometry.vertices.is_empty() {
            derive_flat_normals(&mut geometry)?;
        }

        Some(geometry)
    }
}

/// Look up one column value per face corner, failing on an out-of-range
/// index.
fn lookup3<T: Copy>(column: &[T], indices: [u32; 3]) -> Option<[T; 3]> {
    Some([
        *column.get(indices[0] as usize)?,
        *column.get(indices[1] as usize)?,
        *column.get(indices[2] as usize)?,
    ])
}

/// Flat-normal fallback: per-face normals from winding, accumulated into
/// normalized per-vertex normals.
fn derive_flat_normals(geometry: &mut GeometryBuffer) -> Option<()> {
    let mut vertex_normals = vec![Vec3::zeros(); geometry.vertices.len()];

    for face in &mut geometry.faces {
        let [a, b, c] = face.indices.map(|i| i as usize);
        let pa = *geometry.vertices.get(a)?;
        let pb = *geometry.vertices.get(b)?;
        let pc = *geometry.vertices.get(c)?;

        let cross = (pb - pa).cross(&(pc - pa));
        let normal = if cross.norm() > 0.0 {
            cross.normalize()
        } else {
            // Degenerate triangle; keep the zero vector
            cross
        };

        face.normal = Some(normal);
        face.vertex_normals = Some([normal; 3]);
        for index in [a, b, c] {
            vertex_normals[index] += normal;
        }
    }

    for normal in &mut vertex_normals {
        if normal.norm() > 0.0 {
            *normal = normal.normalize();
        }
    }
    geometry.normals = vertex_normals;
    Some(())
}
