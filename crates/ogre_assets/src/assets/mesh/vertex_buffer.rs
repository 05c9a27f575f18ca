//! Decoder for one `<vertexbuffer>` block
//!
//! A buffer declares which attribute channels it carries via boolean flags
//! plus a texture-coordinate channel count; each present channel is decoded
//! into a parallel column indexed by vertex position within the buffer.

use roxmltree::Node;

use crate::foundation::math::{Vec2, Vec3};

use super::{bool_attribute, float_attribute, uint_attribute, MeshParseError, VertexBuffer};

/// Assumed UV dimensionality when the buffer omits the attribute.
const DEFAULT_UV_DIMENSIONS: u32 = 2;

/// Decodes a vertex buffer's declared channels into columnar arrays.
pub struct VertexBufferDecoder;

impl VertexBufferDecoder {
    /// Decode the channels a buffer declares.
    ///
    /// `expected_count` is the vertex count declared by the enclosing
    /// geometry block; channel lengths are validated against it later by the
    /// assembler, not here. Diffuse and specular colour flags are recognized
    /// but the data model keeps no colour columns, so their data is skipped.
    pub fn decode(
        node: Node<'_, '_>,
        expected_count: usize,
    ) -> Result<VertexBuffer, MeshParseError> {
        let has_positions = bool_attribute(node, "positions");
        let has_normals = bool_attribute(node, "normals");
        let uv_channels = uint_attribute(node, "texture_coords")?.unwrap_or(0);

        if uv_channels > 1 {
            log::warn!(
                "vertex buffer declares {uv_channels} texture coordinate channels, only the first is used"
            );
        }
        let has_uvs = uv_channels > 0;
        if has_uvs {
            let dimensions = uv_dimensions(node)?;
            if dimensions != DEFAULT_UV_DIMENSIONS {
                return Err(MeshParseError::UnsupportedUvDimension(dimensions));
            }
        }

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();

        for vertex in node.children().filter(|c| c.has_tag_name("vertex")) {
            if has_positions {
                if let Some(position) = element_vec3(vertex, "position")? {
                    positions.push(position);
                }
            }
            if has_normals {
                if let Some(normal) = element_vec3(vertex, "normal")? {
                    normals.push(normal);
                }
            }
            if has_uvs {
                if let Some(uv) = element_uv(vertex)? {
                    uvs.push(uv);
                }
            }
        }

        Ok(VertexBuffer {
            positions: has_positions.then_some(positions),
            normals: has_normals.then_some(normals),
            uvs: has_uvs.then_some(uvs),
            count: expected_count,
        })
    }
}

/// Reads `texture_coord_dimensions_0`, tolerating both a bare number and an
/// identifier with an embedded numeric suffix such as `float2`.
fn uv_dimensions(node: Node<'_, '_>) -> Result<u32, MeshParseError> {
    const ATTRIBUTE: &str = "texture_coord_dimensions_0";

    let Some(raw) = node.attribute(ATTRIBUTE) else {
        log::warn!("vertex buffer omits {ATTRIBUTE}, assuming 2");
        return Ok(DEFAULT_UV_DIMENSIONS);
    };
    if let Ok(value) = raw.parse::<u32>() {
        return Ok(value);
    }
    let suffix: String = raw.chars().skip_while(|c| !c.is_ascii_digit()).collect();
    suffix.parse().map_err(|_| MeshParseError::InvalidNumber {
        attribute: ATTRIBUTE.to_string(),
        value: raw.to_string(),
    })
}

/// Read an `x`/`y`/`z` child element of a vertex, if present.
fn element_vec3(vertex: Node<'_, '_>, tag: &str) -> Result<Option<Vec3>, MeshParseError> {
    let Some(element) = vertex.children().find(|c| c.has_tag_name(tag)) else {
        return Ok(None);
    };
    Ok(Some(Vec3::new(
        float_attribute(element, "x")?,
        float_attribute(element, "y")?,
        float_attribute(element, "z")?,
    )))
}

/// Read the first `texcoord` child element of a vertex, if present.
fn element_uv(vertex: Node<'_, '_>) -> Result<Option<Vec2>, MeshParseError> {
    let Some(element) = vertex.children().find(|c| c.has_tag_name("texcoord")) else {
        return Ok(None);
    };
    Ok(Some(Vec2::new(
        float_attribute(element, "u")?,
        float_attribute(element, "v")?,
    )))
}
