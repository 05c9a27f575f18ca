//! Walks a mesh XML document into submesh records
//!
//! Resolves shared-vs-local vertex data per submesh, runs the face and
//! vertex-buffer decoders, and hands both to the assembler. Each call is
//! independent: a structural error aborts only the offending document.

use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use super::{
    require_uint_attribute, FaceListDecoder, GeometryAssembler, GeometryBuffer, MeshParseError,
    SubmeshRecord, VertexBuffer, VertexBufferDecoder,
};

/// Root element tag of a mesh document.
const MESH_ROOT_TAG: &str = "mesh";

/// Only supported submesh operation type.
const TRIANGLE_LIST: &str = "triangle_list";

/// Structural attributes every submesh element must declare: material
/// reference, shared-vertex flag, operation type, index-width flag.
const SUBMESH_ATTRIBUTE_COUNT: usize = 4;

/// Marker splitting a material reference that names an in-script material.
const FRAGMENT_MARKER: char = '#';

/// Parses a mesh document into one record per submesh.
pub struct MeshDocumentParser;

impl MeshDocumentParser {
    /// Parse document text.
    ///
    /// The optional shared vertex pool is decoded once; each submesh then
    /// either references it or decodes its own geometry block. A submesh
    /// whose channel counts disagree keeps an empty geometry without
    /// affecting its siblings.
    pub fn parse(text: &str) -> Result<Vec<SubmeshRecord>, MeshParseError> {
        let document = Document::parse(text)?;
        let root = document.root_element();
        if root.tag_name().name() != MESH_ROOT_TAG {
            return Err(MeshParseError::WrongRootTag(
                root.tag_name().name().to_string(),
            ));
        }

        let shared = root
            .children()
            .find(|c| c.has_tag_name("sharedgeometry"))
            .map(Self::decode_geometry)
            .transpose()?;

        let mut records = Vec::new();
        if let Some(submeshes) = root.children().find(|c| c.has_tag_name("submeshes")) {
            for submesh in submeshes.children().filter(|c| c.has_tag_name("submesh")) {
                records.push(Self::decode_submesh(submesh, shared.as_ref())?);
            }
        }

        log::debug!("parsed mesh document with {} submesh(es)", records.len());
        Ok(records)
    }

    /// Read a mesh document from disk and parse it.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<SubmeshRecord>, MeshParseError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    fn decode_submesh(
        node: Node<'_, '_>,
        shared: Option<&VertexBuffer>,
    ) -> Result<SubmeshRecord, MeshParseError> {
        let attribute_count = node.attributes().count();
        if attribute_count != SUBMESH_ATTRIBUTE_COUNT {
            return Err(MeshParseError::SubmeshAttributeCount {
                found: attribute_count,
                expected: SUBMESH_ATTRIBUTE_COUNT,
            });
        }
        if let Some(operation) = node.attribute("operationtype") {
            if operation != TRIANGLE_LIST {
                return Err(MeshParseError::UnsupportedOperationType(
                    operation.to_string(),
                ));
            }
        }

        let material = node.attribute("material").unwrap_or_default().to_string();
        let material_file = if material.contains(FRAGMENT_MARKER) {
            None
        } else {
            Some(format!("{material}.material"))
        };
        let use_shared = super::bool_attribute(node, "usesharedvertices");

        let faces = node
            .children()
            .find(|c| c.has_tag_name("faces"))
            .map(FaceListDecoder::decode)
            .transpose()?
            .unwrap_or_default();

        let own_geometry = node.children().find(|c| c.has_tag_name("geometry"));
        let buffer = match (use_shared, shared) {
            (true, Some(pool)) => pool.clone(),
            (true, None) => {
                log::warn!(
                    "submesh '{material}' requests shared vertices but the document has no shared geometry block, using its own geometry"
                );
                Self::decode_own_geometry(own_geometry)?
            }
            (false, _) => Self::decode_own_geometry(own_geometry)?,
        };

        let geometry = match GeometryAssembler::assemble(&faces, &buffer) {
            Some(geometry) => geometry,
            None => {
                log::warn!(
                    "vertex channels of submesh '{material}' disagree with the declared count, leaving its geometry empty"
                );
                GeometryBuffer::default()
            }
        };

        Ok(SubmeshRecord {
            geometry,
            material,
            material_file,
        })
    }

    fn decode_own_geometry(
        node: Option<Node<'_, '_>>,
    ) -> Result<VertexBuffer, MeshParseError> {
        node.map(Self::decode_geometry)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Decode a geometry block: declared vertex count plus channels merged
    /// from each of its vertex buffers.
    fn decode_geometry(node: Node<'_, '_>) -> Result<VertexBuffer, MeshParseError> {
        let count = require_uint_attribute(node, "vertexcount")? as usize;
        let mut merged = VertexBuffer {
            count,
            ..Default::default()
        };
        for buffer in node.children().filter(|c| c.has_tag_name("vertexbuffer")) {
            merged.merge(VertexBufferDecoder::decode(buffer, count)?);
        }
        Ok(merged)
    }
}
