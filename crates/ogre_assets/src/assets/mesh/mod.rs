//! Mesh document parsing subsystem
//!
//! Decodes XML mesh documents (vertex buffers, triangle face lists, optional
//! shared vertex pools) into one [`SubmeshRecord`] per submesh, with vertex
//! channels merged into a render-ready [`GeometryBuffer`].

pub mod assembler;
pub mod document_parser;
pub mod face_list;
pub mod vertex_buffer;

pub use assembler::GeometryAssembler;
pub use document_parser::MeshDocumentParser;
pub use face_list::FaceListDecoder;
pub use vertex_buffer::VertexBufferDecoder;

use roxmltree::Node;
use thiserror::Error;

use crate::foundation::math::{Vec2, Vec3};

/// Indices per face; only indexed triangle lists are supported.
pub const TRIANGLE_ARITY: usize = 3;

/// Columnar vertex channels decoded from one or more vertex buffers.
///
/// Any channel may be absent; present channels are index-aligned and must
/// have exactly `count` entries for assembly to succeed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
    /// Vertex positions
    pub positions: Option<Vec<Vec3>>,
    /// Per-vertex normals
    pub normals: Option<Vec<Vec3>>,
    /// First texture coordinate channel
    pub uvs: Option<Vec<Vec2>>,
    /// Declared vertex count of the enclosing geometry block
    pub count: usize,
}

impl VertexBuffer {
    /// Merge channels decoded from a sibling buffer of the same geometry
    /// block; the first declaration of a channel wins.
    pub fn merge(&mut self, other: VertexBuffer) {
        if self.positions.is_none() {
            self.positions = other.positions;
        }
        if self.normals.is_none() {
            self.normals = other.normals;
        }
        if self.uvs.is_none() {
            self.uvs = other.uvs;
        }
    }
}

/// Triangle index list decoded from a face block.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceList {
    /// Index attributes per face element; always [`TRIANGLE_ARITY`]
    pub dimension: usize,
    /// Index triples into the associated vertex buffer, unvalidated
    pub faces: Vec<[u32; 3]>,
}

impl FaceList {
    /// Number of faces
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether the list holds no faces
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

impl Default for FaceList {
    fn default() -> Self {
        Self {
            dimension: TRIANGLE_ARITY,
            faces: Vec::new(),
        }
    }
}

/// One output triangle with optional per-face shading data.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleFace {
    /// Vertex indices
    pub indices: [u32; 3],
    /// Flat face normal; populated only by the derived-normal fallback
    pub normal: Option<Vec3>,
    /// Per-corner normals, from the source column or the fallback
    pub vertex_normals: Option<[Vec3; 3]>,
}

/// Merged geometry handed to the rendering layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryBuffer {
    /// Vertex positions
    pub vertices: Vec<Vec3>,
    /// Per-vertex normals, copied or derived
    pub normals: Vec<Vec3>,
    /// Triangle faces
    pub faces: Vec<TriangleFace>,
    /// Per-face UV triples for texture channel 0
    pub face_vertex_uvs: Vec<[Vec2; 3]>,
}

impl GeometryBuffer {
    /// Whether the buffer holds no geometry at all (the empty result an
    /// assembly mismatch leaves behind).
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// One submesh parse result: merged geometry plus its material reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmeshRecord {
    /// Merged geometry; empty when assembly failed for this submesh
    pub geometry: GeometryBuffer,
    /// Material reference declared on the submesh element
    pub material: String,
    /// Companion script file derived from the reference; `None` when the
    /// reference carries a fragment marker naming an in-script material
    pub material_file: Option<String>,
}

/// Fatal structural failures in a mesh document.
///
/// Any of these aborts the current document; documents parsed by other
/// calls are unaffected.
#[derive(Error, Debug)]
pub enum MeshParseError {
    /// IO error reading a document file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The root element is not the mesh-document tag
    #[error("unexpected root element '{0}', expected 'mesh'")]
    WrongRootTag(String),

    /// A submesh element declared the wrong number of attributes
    #[error("submesh declares {found} attributes, expected exactly {expected}")]
    SubmeshAttributeCount {
        /// Attributes found on the element
        found: usize,
        /// Attributes the grammar requires
        expected: usize,
    },

    /// A submesh declared an operation type other than the triangle list
    #[error("unsupported operation type '{0}', only 'triangle_list' is supported")]
    UnsupportedOperationType(String),

    /// A face element declared the wrong number of index attributes
    #[error("face declares {0} index attributes, expected exactly 3")]
    FaceIndexCount(usize),

    /// A texture coordinate channel declared a dimensionality other than 2
    #[error("unsupported texture coordinate dimension {0}, only 2D is supported")]
    UnsupportedUvDimension(u32),

    /// A required attribute was missing from an element
    #[error("element '{element}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Tag of the offending element
        element: String,
        /// Name of the missing attribute
        attribute: String,
    },

    /// An attribute held a value that does not parse as a number
    #[error("invalid numeric value '{value}' in attribute '{attribute}'")]
    InvalidNumber {
        /// Name of the offending attribute
        attribute: String,
        /// Raw attribute value
        value: String,
    },
}

/// Read a boolean presence flag ("true"/"false") from an attribute.
pub(crate) fn bool_attribute(node: Node<'_, '_>, name: &str) -> bool {
    node.attribute(name).is_some_and(|value| value == "true")
}

/// Read an optional unsigned integer attribute.
pub(crate) fn uint_attribute(
    node: Node<'_, '_>,
    name: &str,
) -> Result<Option<u32>, MeshParseError> {
    match node.attribute(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| MeshParseError::InvalidNumber {
                attribute: name.to_string(),
                value: raw.to_string(),
            }),
    }
}

/// Read a required unsigned integer attribute.
pub(crate) fn require_uint_attribute(
    node: Node<'_, '_>,
    name: &str,
) -> Result<u32, MeshParseError> {
    uint_attribute(node, name)?.ok_or_else(|| MeshParseError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
    })
}

/// Read a required float attribute.
pub(crate) fn float_attribute(node: Node<'_, '_>, name: &str) -> Result<f32, MeshParseError> {
    let raw = node
        .attribute(name)
        .ok_or_else(|| MeshParseError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: name.to_string(),
        })?;
    raw.parse().map_err(|_| MeshParseError::InvalidNumber {
        attribute: name.to_string(),
        value: raw.to_string(),
    })
}
