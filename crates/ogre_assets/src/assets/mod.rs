//! Asset description parsing subsystem
//!
//! Two independent pipelines: mesh documents in, submesh records out;
//! material scripts in, a name-keyed descriptor map out. The only coupling
//! to the outside world is the [`AssetSource`] collaborator that resolves
//! texture references on its own schedule.

pub mod materials;
pub mod mesh;
pub mod source;

pub use materials::{
    MaterialDescriptor, MaterialDescriptorBuilder, MaterialScriptError, MaterialScriptParser,
    ScriptScanner,
};
pub use mesh::{
    FaceList, FaceListDecoder, GeometryAssembler, GeometryBuffer, MeshDocumentParser,
    MeshParseError, SubmeshRecord, TriangleFace, VertexBuffer, VertexBufferDecoder,
};
pub use source::{AssetKind, AssetSource, Completion, NullAssetSource, RequestHandle};
