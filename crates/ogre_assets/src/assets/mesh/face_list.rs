//! Decoder for triangle index lists

use roxmltree::Node;

use super::{FaceList, MeshParseError, TRIANGLE_ARITY};

/// Decodes a `<faces>` block into index triples.
pub struct FaceListDecoder;

impl FaceListDecoder {
    /// Decode every face element of the block.
    ///
    /// Each face must declare exactly three index attributes. Indices are
    /// not bounds-checked here; the assembler validates them when it copies
    /// attributes per face.
    pub fn decode(node: Node<'_, '_>) -> Result<FaceList, MeshParseError> {
        let mut faces = Vec::new();
        for face in node.children().filter(|c| c.has_tag_name("face")) {
            let arity = face.attributes().count();
            if arity != TRIANGLE_ARITY {
                return Err(MeshParseError::FaceIndexCount(arity));
            }
            faces.push([
                index_attribute(face, "v1")?,
                index_attribute(face, "v2")?,
                index_attribute(face, "v3")?,
            ]);
        }
        Ok(FaceList {
            dimension: TRIANGLE_ARITY,
            faces,
        })
    }
}

fn index_attribute(node: Node<'_, '_>, name: &str) -> Result<u32, MeshParseError> {
    super::require_uint_attribute(node, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(xml: &str) -> Result<FaceList, MeshParseError> {
        let document = roxmltree::Document::parse(xml).unwrap();
        FaceListDecoder::decode(document.root_element())
    }

    #[test]
    fn test_triangle_faces() {
        let xml = r#"
<faces count="2">
    <face v1="0" v2="1" v3="2"/>
    <face v1="2" v2="1" v3="3"/>
</faces>"#;
        let list = decode(xml).unwrap();
        assert_eq!(list.dimension, 3);
        assert_eq!(list.len(), 2);
        assert_eq!(list.faces[0], [0, 1, 2]);
        assert_eq!(list.faces[1], [2, 1, 3]);
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let xml = r#"<faces><face v1="0" v2="1"/></faces>"#;
        assert!(matches!(decode(xml), Err(MeshParseError::FaceIndexCount(2))));

        let xml = r#"<faces><face v1="0" v2="1" v3="2" v4="3"/></faces>"#;
        assert!(matches!(decode(xml), Err(MeshParseError::FaceIndexCount(4))));
    }

    #[test]
    fn test_out_of_range_indices_pass_through() {
        // Bounds checking is deferred to the assembler.
        let xml = r#"<faces><face v1="7" v2="8" v3="9"/></faces>"#;
        let list = decode(xml).unwrap();
        assert_eq!(list.faces[0], [7, 8, 9]);
    }

    #[test]
    fn test_non_numeric_index_rejected() {
        let xml = r#"<faces><face v1="a" v2="1" v3="2"/></faces>"#;
        assert!(matches!(decode(xml), Err(MeshParseError::InvalidNumber { .. })));
    }

    #[test]
    fn test_empty_block() {
        let list = decode("<faces count=\"0\"/>").unwrap();
        assert!(list.is_empty());
    }
}
