//! Section state machine for the brace-delimited material script grammar
//!
//! Scripts nest `material > technique > pass > (texture_unit | program ref)`.
//! Each normalized line is dispatched by the current section and its leading
//! keyword. Closing a `material` section finalizes its descriptor into the
//! output map and issues the texture request, whose completion patches the
//! descriptor later, out of band.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::assets::source::{AssetKind, AssetSource};
use crate::foundation::math::Vec3;

use super::descriptor::{ColorChannel, MaterialDescriptor, MaterialDescriptorBuilder};
use super::script_scanner::ScriptScanner;
use super::MaterialScriptError;

/// Nesting sections of the script grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Material,
    Technique,
    Pass,
    TextureUnit,
    ProgramRef,
}

/// Deepest legal nesting: material > technique > pass > texture_unit.
const MAX_SECTION_DEPTH: usize = 4;

/// Parses material scripts into a name-keyed descriptor map.
pub struct MaterialScriptParser;

impl MaterialScriptParser {
    /// Parse script text, requesting referenced textures from `assets`.
    ///
    /// Returns the descriptors of every material section closed before the
    /// end of input. A stray `}` at the root aborts the whole script.
    pub fn parse(
        text: &str,
        assets: &mut dyn AssetSource,
    ) -> Result<HashMap<String, MaterialDescriptor>, MaterialScriptError> {
        let mut state = ParseState::new(assets);
        for (index, line) in ScriptScanner::scan(text).into_iter().enumerate() {
            state.handle_line(&line, index + 1)?;
        }
        log::debug!("parsed material script with {} material(s)", state.materials.len());
        Ok(state.materials)
    }

    /// Read a script file from disk and parse it.
    pub fn parse_file(
        path: impl AsRef<Path>,
        assets: &mut dyn AssetSource,
    ) -> Result<HashMap<String, MaterialDescriptor>, MaterialScriptError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, assets)
    }
}

struct ParseState<'a> {
    assets: &'a mut dyn AssetSource,
    stack: Vec<Section>,
    builder: Option<MaterialDescriptorBuilder>,
    /// Set when the previous line's handler demands `{` next.
    expect_open_brace: bool,
    materials: HashMap<String, MaterialDescriptor>,
}

impl<'a> ParseState<'a> {
    fn new(assets: &'a mut dyn AssetSource) -> Self {
        Self {
            assets,
            stack: Vec::new(),
            builder: None,
            expect_open_brace: false,
            materials: HashMap::new(),
        }
    }

    fn handle_line(&mut self, line: &str, line_no: usize) -> Result<(), MaterialScriptError> {
        if self.expect_open_brace {
            self.expect_open_brace = false;
            if line == "{" {
                return Ok(());
            }
            log::warn!("statement {line_no}: expected '{{' to open section, found '{line}'");
        }

        if line == "}" {
            return self.close_section(line_no);
        }
        if line == "{" {
            log::warn!("statement {line_no}: unexpected '{{'");
            return Ok(());
        }

        // Tolerate a trailing brace on the opening statement itself,
        // e.g. "technique {".
        let (line, inline_brace) = match line.strip_suffix(" {") {
            Some(stripped) => (stripped, true),
            None => (line, false),
        };

        let mut tokens = line.split(' ');
        let Some(keyword) = tokens.next() else {
            return Ok(());
        };

        match self.stack.last().copied() {
            None => self.line_root(keyword, tokens, line_no)?,
            Some(Section::Material) => self.line_material(keyword, tokens, line_no)?,
            Some(Section::Technique) => self.line_technique(keyword, line_no)?,
            Some(Section::Pass) => self.line_pass(keyword, tokens, line_no)?,
            Some(Section::TextureUnit) => self.line_texture_unit(keyword, tokens),
            // Program parameters are outside this core; the section is
            // consumed and its contents discarded.
            Some(Section::ProgramRef) => {}
        }

        if inline_brace && self.expect_open_brace {
            self.expect_open_brace = false;
        }
        Ok(())
    }

    fn line_root<'t>(
        &mut self,
        keyword: &str,
        tokens: impl Iterator<Item = &'t str>,
        line_no: usize,
    ) -> Result<(), MaterialScriptError> {
        if keyword == "material" {
            let rest: Vec<&str> = tokens.collect();
            let name = (!rest.is_empty()).then(|| rest.join(" "));
            self.builder = Some(MaterialDescriptorBuilder::new(name));
            self.open_section(Section::Material, line_no)?;
        }
        Ok(())
    }

    fn line_material<'t>(
        &mut self,
        keyword: &str,
        mut tokens: impl Iterator<Item = &'t str>,
        line_no: usize,
    ) -> Result<(), MaterialScriptError> {
        match keyword {
            "receive_shadows" => {
                let on = tokens.next() == Some("on");
                if let Some(builder) = self.builder.as_mut() {
                    builder.set_receive_shadow(on);
                }
            }
            "technique" => self.open_section(Section::Technique, line_no)?,
            _ => {}
        }
        Ok(())
    }

    fn line_technique(&mut self, keyword: &str, line_no: usize) -> Result<(), MaterialScriptError> {
        if keyword == "pass" {
            self.open_section(Section::Pass, line_no)?;
        }
        Ok(())
    }

    fn line_pass<'t>(
        &mut self,
        keyword: &str,
        tokens: impl Iterator<Item = &'t str>,
        line_no: usize,
    ) -> Result<(), MaterialScriptError> {
        let channel = match keyword {
            "ambient" => Some(ColorChannel::Ambient),
            "diffuse" => Some(ColorChannel::Diffuse),
            "specular" => Some(ColorChannel::Specular),
            "emissive" => Some(ColorChannel::Emissive),
            _ => None,
        };
        if let Some(channel) = channel {
            match parse_rgb(tokens) {
                Some(value) => {
                    if let Some(builder) = self.builder.as_mut() {
                        builder.set_color(channel, value);
                    }
                }
                None => {
                    log::warn!("statement {line_no}: '{keyword}' needs at least 3 numeric components, skipping");
                }
            }
            return Ok(());
        }

        match keyword {
            "texture_unit" => self.open_section(Section::TextureUnit, line_no)?,
            "vertex_program_ref" | "fragment_program_ref" => {
                self.open_section(Section::ProgramRef, line_no)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn line_texture_unit<'t>(&mut self, keyword: &str, tokens: impl Iterator<Item = &'t str>) {
        match keyword {
            "texture" => {
                let rest: Vec<&str> = tokens.collect();
                if rest.is_empty() {
                    log::warn!("'texture' statement without a reference, skipping");
                } else if let Some(builder) = self.builder.as_mut() {
                    builder.set_texture_ref(rest.join(" "));
                }
            }
            // Recognized but carry no effect in this core
            "tex_address_mode" | "scale" | "colour_op" => {}
            _ => {}
        }
    }

    fn open_section(&mut self, section: Section, line_no: usize) -> Result<(), MaterialScriptError> {
        if self.stack.len() >= MAX_SECTION_DEPTH {
            return Err(MaterialScriptError::NestingTooDeep { line: line_no });
        }
        self.stack.push(section);
        self.expect_open_brace = true;
        Ok(())
    }

    fn close_section(&mut self, line_no: usize) -> Result<(), MaterialScriptError> {
        match self.stack.pop() {
            None => Err(MaterialScriptError::UnmatchedBrace { line: line_no }),
            Some(Section::Material) => {
                self.finalize_material();
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    /// Move the finished descriptor into the output map and issue its
    /// texture request.
    fn finalize_material(&mut self) {
        let Some(builder) = self.builder.take() else {
            return;
        };
        let (descriptor, texture_ref) = builder.finish();

        if let Some(reference) = texture_ref {
            let slot = std::sync::Arc::clone(descriptor.texture_slot());
            match self.assets.request(&reference, AssetKind::Texture) {
                Some(handle) => handle.on_complete(move |image| {
                    if !slot.resolve(image) {
                        log::debug!("texture completion arrived after the slot was resolved");
                    }
                }),
                None => {
                    log::debug!("asset source declined texture request '{reference}', keeping placeholder");
                }
            }
        }

        self.materials.insert(descriptor.name.clone(), descriptor);
    }
}

/// Parse the first three tokens as RGB floats.
fn parse_rgb<'t>(tokens: impl Iterator<Item = &'t str>) -> Option<Vec3> {
    let mut components = tokens.map(str::parse::<f32>);
    let r = components.next()?.ok()?;
    let g = components.next()?.ok()?;
    let b = components.next()?.ok()?;
    Some(Vec3::new(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::materials::texture::{placeholder_texture, TextureFormat, TextureImage};
    use crate::assets::source::{Completion, NullAssetSource, RequestHandle};
    use std::sync::Arc;

    /// Source that accepts every request and exposes the completions.
    #[derive(Default)]
    struct StubSource {
        completions: Vec<(String, Completion)>,
    }

    impl AssetSource for StubSource {
        fn request(&mut self, name: &str, _kind: AssetKind) -> Option<RequestHandle> {
            let (handle, completion) = RequestHandle::pair();
            self.completions.push((name.to_string(), completion));
            Some(handle)
        }
    }

    fn parse(text: &str) -> HashMap<String, MaterialDescriptor> {
        MaterialScriptParser::parse(text, &mut NullAssetSource).unwrap()
    }

    #[test]
    fn test_single_material_diffuse() {
        let script = "material M\n{\n technique\n {\n  pass\n  {\n   diffuse 1 0 0\n  }\n }\n}\n";
        let materials = parse(script);
        assert_eq!(materials.len(), 1);

        let descriptor = materials.get("M").unwrap();
        assert_eq!(descriptor.channels.diffuse, Some(Vec3::new(1.0, 0.0, 0.0)));
        assert!(Arc::ptr_eq(&descriptor.texture(), &placeholder_texture()));
    }

    #[test]
    fn test_all_color_channels_and_shadows() {
        let script = r"
material Ship
{
    receive_shadows on
    technique
    {
        pass
        {
            ambient 0.1 0.1 0.1
            diffuse 0.8 0.2 0.2
            specular 0.5 0.5 0.5 12.5
            emissive 0 0 1
        }
    }
}
";
        let materials = parse(script);
        let descriptor = materials.get("Ship").unwrap();
        assert!(descriptor.receive_shadow);
        assert_eq!(descriptor.channels.ambient, Some(Vec3::new(0.1, 0.1, 0.1)));
        assert_eq!(descriptor.channels.diffuse, Some(Vec3::new(0.8, 0.2, 0.2)));
        assert_eq!(descriptor.channels.specular, Some(Vec3::new(0.5, 0.5, 0.5)));
        assert_eq!(descriptor.channels.emissive, Some(Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_unnamed_material_gets_placeholder_name() {
        let materials = parse("material\n{\n}\n");
        assert!(materials.contains_key("unnamed"));
    }

    #[test]
    fn test_multiple_materials() {
        let script = "material A\n{\n}\nmaterial B\n{\n}\n";
        let materials = parse(script);
        assert_eq!(materials.len(), 2);
        assert!(materials.contains_key("A"));
        assert!(materials.contains_key("B"));
    }

    #[test]
    fn test_stray_root_brace_is_fatal() {
        let script = "material A\n{\n}\n}\nmaterial B\n{\n}\n";
        let result = MaterialScriptParser::parse(script, &mut NullAssetSource);
        assert!(matches!(
            result,
            Err(MaterialScriptError::UnmatchedBrace { .. })
        ));
    }

    #[test]
    fn test_missing_open_brace_warns_but_continues() {
        // "technique" follows "material M" without an opening brace; the
        // expectation mismatch is non-fatal and the line still dispatches.
        let script = "material M\ntechnique\n{\n pass\n {\n  diffuse 1 1 1\n }\n}\n}\n";
        let materials = parse(script);
        let descriptor = materials.get("M").unwrap();
        assert_eq!(descriptor.channels.diffuse, Some(Vec3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_inline_brace_on_opening_statement() {
        let script = "material M {\n technique {\n  pass {\n   diffuse 0 1 0\n  }\n }\n}\n";
        let materials = parse(script);
        assert_eq!(
            materials.get("M").unwrap().channels.diffuse,
            Some(Vec3::new(0.0, 1.0, 0.0))
        );
    }

    #[test]
    fn test_malformed_color_line_is_skipped() {
        let script = "material M\n{\n technique\n {\n  pass\n  {\n   diffuse 1 0\n  }\n }\n}\n";
        let materials = parse(script);
        assert_eq!(materials.get("M").unwrap().channels.diffuse, None);
    }

    #[test]
    fn test_unknown_keywords_are_silent_noops() {
        let script = "material M\n{\n lod_strategy distance\n technique\n {\n  shadow_caster_material X\n  pass\n  {\n   lighting on\n  }\n }\n}\n";
        let materials = parse(script);
        assert!(materials.contains_key("M"));
    }

    #[test]
    fn test_program_ref_sections_are_consumed() {
        let script = r"
material M
{
    technique
    {
        pass
        {
            vertex_program_ref SkinningVP
            {
                param_named_auto worldMatrix world_matrix_array_3x4
            }
            fragment_program_ref PlainFP
            {
            }
            diffuse 1 0 1
        }
    }
}
";
        let materials = parse(script);
        assert_eq!(
            materials.get("M").unwrap().channels.diffuse,
            Some(Vec3::new(1.0, 0.0, 1.0))
        );
    }

    #[test]
    fn test_texture_unit_ignored_keywords() {
        let script = r"
material M
{
    technique
    {
        pass
        {
            texture_unit
            {
                texture hull.png
                tex_address_mode clamp
                scale 2 2
                colour_op modulate
            }
        }
    }
}
";
        let mut source = StubSource::default();
        let materials = MaterialScriptParser::parse(script, &mut source).unwrap();
        assert!(materials.contains_key("M"));
        assert_eq!(source.completions.len(), 1);
        assert_eq!(source.completions[0].0, "hull.png");
    }

    #[test]
    fn test_texture_resolution_patches_descriptor_once() {
        let script = "material M\n{\n technique\n {\n  pass\n  {\n   texture_unit\n   {\n    texture hull.png\n   }\n  }\n }\n}\n";
        let mut source = StubSource::default();
        let materials = MaterialScriptParser::parse(script, &mut source).unwrap();

        let descriptor = materials.get("M").unwrap();
        assert!(!descriptor.texture_resolved());
        assert!(Arc::ptr_eq(&descriptor.texture(), &placeholder_texture()));

        let completion = &source.completions[0].1;
        completion.fire(TextureImage::solid_color(4, 4, [0, 0, 0, 200]));
        assert!(descriptor.texture_resolved());
        assert_eq!(descriptor.texture().width, 4);
        assert!(descriptor.transparent());
        assert_eq!(descriptor.alpha_test(), Some(0.5));

        // A second firing must not replace the first resolution
        completion.fire(TextureImage::solid_color(16, 16, [1, 1, 1, 255]));
        assert_eq!(descriptor.texture().width, 4);
    }

    #[test]
    fn test_opaque_resolution_does_not_set_transparency() {
        let script = "material M\n{\n technique\n {\n  pass\n  {\n   texture_unit\n   {\n    texture hull.png\n   }\n  }\n }\n}\n";
        let mut source = StubSource::default();
        let materials = MaterialScriptParser::parse(script, &mut source).unwrap();

        source.completions[0].1.fire(TextureImage {
            width: 2,
            height: 2,
            format: TextureFormat::Rgb8,
            data: vec![0; 12],
        });

        let descriptor = materials.get("M").unwrap();
        assert!(descriptor.texture_resolved());
        assert!(!descriptor.transparent());
        assert_eq!(descriptor.alpha_test(), None);
    }

    #[test]
    fn test_declined_request_keeps_placeholder() {
        let script = "material M\n{\n technique\n {\n  pass\n  {\n   texture_unit\n   {\n    texture gone.png\n   }\n  }\n }\n}\n";
        let materials = parse(script);
        let descriptor = materials.get("M").unwrap();
        assert!(!descriptor.texture_resolved());
        assert!(Arc::ptr_eq(&descriptor.texture(), &placeholder_texture()));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let script = "material M\n{\n receive_shadows on\n technique\n {\n  pass\n  {\n   diffuse 0.5 0.5 0.5\n  }\n }\n}\n";
        let first = parse(script);
        let second = parse(script);
        assert_eq!(first.len(), second.len());
        let (a, b) = (first.get("M").unwrap(), second.get("M").unwrap());
        assert_eq!(a.name, b.name);
        assert_eq!(a.channels, b.channels);
        assert_eq!(a.receive_shadow, b.receive_shadow);
    }

    #[test]
    fn test_parse_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "material FromDisk\n{{\n}}\n").unwrap();

        let materials =
            MaterialScriptParser::parse_file(file.path(), &mut NullAssetSource).unwrap();
        assert!(materials.contains_key("FromDisk"));
    }
}
