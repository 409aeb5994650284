//! WGSL templating, validation and reflection.
//!
//! Reflection stands in for the GL attribute/uniform location queries: vertex
//! inputs are found by name on `vs_main`, uniforms by member name on the block
//! bound at group 0, binding 0.

use std::collections::HashMap;

use super::{RenderError, Result};

/// Replace whole identifier tokens of `source` that match a substitution key.
///
/// `NUM_BINS` is replaced in `array<vec4<f32>, NUM_BINS>` but not in `NUM_BINS_X`.
pub fn template_shader(source: &str, substitutions: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut token = String::new();

    let flush = |token: &mut String, out: &mut String| {
        if token.is_empty() {
            return;
        }
        match substitutions.iter().find(|(key, _)| *key == token.as_str()) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(token),
        }
        token.clear();
    };

    for c in source.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            token.push(c);
        } else {
            flush(&mut token, &mut out);
            out.push(c);
        }
    }
    flush(&mut token, &mut out);

    out
}

/// WGSL source with a closed set of placeholder identifiers
#[derive(Debug, Clone)]
pub struct ShaderTemplate {
    source: &'static str,
    placeholders: &'static [&'static str],
}

impl ShaderTemplate {
    pub const fn new(source: &'static str, placeholders: &'static [&'static str]) -> Self {
        Self {
            source,
            placeholders,
        }
    }

    /// Substitute every placeholder. Keys outside the set and placeholders
    /// left in the output are errors.
    pub fn instantiate(&self, substitutions: &[(&str, String)]) -> Result<String> {
        if let Some((key, _)) = substitutions
            .iter()
            .find(|(key, _)| !self.placeholders.iter().any(|p| p == key))
        {
            return Err(RenderError::UnknownPlaceholder(key.to_string()));
        }

        let output = template_shader(self.source, substitutions);

        let unresolved: Vec<String> = self
            .placeholders
            .iter()
            .filter(|placeholder| contains_token(&output, placeholder))
            .map(|placeholder| placeholder.to_string())
            .collect();
        if !unresolved.is_empty() {
            return Err(RenderError::UnresolvedPlaceholders(unresolved));
        }

        Ok(output)
    }
}

fn contains_token(source: &str, token: &str) -> bool {
    source
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|t| t == token)
}

/// Parse and validate WGSL. The error carries the compiler diagnostic text.
pub fn validate_wgsl(source: &str) -> std::result::Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("validation error: {}", e.as_inner()))?;

    Ok(module)
}

/// Vertex input bound by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeInfo {
    pub location: u32,
    /// Floats per vertex (1 to 4)
    pub components: u32,
}

/// Member of the uniform block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformInfo {
    /// Byte offset in the block
    pub offset: u32,
    /// Total byte size of the member
    pub size: u32,
    /// Byte stride between array elements (0 for non-arrays)
    pub stride: u32,
    /// Array length (1 for non-arrays)
    pub count: u32,
}

/// Attribute and uniform location tables of a linked program
#[derive(Debug, Clone, Default)]
pub struct ProgramLayout {
    pub attributes: HashMap<String, AttributeInfo>,
    pub uniforms: HashMap<String, UniformInfo>,
    /// Size of the uniform block in bytes (0 if the program has none)
    pub uniform_block_size: u32,
}

impl ProgramLayout {
    /// Attributes ordered by location
    pub fn sorted_attributes(&self) -> Vec<(&str, AttributeInfo)> {
        let mut attributes: Vec<_> = self
            .attributes
            .iter()
            .map(|(name, info)| (name.as_str(), *info))
            .collect();
        attributes.sort_by_key(|(_, info)| info.location);
        attributes
    }
}

/// Build the location tables for a vertex/fragment pair
pub fn reflect_program(vertex: &naga::Module, fragment: &naga::Module) -> ProgramLayout {
    let mut layout = ProgramLayout::default();
    reflect_attributes(vertex, &mut layout);
    for module in [vertex, fragment] {
        reflect_uniforms(module, &mut layout);
    }
    layout
}

fn reflect_attributes(module: &naga::Module, layout: &mut ProgramLayout) {
    let Some(entry) = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga::ShaderStage::Vertex)
    else {
        return;
    };

    for argument in &entry.function.arguments {
        match (&argument.binding, &argument.name) {
            (Some(binding), Some(name)) => {
                insert_attribute(module, layout, name, binding, argument.ty);
            }
            // Struct argument: inputs live on the members
            (None, _) => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[argument.ty].inner {
                    for member in members {
                        if let (Some(binding), Some(name)) = (&member.binding, &member.name) {
                            insert_attribute(module, layout, name, binding, member.ty);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn insert_attribute(
    module: &naga::Module,
    layout: &mut ProgramLayout,
    name: &str,
    binding: &naga::Binding,
    ty: naga::Handle<naga::Type>,
) {
    let naga::Binding::Location { location, .. } = binding else {
        // Built-ins such as vertex_index
        return;
    };
    let components = match module.types[ty].inner {
        naga::TypeInner::Scalar(_) => 1,
        naga::TypeInner::Vector { size, .. } => size as u32,
        _ => return,
    };
    layout.attributes.insert(
        name.to_string(),
        AttributeInfo {
            location: *location,
            components,
        },
    );
}

fn reflect_uniforms(module: &naga::Module, layout: &mut ProgramLayout) {
    let block = module.global_variables.iter().find(|(_, var)| {
        var.space == naga::AddressSpace::Uniform
            && matches!(
                var.binding,
                Some(naga::ResourceBinding {
                    group: 0,
                    binding: 0
                })
            )
    });
    let Some((_, var)) = block else {
        return;
    };
    let naga::TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
        return;
    };

    layout.uniform_block_size = layout.uniform_block_size.max(*span);
    for member in members {
        let Some(name) = &member.name else {
            continue;
        };
        let inner = &module.types[member.ty].inner;
        let size = inner.size(module.to_ctx());
        let (stride, count) = match inner {
            naga::TypeInner::Array {
                size: naga::ArraySize::Constant(count),
                stride,
                ..
            } => (*stride, count.get()),
            _ => (0, 1),
        };
        layout.uniforms.insert(
            name.clone(),
            UniformInfo {
                offset: member.offset,
                size,
                stride,
                count,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = r#"
struct Uniforms {
    scale: vec2<f32>,
    level: f32,
    values: array<vec4<f32>, 3>,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) weight: f32) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(position * u.scale * weight, 0.0, 1.0);
    return out;
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.values[0] * u.level;
}
"#;

    #[test]
    fn test_template_replaces_whole_tokens() {
        let out = template_shader(
            "array<f32, N> N_MAX xN N",
            &[("N", "8".to_string())],
        );
        assert_eq!(out, "array<f32, 8> N_MAX xN 8");
    }

    #[test]
    fn test_instantiate_rejects_unknown_placeholder() {
        let template = ShaderTemplate::new("array<f32, N>", &["N"]);
        let err = template
            .instantiate(&[("N", "4".to_string()), ("M", "2".to_string())])
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownPlaceholder(ref key) if key == "M"));
    }

    #[test]
    fn test_instantiate_rejects_unresolved_placeholder() {
        let template = ShaderTemplate::new("array<f32, N>; let m = M;", &["N", "M"]);
        let err = template.instantiate(&[("N", "4".to_string())]).unwrap_err();
        match err {
            RenderError::UnresolvedPlaceholders(names) => assert_eq!(names, vec!["M"]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_instantiate_substitutes_all() {
        let template = ShaderTemplate::new("array<f32, N>", &["N"]);
        assert_eq!(
            template.instantiate(&[("N", "16".to_string())]).unwrap(),
            "array<f32, 16>"
        );
    }

    #[test]
    fn test_validate_reports_diagnostics() {
        let err = validate_wgsl("fn broken( {").unwrap_err();
        assert!(!err.is_empty());
        assert!(validate_wgsl(PROGRAM).is_ok());
    }

    #[test]
    fn test_reflect_attributes_and_uniforms() {
        let module = validate_wgsl(PROGRAM).unwrap();
        let layout = reflect_program(&module, &module);

        assert_eq!(
            layout.attributes["position"],
            AttributeInfo {
                location: 0,
                components: 2
            }
        );
        assert_eq!(layout.attributes["weight"].components, 1);

        let scale = layout.uniforms["scale"];
        assert_eq!((scale.offset, scale.size, scale.stride), (0, 8, 0));
        assert_eq!(layout.uniforms["level"].offset, 8);

        let values = layout.uniforms["values"];
        assert_eq!(values.offset, 16);
        assert_eq!(values.stride, 16);
        assert_eq!(values.count, 3);
        assert_eq!(values.size, 48);
        assert_eq!(layout.uniform_block_size, 64);

        let sorted = layout.sorted_attributes();
        assert_eq!(sorted[0].0, "position");
        assert_eq!(sorted[1].0, "weight");
    }
}
