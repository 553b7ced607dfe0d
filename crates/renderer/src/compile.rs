use std::borrow::Cow;

use anyhow::{anyhow, Result};
use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::ShaderStage;

/// Compiles the cube vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("cube vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Hands an already wrapped and validated fragment program to wgpu.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    label: &str,
    wrapped: String,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Produces a self-contained GLSL fragment program from a Shadertoy body.
///
/// 1. Strip `#version` directives and Shadertoy uniform declarations so our
///    own definitions win.
/// 2. Prepend [`HEADER`], which declares the uniform block shared with the
///    vertex stage and aliases the Shadertoy names onto it.
/// 3. Append [`FOOTER`], which remaps `gl_FragCoord` to a bottom-left origin,
///    calls `mainImage`, and writes `outColor`.
///
/// Nothing checks that the body defines `mainImage`; [`validate_fragment`]
/// reports that case.
pub fn compose_fragment_source(body: &str) -> String {
    let mut sanitized = String::new();
    let mut skipped_version = false;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if !skipped_version && trimmed.starts_with("#version") {
            skipped_version = true;
            continue;
        }
        if is_shadertoy_uniform(trimmed) {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    format!("{HEADER}\n#line 1\n{sanitized}{FOOTER}")
}

fn is_shadertoy_uniform(line: &str) -> bool {
    const NAMES: [&str; 9] = [
        "iResolution",
        "iTime",
        "iTimeDelta",
        "iFrame",
        "iMouse",
        "iDate",
        "iSampleRate",
        "iChannel",
        "iGlobalTime",
    ];
    line.starts_with("uniform ") && NAMES.iter().any(|name| line.contains(name))
}

/// Parses and validates a wrapped fragment program with naga so a broken
/// shader is rejected before wgpu sees it.
pub fn validate_fragment(source: &str) -> Result<()> {
    validate_stage(source, ShaderStage::Fragment)
}

fn validate_stage(source: &str, stage: ShaderStage) -> Result<()> {
    let mut frontend = Frontend::default();
    let module = frontend
        .parse(&Options::from(stage), source)
        .map_err(|err| anyhow!("GLSL parse failed:\n{}", err.emit_to_string(source)))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| anyhow!("GLSL validation failed:\n{}", err.emit_to_string(source)))?;
    Ok(())
}

/// Uniform block shared by both stages. Must match `gpu::uniforms::CubeUniforms`
/// byte for byte.
macro_rules! uniform_block {
    () => {
        r"layout(std140, set = 0, binding = 0) uniform CubeParams {
    mat4 _mvp;
    vec3 _iResolution;
    float _iTime;
    vec4 _iMouse;
    float _iTimeDelta;
    int _iFrame;
    vec2 _padding0;
} ubo;
"
    };
}

const HEADER: &str = concat!(
    r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

",
    uniform_block!(),
    r"
#define iResolution ubo._iResolution
#define iTime ubo._iTime
#define iGlobalTime ubo._iTime
#define iTimeDelta ubo._iTimeDelta
#define iFrame ubo._iFrame
#define iMouse ubo._iMouse

vec4 cubesearch_FragCoord;
#define gl_FragCoord cubesearch_FragCoord
"
);

const FOOTER: &str = r"void main() {
    // Read the hardware builtin, then expose Shadertoy's bottom-left origin.
    #undef gl_FragCoord
    vec2 builtinFC = vec2(gl_FragCoord.x, gl_FragCoord.y);
    #define gl_FragCoord cubesearch_FragCoord

    vec2 fragCoord = vec2(builtinFC.x, iResolution.y - builtinFC.y);
    cubesearch_FragCoord = vec4(fragCoord, 0.0, 1.0);

    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    outColor = vec4(color.rgb, 1.0);
}
";

const VERTEX_SHADER_GLSL: &str = concat!(
    r"#version 450
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec2 a_uv;
layout(location = 0) out vec2 v_uv;

",
    uniform_block!(),
    r"
void main() {
    v_uv = a_uv;
    gl_Position = ubo._mvp * vec4(a_position, 1.0);
}
"
);
