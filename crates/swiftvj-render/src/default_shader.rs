//! The fixed uniform block declaration shared by every generated shader
//! module, and the two built-in fallback shaders (`SPEC_FULL.md` §4.4 step
//! 4, §4.5).
//!
//! The block is declared as sixteen scalar `f32` fields rather than mixing
//! in `vec2f` members: WGSL's uniform-address-space layout rules require
//! `vec2f` fields to start at an 8-byte-aligned offset, which would insert
//! padding `swiftvj_core::ShaderUniforms` (a tightly packed `#[repr(C)]`
//! struct) does not have. All-scalar keeps the two layouts byte-identical.

/// WGSL source for the `Uniforms` struct and its group-0/binding-0
/// declaration. Interpolated into every shader module produced by
/// [`crate::transpile::transpile_glsl_to_wgsl`] and the two shaders below.
pub const UNIFORM_BLOCK_WGSL: &str = r#"struct Uniforms {
    time: f32,
    resolution_x: f32,
    resolution_y: f32,
    mouse_x: f32,
    mouse_y: f32,
    speed: f32,
    bass: f32,
    low_mid: f32,
    mid: f32,
    highs: f32,
    level: f32,
    kick_env: f32,
    kick_pulse: f32,
    beat: f32,
    energy_fast: f32,
    energy_slow: f32,
}

@group(0) @binding(0)
var<uniform> u: Uniforms;"#;

/// Built-in default shader: a plasma-style color field driven by
/// `u.time` and `u.bass`/`u.level`, bound in whenever the selected library
/// shader fails to load or transpile.
pub fn default_shader_source() -> String {
    format!(
        r#"{uniforms}

struct VertexOutput {{
    @builtin(position) clip_position: vec4f,
    @location(0) uv: vec2f,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {{
    var positions = array<vec2f, 4>(
        vec2f(-1.0, -1.0), vec2f(1.0, -1.0), vec2f(-1.0, 1.0), vec2f(1.0, 1.0)
    );
    let pos = positions[vertex_index];
    var out: VertexOutput;
    out.clip_position = vec4f(pos, 0.0, 1.0);
    out.uv = vec2f(pos.x * 0.5 + 0.5, 1.0 - (pos.y * 0.5 + 0.5));
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4f {{
    let uv = in.uv;
    let t = u.time;
    let wobble = sin(uv.x * 10.0 + t) + sin(uv.y * 10.0 - t * 1.3) + u.bass * 3.0;
    let shade = 0.5 + 0.5 * sin(wobble + u.level * 4.0);
    let color = vec3f(
        0.5 + 0.5 * sin(shade * 6.0),
        0.5 + 0.5 * sin(shade * 6.0 + 2.094),
        0.5 + 0.5 * sin(shade * 6.0 + 4.188),
    );
    return vec4f(color, 1.0);
}}
"#,
        uniforms = UNIFORM_BLOCK_WGSL,
    )
}

/// Built-in default mask shader: a radial vignette whose radius breathes
/// with `bass`/`level`/`kick_env`, emitting `vec4(vec3(g), 1.0)` as
/// `spec.md` §4.5 specifies.
pub fn default_mask_source() -> String {
    format!(
        r#"{uniforms}

struct VertexOutput {{
    @builtin(position) clip_position: vec4f,
    @location(0) uv: vec2f,
}}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {{
    var positions = array<vec2f, 4>(
        vec2f(-1.0, -1.0), vec2f(1.0, -1.0), vec2f(-1.0, 1.0), vec2f(1.0, 1.0)
    );
    let pos = positions[vertex_index];
    var out: VertexOutput;
    out.clip_position = vec4f(pos, 0.0, 1.0);
    out.uv = vec2f(pos.x * 0.5 + 0.5, 1.0 - (pos.y * 0.5 + 0.5));
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4f {{
    let centered = in.uv - vec2f(0.5, 0.5);
    let dist = length(centered) * 2.0;
    let radius = 0.55 + u.bass * 0.2 + u.level * 0.15 + u.kick_env * 0.1;
    let g = 1.0 - smoothstep(radius, radius + 0.4, dist);
    return vec4f(vec3f(g), 1.0);
}}
"#,
        uniforms = UNIFORM_BLOCK_WGSL,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shader_declares_both_entry_points() {
        let src = default_shader_source();
        assert!(src.contains("fn vs_main"));
        assert!(src.contains("fn fs_main"));
        assert!(src.contains("var<uniform> u: Uniforms;"));
    }

    #[test]
    fn default_mask_declares_both_entry_points() {
        let src = default_mask_source();
        assert!(src.contains("fn vs_main"));
        assert!(src.contains("fn fs_main"));
    }
}
