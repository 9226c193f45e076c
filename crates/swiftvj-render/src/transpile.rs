//! Best-effort GLSL -> WGSL conversion for the generator/mask shader
//! library.
//!
//! This is deliberately the "minimal substitution scheme" the design notes
//! (`SPEC_FULL.md` §9, Open Question 1) call out rather than a real
//! transpiler: it rewrites the handful of GLSL spellings the library's
//! shaders are expected to use and wraps the result in the fixed
//! vertex+fragment pair every tile shares. A source the scheme can't
//! confidently rewrite is rejected with [`TranspileError`] so the caller can
//! fall back to the built-in default shader (`SPEC_FULL.md` §4.4 step 4)
//! rather than hand a broken module to the GPU.
//!
//! Convention: library shaders define a single entry point,
//! `vec3 mainImage(vec2 uv)`, returning an RGB color for the normalized
//! `[0,1]^2` fragment coordinate `uv`. This mirrors the Shadertoy-style
//! convention the rated shader collection this engine draws from already
//! uses.

use crate::default_shader::UNIFORM_BLOCK_WGSL;

/// A GLSL source failed the best-effort rewrite.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TranspileError {
    /// No `mainImage` entry point was found.
    #[error("no `mainImage` entry point found in shader source")]
    MissingEntryPoint,

    /// Braces in the source are unbalanced, so the entry-point body
    /// couldn't be extracted.
    #[error("unbalanced braces while extracting mainImage body")]
    UnbalancedBraces,
}

/// Rewrites GLSL vector/matrix/builtin spellings to their WGSL
/// equivalents. Order matters: longer/more specific patterns are replaced
/// before their substrings.
fn rewrite_builtins(src: &str) -> String {
    let mut out = src.to_string();
    let pairs: &[(&str, &str)] = &[
        ("mat4", "mat4x4f"),
        ("mat3", "mat3x3f"),
        ("mat2", "mat2x2f"),
        ("vec4", "vec4f"),
        ("vec3", "vec3f"),
        ("vec2", "vec2f"),
        ("texture2D(", "textureSample(tex, samp, "),
        ("fract(", "fract("),
        // GLSL-style flat uniform names, rewritten to field access on the
        // WGSL `u` binding declared in `UNIFORM_BLOCK_WGSL`.
        ("u_time", "u.time"),
        ("u_speed", "u.speed"),
        ("u_bass", "u.bass"),
        ("u_low_mid", "u.low_mid"),
        ("u_mid", "u.mid"),
        ("u_highs", "u.highs"),
        ("u_level", "u.level"),
        ("u_kick_env", "u.kick_env"),
        ("u_kick_pulse", "u.kick_pulse"),
        ("u_beat", "u.beat"),
        ("u_energy_fast", "u.energy_fast"),
        ("u_energy_slow", "u.energy_slow"),
    ];
    for (glsl, wgsl) in pairs {
        out = out.replace(glsl, wgsl);
    }
    out = rewrite_mix(&out);
    out = rewrite_mod(&out);
    out = rewrite_atan2(&out);
    out
}

/// GLSL and WGSL both spell 3-argument linear interpolation `mix(a, b, t)`,
/// so this is an identity pass kept for documentation/extension purposes
/// (a future WGSL revision could rename it).
fn rewrite_mix(src: &str) -> String {
    src.to_string()
}

/// WGSL has no `mod()` builtin; rewrites `mod(a, b)` to the equivalent
/// `(a - b * floor(a / b))`. Only handles the common single-call-per-line
/// case the library's shaders use; nested `mod(mod(...), ...)` is left
/// alone and will fail to compile downstream, which is an acceptable
/// "best-effort" limitation.
fn rewrite_mod(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(pos) = rest.find("mod(") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 4..];
        if let Some((args, tail)) = split_call_args(after) {
            if let Some(comma) = top_level_comma(&args) {
                let a = args[..comma].trim();
                let b = args[comma + 1..].trim();
                out.push_str(&format!("({a} - {b} * floor({a} / {b}))"));
            } else {
                out.push_str("mod(");
                out.push_str(&args);
                out.push(')');
            }
            rest = tail;
        } else {
            out.push_str("mod(");
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Rewrites the two-argument `atan(y, x)` form to WGSL's `atan2(y, x)`.
/// Single-argument `atan(x)` is left untouched since both languages spell
/// it the same way.
fn rewrite_atan2(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(pos) = rest.find("atan(") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 5..];
        if let Some((args, tail)) = split_call_args(after) {
            if top_level_comma(&args).is_some() {
                out.push_str("atan2(");
                out.push_str(&args);
                out.push(')');
            } else {
                out.push_str("atan(");
                out.push_str(&args);
                out.push(')');
            }
            rest = tail;
        } else {
            out.push_str("atan(");
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Given the text just after an opening `(`, returns the matching
/// argument-list text and everything after the closing `)`.
fn split_call_args(src: &str) -> Option<(String, &str)> {
    let mut depth = 1i32;
    for (i, c) in src.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((src[..i].to_string(), &src[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Finds the top-level (depth-0) comma in an argument list, ignoring
/// commas nested inside parentheses.
fn top_level_comma(args: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in args.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Extracts the body of `vec3 mainImage(vec2 uv) { ... }` (pre-rewrite, so
/// matching against the original GLSL spelling).
fn extract_main_image_body(src: &str) -> Result<String, TranspileError> {
    let needle = "mainImage";
    let start = src.find(needle).ok_or(TranspileError::MissingEntryPoint)?;
    let brace_start = src[start..].find('{').ok_or(TranspileError::UnbalancedBraces)? + start;

    let mut depth = 0i32;
    for (i, c) in src[brace_start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(src[brace_start + 1..brace_start + i].to_string());
                }
            }
            _ => {}
        }
    }
    Err(TranspileError::UnbalancedBraces)
}

/// Converts a GLSL `mainImage`-style shader source into a complete WGSL
/// module binding the fixed uniform block, ready to hand to
/// `wgpu::Device::create_shader_module`.
///
/// On failure, the caller is expected to bind the built-in default shader
/// instead (`SPEC_FULL.md` §4.4 step 4) - this function never panics on
/// malformed input, it only returns [`TranspileError`].
pub fn transpile_glsl_to_wgsl(glsl_source: &str) -> Result<String, TranspileError> {
    let body = extract_main_image_body(glsl_source)?;
    let body = rewrite_builtins(&body);

    Ok(format!(
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

fn main_image(uv: vec2f, resolution: vec2f, mouse: vec2f) -> vec3f {{
    {body}
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4f {{
    let uv: vec2f = in.uv;
    let resolution = vec2f(u.resolution_x, u.resolution_y);
    let mouse = vec2f(u.mouse_x, u.mouse_y);
    return vec4f(main_image(uv, resolution, mouse), 1.0);
}}
"#,
        uniforms = UNIFORM_BLOCK_WGSL,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_point_is_rejected() {
        let result = transpile_glsl_to_wgsl("vec3 notMainImage(vec2 uv) { return vec3(0.0); }");
        assert_eq!(result.unwrap_err(), TranspileError::MissingEntryPoint);
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        let result = transpile_glsl_to_wgsl("vec3 mainImage(vec2 uv) { return vec3(0.0);");
        assert_eq!(result.unwrap_err(), TranspileError::UnbalancedBraces);
    }

    #[test]
    fn valid_source_wraps_into_vertex_fragment_pair() {
        let glsl = "vec3 mainImage(vec2 uv) { return vec3(uv.x, uv.y, 0.0); }";
        let wgsl = transpile_glsl_to_wgsl(glsl).unwrap();
        assert!(wgsl.contains("fn vs_main"));
        assert!(wgsl.contains("fn fs_main"));
        assert!(wgsl.contains("return vec3f(uv.x, uv.y, 0.0);"));
    }

    #[test]
    fn main_image_body_is_wrapped_in_vec4_before_returning_from_fs_main() {
        // `mainImage` returns vec3f; fs_main is declared to return vec4f, so
        // the body must land inside a vec3f-returning helper, not spliced
        // straight into fs_main.
        let glsl = "vec3 mainImage(vec2 uv) { return vec3(uv.x, uv.y, 0.0); }";
        let wgsl = transpile_glsl_to_wgsl(glsl).unwrap();
        assert!(wgsl.contains("fn main_image(uv: vec2f, resolution: vec2f, mouse: vec2f) -> vec3f"));
        assert!(wgsl.contains("return vec4f(main_image(uv, resolution, mouse), 1.0);"));
    }

    #[test]
    fn mod_is_rewritten_to_remainder_formula() {
        let glsl = "vec3 mainImage(vec2 uv) { float x = mod(uv.x, 1.0); return vec3(x); }";
        let wgsl = transpile_glsl_to_wgsl(glsl).unwrap();
        assert!(wgsl.contains("(uv.x - 1.0 * floor(uv.x / 1.0))"));
    }

    #[test]
    fn atan_with_two_args_becomes_atan2() {
        let glsl = "vec3 mainImage(vec2 uv) { float a = atan(uv.y, uv.x); return vec3(a); }";
        let wgsl = transpile_glsl_to_wgsl(glsl).unwrap();
        assert!(wgsl.contains("atan2(uv.y, uv.x)"));
    }

    #[test]
    fn single_arg_atan_is_untouched() {
        let glsl = "vec3 mainImage(vec2 uv) { float a = atan(uv.x); return vec3(a); }";
        let wgsl = transpile_glsl_to_wgsl(glsl).unwrap();
        assert!(wgsl.contains("atan(uv.x)"));
    }
}
