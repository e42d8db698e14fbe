//! hud-shaders: WGSL shader sources for glyph rendering.

/// Textured glyph quads. Vertices are in window pixels (y-down) and carry a
/// premultiplied linear tint; the texture holds straight-alpha RGBA.
pub const GLYPH_WGSL: &str = r#"
struct ViewportUniform {
    scale: vec2<f32>,      // 2/W, -2/H
    translate: vec2<f32>,  // (-1, +1)
};

@group(0) @binding(0) var<uniform> vp: ViewportUniform;
@group(1) @binding(0) var glyph_tex: texture_2d<f32>;
@group(1) @binding(1) var glyph_samp: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(
    @location(0) in_pos: vec2<f32>,
    @location(1) in_uv: vec2<f32>,
    @location(2) in_color: vec4<f32>,
) -> VsOut {
    var out: VsOut;
    let ndc = vec2<f32>(in_pos.x * vp.scale.x + vp.translate.x,
                        in_pos.y * vp.scale.y + vp.translate.y);
    out.pos = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = in_uv;
    out.color = in_color;
    return out;
}

@fragment
fn fs_main(inp: VsOut) -> @location(0) vec4<f32> {
    let texel = textureSample(glyph_tex, glyph_samp, inp.uv);
    // Tint is premultiplied; scale it by the texel colour and coverage.
    return vec4<f32>(inp.color.rgb * texel.rgb, inp.color.a) * texel.a;
}
"#;
