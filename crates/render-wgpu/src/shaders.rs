/// WGSL shader for the lit grid. Vertices arrive already in clip space with
/// a straight-alpha color; blending is done by the pipeline.
pub const FLOOR_SHADER: &str = r#"
struct FloorVertex {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
};

struct FloorOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_floor(vertex: FloorVertex) -> FloorOutput {
    var out: FloorOutput;
    out.clip_position = vec4<f32>(vertex.position, 0.0, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_floor(in: FloorOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
