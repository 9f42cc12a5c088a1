//! Unlit wireframe overlay, depth-tested against the G-buffer depth.

use crate::{
    data_structures::mesh::{ModelVertex, Vertex},
    pipelines::{color_target, depth_state, mk_render_pipeline, Layouts, PipelineDesc},
};

pub fn mk_debug_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    module: &wgpu::ShaderModule,
    output_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = Layouts::pipeline_layout(
        device,
        "Debug Pipeline Layout",
        &[&layouts.camera, &layouts.debug_shape],
    );
    mk_render_pipeline(
        device,
        &PipelineDesc {
            label: "Debug Pipeline",
            layout: &layout,
            module,
            vertex_entry: "vs_main",
            fragment_entry: Some("fs_main"),
            targets: &[color_target(output_format, None)],
            vertex_layouts: &[ModelVertex::desc()],
            topology: wgpu::PrimitiveTopology::LineList,
            cull_mode: None,
            depth_stencil: depth_state(false, wgpu::CompareFunction::LessEqual),
        },
    )
}
