//! Ambient term and tone-mapping composite.

use crate::{
    config::FrameParams,
    data_structures::mesh::{ModelVertex, Vertex},
    pipelines::{color_target, mk_render_pipeline, Layouts, PipelineDesc, ADDITIVE},
    resources::targets::HDR_FORMAT,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniform {
    /// rgb = global illumination
    pub ambient: [f32; 4],
    /// x = exposure, y = gamma
    pub tone: [f32; 4],
}

impl From<&FrameParams> for CompositeUniform {
    fn from(params: &FrameParams) -> Self {
        Self {
            ambient: params.global_illumination.extend(0.0).into(),
            tone: [params.exposure, params.gamma, 0.0, 0.0],
        }
    }
}

#[derive(Debug)]
pub struct CompositePipelines {
    /// Adds `global_illumination * albedo` to the HDR target.
    pub ambient: wgpu::RenderPipeline,
    /// Writes `pow(hdr * exposure, 1 / gamma)` to the output.
    pub composite: wgpu::RenderPipeline,
}

impl CompositePipelines {
    pub fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        module: &wgpu::ShaderModule,
        output_format: wgpu::TextureFormat,
    ) -> Self {
        let ambient_layout =
            Layouts::pipeline_layout(device, "Ambient Pipeline Layout", &[&layouts.composite]);
        let composite_layout = Layouts::pipeline_layout(
            device,
            "Composite Pipeline Layout",
            &[&layouts.composite, &layouts.hdr],
        );
        let fullscreen = |label: &str,
                          layout: &wgpu::PipelineLayout,
                          fragment_entry: &str,
                          target: Option<wgpu::ColorTargetState>| {
            mk_render_pipeline(
                device,
                &PipelineDesc {
                    label,
                    layout,
                    module,
                    vertex_entry: "vs_fullscreen",
                    fragment_entry: Some(fragment_entry),
                    targets: &[target],
                    vertex_layouts: &[ModelVertex::desc()],
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    depth_stencil: None,
                },
            )
        };

        Self {
            ambient: fullscreen(
                "Ambient Pipeline",
                &ambient_layout,
                "fs_ambient",
                color_target(HDR_FORMAT, Some(ADDITIVE)),
            ),
            composite: fullscreen(
                "Composite Pipeline",
                &composite_layout,
                "fs_composite",
                color_target(output_format, None),
            ),
        }
    }
}
