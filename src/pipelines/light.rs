//! Lighting accumulation: one additive full-screen pipeline per light kind.

use crate::{
    data_structures::{
        light::{LightKind, LIGHT_STRATEGIES},
        mesh::{ModelVertex, Vertex},
    },
    pipelines::{color_target, mk_render_pipeline, Layouts, PipelineDesc, ADDITIVE},
    resources::targets::HDR_FORMAT,
};

#[derive(Debug)]
pub struct LightPipelines {
    /// Indexed like `LIGHT_STRATEGIES`.
    pipelines: Vec<(LightKind, wgpu::RenderPipeline)>,
}

impl LightPipelines {
    pub fn new(device: &wgpu::Device, layouts: &Layouts, module: &wgpu::ShaderModule) -> Self {
        let layout = Layouts::pipeline_layout(
            device,
            "Light Pipeline Layout",
            &[&layouts.gbuffer, &layouts.light, &layouts.shadow_maps],
        );
        let targets = [color_target(HDR_FORMAT, Some(ADDITIVE))];
        let pipelines = LIGHT_STRATEGIES
            .iter()
            .map(|strategy| {
                let label = format!("Light Pipeline {:?}", strategy.kind);
                let pipeline = mk_render_pipeline(
                    device,
                    &PipelineDesc {
                        label: &label,
                        layout: &layout,
                        module,
                        vertex_entry: "vs_fullscreen",
                        fragment_entry: Some(strategy.entry_point),
                        targets: &targets,
                        vertex_layouts: &[ModelVertex::desc()],
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        cull_mode: None,
                        depth_stencil: None,
                    },
                );
                (strategy.kind, pipeline)
            })
            .collect();
        Self { pipelines }
    }

    pub fn get(&self, kind: LightKind) -> Option<&wgpu::RenderPipeline> {
        self.pipelines
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, pipeline)| pipeline)
    }
}
