//! Geometry pass: fills the G-buffer from every submitted mesh instance.

use crate::{
    data_structures::mesh::{MeshKind, ModelVertex, SkinnedVertex, Vertex},
    pipelines::{color_target, depth_state, mk_render_pipeline, Layouts, PipelineDesc},
    resources::targets::GBuffer,
};

#[derive(Debug)]
pub struct GeometryPipelines {
    pub static_mesh: wgpu::RenderPipeline,
    pub skinned_mesh: wgpu::RenderPipeline,
}

impl GeometryPipelines {
    pub fn new(device: &wgpu::Device, layouts: &Layouts, module: &wgpu::ShaderModule) -> Self {
        let targets = GBuffer::FORMATS.map(|format| color_target(format, None));
        let static_layout = Layouts::pipeline_layout(
            device,
            "Geometry Static Pipeline Layout",
            &[&layouts.camera, &layouts.instance, &layouts.material],
        );
        let skinned_layout = Layouts::pipeline_layout(
            device,
            "Geometry Skinned Pipeline Layout",
            &[
                &layouts.camera,
                &layouts.instance,
                &layouts.material,
                &layouts.bones,
            ],
        );
        let pipeline = |label: &str,
                        layout: &wgpu::PipelineLayout,
                        vertex_entry: &str,
                        vertex_layout: wgpu::VertexBufferLayout<'static>| {
            mk_render_pipeline(
                device,
                &PipelineDesc {
                    label,
                    layout,
                    module,
                    vertex_entry,
                    fragment_entry: Some("fs_main"),
                    targets: &targets,
                    vertex_layouts: &[vertex_layout],
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    depth_stencil: depth_state(true, wgpu::CompareFunction::Less),
                },
            )
        };

        Self {
            static_mesh: pipeline(
                "Geometry Static Pipeline",
                &static_layout,
                "vs_static",
                ModelVertex::desc(),
            ),
            skinned_mesh: pipeline(
                "Geometry Skinned Pipeline",
                &skinned_layout,
                "vs_skinned",
                SkinnedVertex::desc(),
            ),
        }
    }

    pub fn for_kind(&self, kind: MeshKind) -> &wgpu::RenderPipeline {
        match kind {
            MeshKind::Static => &self.static_mesh,
            MeshKind::Animated => &self.skinned_mesh,
        }
    }
}
