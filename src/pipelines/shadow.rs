//! Shadow passes: depth-only for the spot map, linear distance for cube faces.

use crate::{
    data_structures::mesh::{MeshKind, ModelVertex, SkinnedVertex, Vertex},
    pipelines::{color_target, depth_state, mk_render_pipeline, Layouts, PipelineDesc},
    resources::targets::CUBE_SHADOW_FORMAT,
};

#[derive(Debug)]
pub struct ShadowPipelines {
    pub spot_static: wgpu::RenderPipeline,
    pub spot_skinned: wgpu::RenderPipeline,
    pub cube_static: wgpu::RenderPipeline,
    pub cube_skinned: wgpu::RenderPipeline,
}

impl ShadowPipelines {
    pub fn new(device: &wgpu::Device, layouts: &Layouts, module: &wgpu::ShaderModule) -> Self {
        let static_layout = Layouts::pipeline_layout(
            device,
            "Shadow Static Pipeline Layout",
            &[&layouts.face, &layouts.instance],
        );
        let skinned_layout = Layouts::pipeline_layout(
            device,
            "Shadow Skinned Pipeline Layout",
            &[&layouts.face, &layouts.instance, &layouts.bones],
        );
        let cube_targets = [color_target(CUBE_SHADOW_FORMAT, None)];
        // Culling is off so single-sided occluders still cast.
        let pipeline = |label: &str,
                        layout: &wgpu::PipelineLayout,
                        vertex_entry: &str,
                        vertex_layout: wgpu::VertexBufferLayout<'static>,
                        fragment_entry: Option<&str>,
                        targets: &[Option<wgpu::ColorTargetState>]| {
            mk_render_pipeline(
                device,
                &PipelineDesc {
                    label,
                    layout,
                    module,
                    vertex_entry,
                    fragment_entry,
                    targets,
                    vertex_layouts: &[vertex_layout],
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    depth_stencil: depth_state(true, wgpu::CompareFunction::Less),
                },
            )
        };

        Self {
            spot_static: pipeline(
                "Spot Shadow Static Pipeline",
                &static_layout,
                "vs_static",
                ModelVertex::desc(),
                None,
                &[],
            ),
            spot_skinned: pipeline(
                "Spot Shadow Skinned Pipeline",
                &skinned_layout,
                "vs_skinned",
                SkinnedVertex::desc(),
                None,
                &[],
            ),
            cube_static: pipeline(
                "Cube Shadow Static Pipeline",
                &static_layout,
                "vs_static",
                ModelVertex::desc(),
                Some("fs_distance"),
                &cube_targets,
            ),
            cube_skinned: pipeline(
                "Cube Shadow Skinned Pipeline",
                &skinned_layout,
                "vs_skinned",
                SkinnedVertex::desc(),
                Some("fs_distance"),
                &cube_targets,
            ),
        }
    }

    pub fn spot(&self, kind: MeshKind) -> &wgpu::RenderPipeline {
        match kind {
            MeshKind::Static => &self.spot_static,
            MeshKind::Animated => &self.spot_skinned,
        }
    }

    pub fn cube(&self, kind: MeshKind) -> &wgpu::RenderPipeline {
        match kind {
            MeshKind::Static => &self.cube_static,
            MeshKind::Animated => &self.cube_skinned,
        }
    }
}
