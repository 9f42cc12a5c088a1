//! Render pipelines, one module per pass, plus the bind group layouts they
//! share.

pub mod composite;
pub mod debug;
pub mod geometry;
pub mod light;
pub mod shadow;

use crate::{
    camera::CameraUniform,
    data_structures::{
        instance::{BonePalette, DebugRaw, InstanceRaw},
        light::LightUniform,
    },
    pipelines::composite::CompositeUniform,
    resources::uniforms::binding_size,
    shadow::{FaceUniform, ShadowUniform},
};

pub const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub layout: &'a wgpu::PipelineLayout,
    pub module: &'a wgpu::ShaderModule,
    pub vertex_entry: &'a str,
    /// `None` for depth-only pipelines.
    pub fragment_entry: Option<&'a str>,
    pub targets: &'a [Option<wgpu::ColorTargetState>],
    pub vertex_layouts: &'a [wgpu::VertexBufferLayout<'a>],
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
}

pub fn mk_render_pipeline(device: &wgpu::Device, desc: &PipelineDesc) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.module,
            entry_point: Some(desc.vertex_entry),
            buffers: desc.vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: desc.fragment_entry.map(|entry_point| wgpu::FragmentState {
            module: desc.module,
            entry_point: Some(entry_point),
            targets: desc.targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: desc.depth_stencil.clone(),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

pub fn color_target(
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format,
        blend,
        write_mask: wgpu::ColorWrites::ALL,
    })
}

pub fn depth_state(write: bool, compare: wgpu::CompareFunction) -> Option<wgpu::DepthStencilState> {
    Some(wgpu::DepthStencilState {
        format: crate::data_structures::texture::Texture::DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
    min_binding_size: Option<std::num::NonZeroU64>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size,
        },
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    sample_type: wgpu::TextureSampleType,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension,
            sample_type,
        },
        count: None,
    }
}

const UNFILTERED: wgpu::TextureSampleType = wgpu::TextureSampleType::Float { filterable: false };

/// Every bind group layout, created once at init.
#[derive(Debug)]
pub struct Layouts {
    pub camera: wgpu::BindGroupLayout,
    pub instance: wgpu::BindGroupLayout,
    pub bones: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub face: wgpu::BindGroupLayout,
    pub gbuffer: wgpu::BindGroupLayout,
    pub light: wgpu::BindGroupLayout,
    pub shadow_maps: wgpu::BindGroupLayout,
    pub composite: wgpu::BindGroupLayout,
    pub hdr: wgpu::BindGroupLayout,
    pub debug_shape: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertex_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let layout = |label: &str, entries: &[wgpu::BindGroupLayoutEntry]| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries,
            })
        };

        let mut material_entries: Vec<_> = (0..4)
            .map(|binding| {
                texture_entry(
                    binding,
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::TextureViewDimension::D2,
                )
            })
            .collect();
        material_entries.push(wgpu::BindGroupLayoutEntry {
            binding: 4,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });

        Self {
            camera: layout(
                "camera_bind_group_layout",
                &[uniform_entry(0, vertex_fragment, false, binding_size::<CameraUniform>())],
            ),
            instance: layout(
                "instance_bind_group_layout",
                &[uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX,
                    true,
                    binding_size::<InstanceRaw>(),
                )],
            ),
            bones: layout(
                "bones_bind_group_layout",
                &[uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX,
                    true,
                    binding_size::<BonePalette>(),
                )],
            ),
            material: layout("material_bind_group_layout", &material_entries),
            face: layout(
                "shadow_face_bind_group_layout",
                &[uniform_entry(0, vertex_fragment, true, binding_size::<FaceUniform>())],
            ),
            gbuffer: layout(
                "gbuffer_bind_group_layout",
                &[
                    texture_entry(0, UNFILTERED, wgpu::TextureViewDimension::D2),
                    texture_entry(1, UNFILTERED, wgpu::TextureViewDimension::D2),
                    texture_entry(2, UNFILTERED, wgpu::TextureViewDimension::D2),
                    texture_entry(
                        3,
                        wgpu::TextureSampleType::Depth,
                        wgpu::TextureViewDimension::D2,
                    ),
                    uniform_entry(
                        4,
                        wgpu::ShaderStages::FRAGMENT,
                        false,
                        binding_size::<CameraUniform>(),
                    ),
                ],
            ),
            light: layout(
                "light_bind_group_layout",
                &[
                    uniform_entry(
                        0,
                        wgpu::ShaderStages::FRAGMENT,
                        false,
                        binding_size::<LightUniform>(),
                    ),
                    uniform_entry(
                        1,
                        wgpu::ShaderStages::FRAGMENT,
                        false,
                        binding_size::<ShadowUniform>(),
                    ),
                ],
            ),
            shadow_maps: layout(
                "shadow_maps_bind_group_layout",
                &[
                    texture_entry(
                        0,
                        wgpu::TextureSampleType::Depth,
                        wgpu::TextureViewDimension::D2,
                    ),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                        count: None,
                    },
                    texture_entry(2, UNFILTERED, wgpu::TextureViewDimension::D2Array),
                ],
            ),
            composite: layout(
                "composite_bind_group_layout",
                &[
                    texture_entry(0, UNFILTERED, wgpu::TextureViewDimension::D2),
                    uniform_entry(
                        1,
                        wgpu::ShaderStages::FRAGMENT,
                        false,
                        binding_size::<CompositeUniform>(),
                    ),
                ],
            ),
            hdr: layout(
                "hdr_bind_group_layout",
                &[texture_entry(0, UNFILTERED, wgpu::TextureViewDimension::D2)],
            ),
            debug_shape: layout(
                "debug_shape_bind_group_layout",
                &[uniform_entry(0, vertex_fragment, true, binding_size::<DebugRaw>())],
            ),
        }
    }

    pub fn pipeline_layout(
        device: &wgpu::Device,
        label: &str,
        groups: &[&wgpu::BindGroupLayout],
    ) -> wgpu::PipelineLayout {
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: groups,
            push_constant_ranges: &[],
        })
    }
}
