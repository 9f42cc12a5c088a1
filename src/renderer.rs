//! The deferred renderer.
//!
//! A [`Renderer`] owns every GPU resource it draws with. Callers open a
//! frame, submit meshes, lights and debug shapes, and close it; closing runs
//! the geometry pass, one shadow + accumulation step per light, the ambient
//! term, the tone-mapping composite and the debug overlay.

use std::{iter, sync::Arc};

use cgmath::{Matrix4, Point3, Rad, Vector3};

use crate::{
    camera::{Camera, CameraUniform, Projection},
    config::RendererConfig,
    context::Context,
    data_structures::{
        instance::{BonePalette, DebugRaw, InstanceRaw},
        light::{
            DirectionalLight, Light, LightId, LightUniform, PointLight, SpotLight, LIGHT_STRATEGIES,
        },
        material::{DefaultTextures, Material, MaterialHandle, MaterialSlot},
        mesh::{MeshHandle, MeshKind},
        texture::{create_comparison_sampler, create_default_sampler, Texture},
    },
    error::InitError,
    frame::{FramePlan, FrameState, PassCommand, RendererState},
    pipelines::{
        composite::{CompositePipelines, CompositeUniform},
        debug::mk_debug_pipeline,
        geometry::GeometryPipelines,
        light::LightPipelines,
        shadow::ShadowPipelines,
        Layouts,
    },
    resources::{
        fallback::Fallbacks,
        shader::{self, Shader},
        targets::{clear_attachment, load_attachment, padded_bytes_per_row, RenderTargets},
        uniforms::UniformArena,
    },
    shadow::{cube_view_projs, spot_view_proj, FaceUniform, ShadowSlots, ShadowUniform},
};

/// Rejects zero-sized targets and targets the device cannot allocate.
pub fn check_dimensions(config: &RendererConfig, limit: u32) -> Result<(), InitError> {
    let (width, height) = (config.width, config.height);
    if width == 0 || height == 0 {
        return Err(InitError::InvalidDimensions { width, height });
    }
    if width > limit || height > limit {
        return Err(InitError::DimensionsExceedLimit {
            width,
            height,
            limit,
        });
    }
    for edge in [config.shadows.spot_resolution, config.shadows.cube_resolution] {
        if edge == 0 {
            return Err(InitError::InvalidDimensions {
                width: edge,
                height: edge,
            });
        }
        if edge > limit {
            return Err(InitError::DimensionsExceedLimit {
                width: edge,
                height: edge,
                limit,
            });
        }
    }
    Ok(())
}

fn require_entry_points(shader: &Shader, entry_points: &[&str]) -> Result<(), InitError> {
    match entry_points.iter().find(|name| !shader.has_entry_point(name)) {
        Some(missing) => Err(InitError::PipelineLink {
            label: shader.path.display().to_string(),
            message: format!("missing entry point `{}`", missing),
        }),
        None => Ok(()),
    }
}

/// Per-frame bind data derived from the submissions.
struct FrameDraws {
    materials: Vec<wgpu::BindGroup>,
    /// Index into `materials` for each mesh instance.
    material_index: Vec<usize>,
    /// Bone arena slot for each animated mesh instance.
    bone_slots: Vec<Option<usize>>,
}

pub struct Renderer {
    ctx: Context,
    config: RendererConfig,
    state: RendererState,
    projection: Projection,
    targets: RenderTargets,
    fallbacks: Fallbacks,
    layouts: Layouts,
    geometry: GeometryPipelines,
    shadow: ShadowPipelines,
    lights: LightPipelines,
    composite: CompositePipelines,
    debug: wgpu::RenderPipeline,
    material_sampler: wgpu::Sampler,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    gbuffer_bind_group: wgpu::BindGroup,
    light_buffer: wgpu::Buffer,
    shadow_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
    shadow_maps_bind_group: wgpu::BindGroup,
    composite_buffer: wgpu::Buffer,
    composite_bind_group: wgpu::BindGroup,
    hdr_bind_group: wgpu::BindGroup,
    instances: UniformArena<InstanceRaw>,
    bones: UniformArena<BonePalette>,
    faces: UniformArena<FaceUniform>,
    debug_shapes: UniformArena<DebugRaw>,
    slots: ShadowSlots,
    last_plan: Option<FramePlan>,
}

impl Renderer {
    /// Allocates every target, pipeline and fallback asset.
    ///
    /// Any failure is fatal: no renderer is returned and nothing should be
    /// drawn.
    pub async fn init(ctx: Context, config: RendererConfig) -> Result<Self, InitError> {
        check_dimensions(&config, ctx.max_dimension())?;

        let load = |name: &str| Shader::load(&config.shader_dir, name);
        let geometry_shader = load(shader::GEOMETRY)?;
        let shadow_shader = load(shader::SHADOW)?;
        let lighting_shader = load(shader::LIGHTING)?;
        let composite_shader = load(shader::COMPOSITE)?;
        let debug_shader = load(shader::DEBUG)?;

        require_entry_points(&geometry_shader, &["vs_static", "vs_skinned", "fs_main"])?;
        require_entry_points(&shadow_shader, &["vs_static", "vs_skinned", "fs_distance"])?;
        let mut light_entries = vec!["vs_fullscreen"];
        light_entries.extend(LIGHT_STRATEGIES.iter().map(|s| s.entry_point));
        require_entry_points(&lighting_shader, &light_entries)?;
        require_entry_points(
            &composite_shader,
            &["vs_fullscreen", "fs_ambient", "fs_composite"],
        )?;
        require_entry_points(&debug_shader, &["vs_main", "fs_main"])?;

        let device = &ctx.device;
        let queue = &ctx.queue;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        // Backend shader translation failures are reported as internal errors.
        device.push_error_scope(wgpu::ErrorFilter::Internal);

        let targets = RenderTargets::new(device, &config);
        let fallbacks = Fallbacks::new(device, queue);
        let layouts = Layouts::new(device);

        let geometry =
            GeometryPipelines::new(device, &layouts, &geometry_shader.create_module(device));
        let shadow = ShadowPipelines::new(device, &layouts, &shadow_shader.create_module(device));
        let lights = LightPipelines::new(device, &layouts, &lighting_shader.create_module(device));
        let composite = CompositePipelines::new(
            device,
            &layouts,
            &composite_shader.create_module(device),
            config.output_format,
        );
        let debug = mk_debug_pipeline(
            device,
            &layouts,
            &debug_shader.create_module(device),
            config.output_format,
        );

        let uniform_buffer = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let camera_buffer = uniform_buffer("Camera Buffer", size_of::<CameraUniform>());
        let light_buffer = uniform_buffer("Light Buffer", size_of::<LightUniform>());
        let shadow_buffer = uniform_buffer("Shadow Buffer", size_of::<ShadowUniform>());
        let composite_buffer = uniform_buffer("Composite Buffer", size_of::<CompositeUniform>());

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        let gbuffer = &targets.gbuffer;
        let gbuffer_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.gbuffer,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.albedo.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.material.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: camera_buffer.as_entire_binding(),
                },
            ],
            label: Some("gbuffer_bind_group"),
        });
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.light,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: shadow_buffer.as_entire_binding(),
                },
            ],
            label: Some("light_bind_group"),
        });
        let shadow_sampler = create_comparison_sampler(device);
        let shadow_maps_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.shadow_maps,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&targets.spot_shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&targets.cube_shadow.view),
                },
            ],
            label: Some("shadow_maps_bind_group"),
        });
        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.composite,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.albedo.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: composite_buffer.as_entire_binding(),
                },
            ],
            label: Some("composite_bind_group"),
        });
        let hdr_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.hdr,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&targets.hdr.view),
            }],
            label: Some("hdr_bind_group"),
        });

        let instances =
            UniformArena::new(device, &layouts.instance, config.instance_capacity, "instances");
        let bones = UniformArena::new(device, &layouts.bones, 1, "bone palettes");
        let faces = UniformArena::new(device, &layouts.face, 6, "shadow faces");
        let debug_shapes =
            UniformArena::new(device, &layouts.debug_shape, config.debug_capacity, "debug shapes");
        let material_sampler = create_default_sampler(device);

        // Scopes pop in reverse push order, and all of them before returning.
        let internal = device.pop_error_scope().await;
        let out_of_memory = device.pop_error_scope().await;
        let validation = device.pop_error_scope().await;
        if let Some(error) = out_of_memory {
            return Err(InitError::TargetAllocation(error.to_string()));
        }
        if let Some(error) = internal.or(validation) {
            return Err(InitError::PipelineLink {
                label: "renderer".to_string(),
                message: error.to_string(),
            });
        }

        let projection = Projection::new(
            config.width,
            config.height,
            config.fovy,
            config.znear,
            config.zfar,
        );
        log::info!("renderer ready at {}x{}", config.width, config.height);

        Ok(Self {
            ctx,
            config,
            state: RendererState::new(),
            projection,
            targets,
            fallbacks,
            layouts,
            geometry,
            shadow,
            lights,
            composite,
            debug,
            material_sampler,
            camera_buffer,
            camera_bind_group,
            gbuffer_bind_group,
            light_buffer,
            shadow_buffer,
            light_bind_group,
            shadow_maps_bind_group,
            composite_buffer,
            composite_bind_group,
            hdr_bind_group,
            instances,
            bones,
            faces,
            debug_shapes,
            slots: ShadowSlots::default(),
            last_plan: None,
        })
    }

    /// Blocking variant of [`init`](Self::init).
    pub fn init_blocking(ctx: Context, config: RendererConfig) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(Self::init(ctx, config))?)
    }

    pub fn begin_frame(&mut self) {
        self.state.begin_frame();
    }

    /// Renders the open frame into the renderer's output target.
    ///
    /// Returns `false` (and does nothing) when no frame is open.
    pub fn end_frame(&mut self) -> bool {
        let target = self.targets.output.view.clone();
        self.end_frame_into(&target)
    }

    /// Like [`end_frame`](Self::end_frame) but composites into `target`,
    /// which must match the configured size and output format.
    pub fn end_frame_into(&mut self, target: &wgpu::TextureView) -> bool {
        let Some(plan) = self.state.end_frame() else {
            return false;
        };
        if let Err(e) = plan.validate() {
            log::error!("frame plan violates shadow map ordering: {}", e);
        }
        self.execute(&plan, target);
        self.last_plan = Some(plan);
        true
    }

    pub fn set_view_position<P: Into<Point3<f32>>>(
        &mut self,
        position: P,
        yaw: Rad<f32>,
        tilt: Rad<f32>,
    ) -> bool {
        self.state.set_view_position(position, yaw, tilt)
    }

    pub fn set_camera(&mut self, camera: Camera) -> bool {
        self.state.set_camera(camera)
    }

    pub fn set_global_illumination(&mut self, color: Vector3<f32>) -> bool {
        self.state.set_global_illumination(color)
    }

    pub fn set_gamma(&mut self, gamma: f32) -> bool {
        self.state.set_gamma(gamma)
    }

    pub fn set_exposure(&mut self, exposure: f32) -> bool {
        self.state.set_exposure(exposure)
    }

    pub fn global_illumination(&self) -> Vector3<f32> {
        self.state.global_illumination()
    }

    pub fn gamma(&self) -> f32 {
        self.state.gamma()
    }

    pub fn exposure(&self) -> f32 {
        self.state.exposure()
    }

    /// An animated mesh submitted here is skinned with the identity palette.
    pub fn add_static_mesh(
        &mut self,
        mesh: impl Into<Option<MeshHandle>>,
        material: impl Into<Option<MaterialHandle>>,
        transform: Matrix4<f32>,
    ) -> bool {
        self.state.add_static_mesh(mesh, material, transform)
    }

    /// Bones given with a static mesh are ignored.
    pub fn add_animated_mesh(
        &mut self,
        mesh: impl Into<Option<MeshHandle>>,
        material: impl Into<Option<MaterialHandle>>,
        transform: Matrix4<f32>,
        bones: &[Matrix4<f32>],
    ) -> bool {
        let mesh = mesh.into();
        if let Some(m) = &mesh
            && m.kind == MeshKind::Static
        {
            log::debug!("mesh {:?} has no skinning attributes, ignoring bones", m.name);
            return self.state.add_static_mesh(mesh, material, transform);
        }
        self.state.add_animated_mesh(mesh, material, transform, bones)
    }

    pub fn add_point_light(&mut self, light: PointLight) -> bool {
        self.state.add_point_light(light)
    }

    pub fn add_directional_light(&mut self, light: DirectionalLight) -> bool {
        self.state.add_directional_light(light)
    }

    pub fn add_spot_light(&mut self, light: SpotLight) -> bool {
        self.state.add_spot_light(light)
    }

    pub fn add_debug_cube(&mut self, transform: Matrix4<f32>, color: Vector3<f32>) -> bool {
        self.state.add_debug_cube(transform, color)
    }

    pub fn add_debug_sphere(&mut self, transform: Matrix4<f32>, color: Vector3<f32>) -> bool {
        self.state.add_debug_sphere(transform, color)
    }

    pub fn state(&self) -> &RendererState {
        &self.state
    }

    pub fn frame_state(&self) -> FrameState {
        self.state.frame_state()
    }

    /// The plan the last `end_frame` executed.
    pub fn last_plan(&self) -> Option<&FramePlan> {
        self.last_plan.as_ref()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn output(&self) -> &Texture {
        &self.targets.output
    }

    pub fn default_textures(&self) -> &DefaultTextures {
        &self.fallbacks.textures
    }

    /// Unit square in the xy plane facing +z.
    pub fn plane(&self) -> MeshHandle {
        Arc::clone(&self.fallbacks.plane)
    }

    pub fn cube(&self) -> MeshHandle {
        Arc::clone(&self.fallbacks.cube)
    }

    pub fn sphere(&self) -> MeshHandle {
        Arc::clone(&self.fallbacks.sphere)
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.ctx.queue.submit(iter::once(encoder.finish()));
    }

    fn material_bind_group(&self, material: &Material) -> wgpu::BindGroup {
        let defaults = &self.fallbacks.textures;
        let view = |slot: MaterialSlot| {
            wgpu::BindingResource::TextureView(&material.resolve(slot, defaults).view)
        };
        let sampler = material
            .resolve(MaterialSlot::Albedo, defaults)
            .sampler
            .as_ref()
            .unwrap_or(&self.material_sampler);
        let mut entries: Vec<_> = MaterialSlot::ALL
            .iter()
            .enumerate()
            .map(|(binding, &slot)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: view(slot),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: MaterialSlot::ALL.len() as u32,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
        self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.layouts.material,
            entries: &entries,
            label: Some("material_bind_group"),
        })
    }

    /// Uploads camera, composite parameters and per-draw arenas.
    fn prepare_frame(&mut self) -> FrameDraws {
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        let camera = CameraUniform::new(self.state.camera(), &self.projection, self.targets.size);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));
        let composite = CompositeUniform::from(self.state.params());
        queue.write_buffer(&self.composite_buffer, 0, bytemuck::bytes_of(&composite));

        let meshes = self.state.meshes();
        let raws: Vec<InstanceRaw> = meshes.iter().map(|m| m.to_raw()).collect();
        self.instances.write(device, queue, &raws);

        let mut palettes = Vec::new();
        let bone_slots = meshes
            .iter()
            .map(|m| match m.mesh.kind {
                MeshKind::Static => None,
                MeshKind::Animated => {
                    palettes.push(
                        m.bones
                            .as_deref()
                            .map(BonePalette::from_bones)
                            .unwrap_or_else(BonePalette::identity),
                    );
                    Some(palettes.len() - 1)
                }
            })
            .collect();
        self.bones.write(device, queue, &palettes);

        let shapes: Vec<DebugRaw> = self.state.debug_shapes().map(|d| d.to_raw()).collect();
        self.debug_shapes.write(device, queue, &shapes);

        let mut seen: Vec<*const Material> = Vec::new();
        let mut materials = Vec::new();
        let material_index = self
            .state
            .meshes()
            .iter()
            .map(|m| {
                let ptr = Arc::as_ptr(&m.material);
                match seen.iter().position(|p| *p == ptr) {
                    Some(index) => index,
                    None => {
                        seen.push(ptr);
                        materials.push(self.material_bind_group(&m.material));
                        materials.len() - 1
                    }
                }
            })
            .collect();

        FrameDraws {
            materials,
            material_index,
            bone_slots,
        }
    }

    fn execute(&mut self, plan: &FramePlan, target: &wgpu::TextureView) {
        let draws = self.prepare_frame();
        let mut shadowed: Option<(LightId, wgpu::CommandEncoder)> = None;
        let mut finale: Option<wgpu::CommandEncoder> = None;

        for command in &plan.commands {
            match *command {
                PassCommand::Geometry => {
                    let mut encoder = self.encoder("geometry");
                    self.encode_geometry(&mut encoder, &draws);
                    self.submit(encoder);
                }
                PassCommand::Shadow(id) => {
                    let Some(light) = self.state.light(id) else {
                        log::error!("shadow pass for unknown light {:?}", id);
                        continue;
                    };
                    if let Some(slot) = self.slots.slot_mut(id.kind.shadow())
                        && let Err(e) = slot.acquire(id)
                    {
                        log::error!("skipping {:?}: {}", id, e);
                        continue;
                    }
                    self.write_light(&light);
                    let mut encoder = self.encoder("shadow");
                    self.encode_shadow(&mut encoder, &light, &draws);
                    shadowed = Some((id, encoder));
                }
                PassCommand::Accumulate(id) => {
                    let Some(light) = self.state.light(id) else {
                        log::error!("accumulation for unknown light {:?}", id);
                        continue;
                    };
                    let technique = id.kind.shadow();
                    let mut encoder = match shadowed.take() {
                        Some((holder, encoder)) if holder == id => encoder,
                        stale => {
                            if let Some((holder, _)) = stale {
                                log::error!("shadow map for {:?} was never consumed", holder);
                            }
                            self.write_light(&light);
                            self.encoder("light")
                        }
                    };
                    if let Some(slot) = self.slots.slot_mut(technique)
                        && let Err(e) = slot.consume(id)
                    {
                        log::error!("skipping {:?}: {}", id, e);
                        continue;
                    }
                    self.encode_light(&mut encoder, id);
                    // Submitted before the next light rewrites the shared uniforms and maps.
                    self.submit(encoder);
                    if let Some(slot) = self.slots.slot_mut(technique) {
                        let _ = slot.release(id);
                    }
                }
                PassCommand::GlobalIllumination => {
                    let encoder = finale.get_or_insert_with(|| self.encoder("composite"));
                    self.encode_ambient(encoder);
                }
                PassCommand::Composite => {
                    let encoder = finale.get_or_insert_with(|| self.encoder("composite"));
                    self.encode_composite(encoder, target);
                }
                PassCommand::DebugOverlay => {
                    let encoder = finale.get_or_insert_with(|| self.encoder("composite"));
                    self.encode_debug(encoder, target);
                }
            }
        }

        if let Some(encoder) = finale {
            self.submit(encoder);
        }
        if !self.slots.all_free() {
            log::error!("shadow slots still held after frame: {:?}", self.slots);
            self.slots = ShadowSlots::default();
        }
    }

    /// Writes the light, shadow and face uniforms for `light`.
    fn write_light(&mut self, light: &Light) {
        let queue = &self.ctx.queue;
        let settings = &self.config.shadows;
        queue.write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&light.to_uniform()));

        let (shadow, faces) = match light {
            Light::Point(point) => {
                let view_projs = cube_view_projs(point, settings);
                let faces: Vec<FaceUniform> = view_projs
                    .iter()
                    .map(|vp| FaceUniform {
                        view_proj: (*vp).into(),
                        light: point.position.extend(1.0).into(),
                    })
                    .collect();
                (ShadowUniform::cube(&view_projs, settings), faces)
            }
            Light::Spot(spot) => {
                let view_proj = spot_view_proj(spot, settings);
                let face = FaceUniform {
                    view_proj: view_proj.into(),
                    light: spot.position.extend(1.0).into(),
                };
                (ShadowUniform::spot(view_proj, settings), vec![face])
            }
            Light::Directional(_) => (ShadowUniform::unshadowed(), Vec::new()),
        };
        queue.write_buffer(&self.shadow_buffer, 0, bytemuck::bytes_of(&shadow));
        self.faces.write(&self.ctx.device, queue, &faces);
    }

    fn encode_geometry(&self, encoder: &mut wgpu::CommandEncoder, draws: &FrameDraws) {
        {
            let color_attachments = self.targets.gbuffer.color_attachments();
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Geometry Pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.gbuffer.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for (i, instance) in self.state.meshes().iter().enumerate() {
                let mesh = &instance.mesh;
                render_pass.set_pipeline(self.geometry.for_kind(mesh.kind));
                render_pass.set_bind_group(1, self.instances.bind_group(), &[self.instances.offset(i)]);
                render_pass.set_bind_group(2, &draws.materials[draws.material_index[i]], &[]);
                if let Some(slot) = draws.bone_slots[i] {
                    render_pass.set_bind_group(3, self.bones.bind_group(), &[self.bones.offset(slot)]);
                }
                mesh.draw(&mut render_pass);
            }
        }

        // The accumulation target starts every frame empty.
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("HDR Clear"),
            color_attachments: &[clear_attachment(&self.targets.hdr.view, wgpu::Color::BLACK)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }

    fn draw_casters<'p>(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        face: usize,
        draws: &FrameDraws,
        pipeline: impl Fn(MeshKind) -> &'p wgpu::RenderPipeline,
    ) {
        render_pass.set_bind_group(0, self.faces.bind_group(), &[self.faces.offset(face)]);
        for (i, instance) in self.state.meshes().iter().enumerate() {
            let mesh = &instance.mesh;
            render_pass.set_pipeline(pipeline(mesh.kind));
            render_pass.set_bind_group(1, self.instances.bind_group(), &[self.instances.offset(i)]);
            if let Some(slot) = draws.bone_slots[i] {
                render_pass.set_bind_group(2, self.bones.bind_group(), &[self.bones.offset(slot)]);
            }
            mesh.draw(render_pass);
        }
    }

    fn encode_shadow(&self, encoder: &mut wgpu::CommandEncoder, light: &Light, draws: &FrameDraws) {
        match light {
            Light::Spot(_) => {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Spot Shadow Pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.targets.spot_shadow.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                self.draw_casters(&mut render_pass, 0, draws, |kind| self.shadow.spot(kind));
            }
            Light::Point(_) => {
                // Uncovered texels read as infinitely far away.
                let far = wgpu::Color {
                    r: f32::MAX as f64,
                    g: 0.0,
                    b: 0.0,
                    a: 1.0,
                };
                for (face, view) in self.targets.cube_faces.iter().enumerate() {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Cube Shadow Pass"),
                        color_attachments: &[clear_attachment(view, far)],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &self.targets.cube_depth.view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(1.0),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    self.draw_casters(&mut render_pass, face, draws, |kind| self.shadow.cube(kind));
                }
            }
            Light::Directional(_) => {}
        }
    }

    fn encode_light(&self, encoder: &mut wgpu::CommandEncoder, id: LightId) {
        let Some(pipeline) = self.lights.get(id.kind) else {
            log::error!("no pipeline for {:?}", id.kind);
            return;
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Light Accumulation Pass"),
            color_attachments: &[load_attachment(&self.targets.hdr.view)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.gbuffer_bind_group, &[]);
        render_pass.set_bind_group(1, &self.light_bind_group, &[]);
        render_pass.set_bind_group(2, &self.shadow_maps_bind_group, &[]);
        self.fallbacks.screen_quad.draw(&mut render_pass);
    }

    fn encode_ambient(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Global Illumination Pass"),
            color_attachments: &[load_attachment(&self.targets.hdr.view)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&self.composite.ambient);
        render_pass.set_bind_group(0, &self.composite_bind_group, &[]);
        self.fallbacks.screen_quad.draw(&mut render_pass);
    }

    fn encode_composite(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[clear_attachment(target, wgpu::Color::BLACK)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&self.composite.composite);
        render_pass.set_bind_group(0, &self.composite_bind_group, &[]);
        render_pass.set_bind_group(1, &self.hdr_bind_group, &[]);
        self.fallbacks.screen_quad.draw(&mut render_pass);
    }

    fn encode_debug(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        if self.state.debug_shapes().next().is_none() {
            return;
        }
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Debug Overlay Pass"),
            color_attachments: &[load_attachment(target)],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.gbuffer.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&self.debug);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for (i, shape) in self.state.debug_shapes().enumerate() {
            render_pass.set_bind_group(
                1,
                self.debug_shapes.bind_group(),
                &[self.debug_shapes.offset(i)],
            );
            self.fallbacks.wire(shape.shape).draw(&mut render_pass);
        }
    }

    /// Copies the output target back to the CPU.
    ///
    /// Only 4-byte-per-pixel output formats can be read back.
    pub async fn read_output(&self) -> anyhow::Result<image::RgbaImage> {
        let format = self.config.output_format;
        if format.block_copy_size(None) != Some(4) {
            anyhow::bail!("cannot read back output format {:?}", format);
        }
        let device = &self.ctx.device;
        let [width, height] = self.targets.size;
        let bytes_per_row = padded_bytes_per_row(width);

        let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Output Readback Buffer"),
            size: (bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self.encoder("readback");
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.targets.output.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.submit(encoder);

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        rx.receive()
            .await
            .ok_or_else(|| anyhow::anyhow!("readback channel closed"))??;

        let row_bytes = width as usize * 4;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        {
            let data = buffer_slice.get_mapped_range();
            for row in data.chunks(bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..row_bytes]);
            }
        }
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow::anyhow!("readback size mismatch"))
    }

    pub fn read_output_blocking(&self) -> anyhow::Result<image::RgbaImage> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.read_output())
    }
}
