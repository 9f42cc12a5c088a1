//! Frame state machine, per-frame accumulator and pass planning.
//!
//! [`RendererState`] owns everything the renderer knows about the current
//! frame without touching the GPU: the Closed/Open state, the camera, the
//! composite parameters and the submission lists. It is generic over the
//! mesh and material handle types so the bookkeeping can be driven with
//! plain values.

use cgmath::{Matrix4, Point3, Rad, Vector3};

use crate::{
    camera::Camera,
    config::FrameParams,
    data_structures::{
        instance::{DebugInstance, DebugShape, MeshInstance, MAX_BONES},
        light::{DirectionalLight, Light, LightId, LightKind, PointLight, SpotLight},
        material::MaterialHandle,
        mesh::MeshHandle,
    },
    error::ShadowSlotError,
    shadow::{ShadowSlots, ShadowTechnique},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Closed,
    Open,
}

/// One step of `end_frame`, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassCommand {
    Geometry,
    Shadow(LightId),
    Accumulate(LightId),
    GlobalIllumination,
    Composite,
    DebugOverlay,
}

/// The ordered pass list for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    pub commands: Vec<PassCommand>,
}

/// Lights are planned in this order.
const PLAN_ORDER: [LightKind; 3] = [LightKind::Point, LightKind::Spot, LightKind::Directional];

impl FramePlan {
    pub fn build(points: usize, spots: usize, directionals: usize) -> Self {
        let mut commands = vec![PassCommand::Geometry];
        for kind in PLAN_ORDER {
            let count = match kind {
                LightKind::Point => points,
                LightKind::Spot => spots,
                LightKind::Directional => directionals,
            };
            for index in 0..count {
                let id = LightId::new(kind, index);
                if kind.shadow() != ShadowTechnique::None {
                    commands.push(PassCommand::Shadow(id));
                }
                commands.push(PassCommand::Accumulate(id));
            }
        }
        commands.extend([
            PassCommand::GlobalIllumination,
            PassCommand::Composite,
            PassCommand::DebugOverlay,
        ]);
        Self { commands }
    }

    pub fn from_commands(commands: Vec<PassCommand>) -> Self {
        Self { commands }
    }

    /// Replays the plan against fresh shadow slots.
    pub fn validate(&self) -> Result<(), ShadowSlotError> {
        let mut slots = ShadowSlots::default();
        for command in &self.commands {
            match *command {
                PassCommand::Shadow(id) => {
                    if let Some(slot) = slots.slot_mut(id.kind.shadow()) {
                        slot.acquire(id)?;
                    }
                }
                PassCommand::Accumulate(id) => {
                    if let Some(slot) = slots.slot_mut(id.kind.shadow()) {
                        slot.release(id)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Lights in accumulation order.
    pub fn lights(&self) -> impl Iterator<Item = LightId> + '_ {
        self.commands.iter().filter_map(|c| match c {
            PassCommand::Accumulate(id) => Some(*id),
            _ => None,
        })
    }
}

#[derive(Debug)]
pub struct RendererState<M = MeshHandle, T = MaterialHandle> {
    state: FrameState,
    frame_index: u64,
    camera: Camera,
    params: FrameParams,
    meshes: Vec<MeshInstance<M, T>>,
    point_lights: Vec<PointLight>,
    directional_lights: Vec<DirectionalLight>,
    spot_lights: Vec<SpotLight>,
    debug_cubes: Vec<DebugInstance>,
    debug_spheres: Vec<DebugInstance>,
}

impl<M, T> Default for RendererState<M, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, T> RendererState<M, T> {
    pub fn new() -> Self {
        Self {
            state: FrameState::Closed,
            frame_index: 0,
            camera: Camera::default(),
            params: FrameParams::default(),
            meshes: Vec::new(),
            point_lights: Vec::new(),
            directional_lights: Vec::new(),
            spot_lights: Vec::new(),
            debug_cubes: Vec::new(),
            debug_spheres: Vec::new(),
        }
    }

    pub fn frame_state(&self) -> FrameState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == FrameState::Open
    }

    /// Number of frames begun so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn begin_frame(&mut self) {
        if self.is_open() {
            log::warn!(
                "begin_frame while frame {} is open, discarding its submissions",
                self.frame_index
            );
        }
        self.clear();
        self.frame_index += 1;
        self.state = FrameState::Open;
    }

    /// Closes the frame and returns its pass plan. `None` when no frame is open.
    pub fn end_frame(&mut self) -> Option<FramePlan> {
        if !self.is_open() {
            log::debug!("end_frame without an open frame, ignoring");
            return None;
        }
        self.state = FrameState::Closed;
        let plan = self.plan();
        log::debug!(
            "frame {}: {} meshes, {} point, {} spot, {} directional lights, {} debug shapes",
            self.frame_index,
            self.meshes.len(),
            self.point_lights.len(),
            self.spot_lights.len(),
            self.directional_lights.len(),
            self.debug_cubes.len() + self.debug_spheres.len(),
        );
        Some(plan)
    }

    pub fn plan(&self) -> FramePlan {
        FramePlan::build(
            self.point_lights.len(),
            self.spot_lights.len(),
            self.directional_lights.len(),
        )
    }

    fn clear(&mut self) {
        self.meshes.clear();
        self.point_lights.clear();
        self.directional_lights.clear();
        self.spot_lights.clear();
        self.debug_cubes.clear();
        self.debug_spheres.clear();
    }

    fn accepts(&self, what: &str) -> bool {
        if !self.is_open() {
            log::debug!("{} submitted outside a frame, dropping", what);
        }
        self.is_open()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Ignored while a frame is open.
    pub fn set_camera(&mut self, camera: Camera) -> bool {
        if self.is_open() {
            log::debug!("camera change during frame {} ignored", self.frame_index);
            return false;
        }
        self.camera = camera;
        true
    }

    pub fn set_view_position<P: Into<Point3<f32>>>(
        &mut self,
        position: P,
        yaw: Rad<f32>,
        tilt: Rad<f32>,
    ) -> bool {
        self.set_camera(Camera::new(position, yaw, tilt))
    }

    pub fn params(&self) -> &FrameParams {
        &self.params
    }

    pub fn global_illumination(&self) -> Vector3<f32> {
        self.params.global_illumination
    }

    pub fn gamma(&self) -> f32 {
        self.params.gamma
    }

    pub fn exposure(&self) -> f32 {
        self.params.exposure
    }

    pub fn set_global_illumination(&mut self, color: Vector3<f32>) -> bool {
        self.params.set_global_illumination(color)
    }

    pub fn set_gamma(&mut self, gamma: f32) -> bool {
        self.params.set_gamma(gamma)
    }

    pub fn set_exposure(&mut self, exposure: f32) -> bool {
        self.params.set_exposure(exposure)
    }

    pub fn add_static_mesh(
        &mut self,
        mesh: impl Into<Option<M>>,
        material: impl Into<Option<T>>,
        transform: Matrix4<f32>,
    ) -> bool {
        self.push_mesh(mesh.into(), material.into(), transform, None)
    }

    /// `bones` beyond [`MAX_BONES`] are dropped.
    pub fn add_animated_mesh(
        &mut self,
        mesh: impl Into<Option<M>>,
        material: impl Into<Option<T>>,
        transform: Matrix4<f32>,
        bones: &[Matrix4<f32>],
    ) -> bool {
        if bones.len() > MAX_BONES {
            log::warn!(
                "{} bone matrices submitted, only the first {} are used",
                bones.len(),
                MAX_BONES
            );
        }
        let palette = bones.iter().take(MAX_BONES).copied().collect();
        self.push_mesh(mesh.into(), material.into(), transform, Some(palette))
    }

    fn push_mesh(
        &mut self,
        mesh: Option<M>,
        material: Option<T>,
        transform: Matrix4<f32>,
        bones: Option<Vec<Matrix4<f32>>>,
    ) -> bool {
        if !self.accepts("mesh") {
            return false;
        }
        let (Some(mesh), Some(material)) = (mesh, material) else {
            log::debug!("mesh submitted without mesh or material handle, dropping");
            return false;
        };
        self.meshes.push(MeshInstance {
            mesh,
            material,
            transform,
            bones,
        });
        true
    }

    pub fn add_point_light(&mut self, light: PointLight) -> bool {
        if !self.accepts("point light") {
            return false;
        }
        self.point_lights.push(light);
        true
    }

    pub fn add_directional_light(&mut self, light: DirectionalLight) -> bool {
        if !self.accepts("directional light") {
            return false;
        }
        self.directional_lights.push(light);
        true
    }

    pub fn add_spot_light(&mut self, light: SpotLight) -> bool {
        if !self.accepts("spot light") {
            return false;
        }
        self.spot_lights.push(light);
        true
    }

    pub fn add_debug_cube(&mut self, transform: Matrix4<f32>, color: Vector3<f32>) -> bool {
        self.push_debug(DebugShape::Cube, transform, color)
    }

    pub fn add_debug_sphere(&mut self, transform: Matrix4<f32>, color: Vector3<f32>) -> bool {
        self.push_debug(DebugShape::Sphere, transform, color)
    }

    fn push_debug(&mut self, shape: DebugShape, transform: Matrix4<f32>, color: Vector3<f32>) -> bool {
        if !self.accepts("debug shape") {
            return false;
        }
        let instance = DebugInstance {
            shape,
            transform,
            color,
        };
        match shape {
            DebugShape::Cube => self.debug_cubes.push(instance),
            DebugShape::Sphere => self.debug_spheres.push(instance),
        }
        true
    }

    pub fn meshes(&self) -> &[MeshInstance<M, T>] {
        &self.meshes
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub fn directional_lights(&self) -> &[DirectionalLight] {
        &self.directional_lights
    }

    pub fn spot_lights(&self) -> &[SpotLight] {
        &self.spot_lights
    }

    pub fn debug_cubes(&self) -> &[DebugInstance] {
        &self.debug_cubes
    }

    pub fn debug_spheres(&self) -> &[DebugInstance] {
        &self.debug_spheres
    }

    pub fn debug_shapes(&self) -> impl Iterator<Item = &DebugInstance> {
        self.debug_cubes.iter().chain(&self.debug_spheres)
    }

    pub fn light(&self, id: LightId) -> Option<Light> {
        match id.kind {
            LightKind::Point => self.point_lights.get(id.index).map(|&l| l.into()),
            LightKind::Directional => self.directional_lights.get(id.index).map(|&l| l.into()),
            LightKind::Spot => self.spot_lights.get(id.index).map(|&l| l.into()),
        }
    }

    /// Every submitted light in planning order.
    pub fn lights(&self) -> impl Iterator<Item = (LightId, Light)> + '_ {
        self.plan()
            .lights()
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(move |id| self.light(id).map(|light| (id, light)))
    }
}
