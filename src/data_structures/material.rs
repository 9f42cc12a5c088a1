//! Materials and default texture substitution.
//!
//! A material is four optional texture slots. Empty slots are not an
//! error: at draw time each one resolves to an engine-owned default, so an
//! entirely empty material renders as flat white, non-metallic and fully
//! rough.

use std::sync::Arc;

use crate::data_structures::texture::{Texture, TextureHandle};

pub type MaterialHandle = Arc<Material>;

pub const DEFAULT_ALBEDO: [u8; 4] = [255, 255, 255, 255];
/// Tangent-space +z.
pub const DEFAULT_NORMAL: [u8; 4] = [128, 128, 255, 255];
pub const DEFAULT_METALLIC: [u8; 4] = [0, 0, 0, 255];
pub const DEFAULT_ROUGHNESS: [u8; 4] = [255, 255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Albedo,
    Normal,
    Metallic,
    Roughness,
}

impl MaterialSlot {
    /// In bind group order.
    pub const ALL: [MaterialSlot; 4] = [
        MaterialSlot::Albedo,
        MaterialSlot::Normal,
        MaterialSlot::Metallic,
        MaterialSlot::Roughness,
    ];
}

#[derive(Debug, Clone)]
pub struct Material<T = TextureHandle> {
    pub name: String,
    pub albedo: Option<T>,
    pub normal: Option<T>,
    pub metallic: Option<T>,
    pub roughness: Option<T>,
}

impl<T> Default for Material<T> {
    fn default() -> Self {
        Self {
            name: String::new(),
            albedo: None,
            normal: None,
            metallic: None,
            roughness: None,
        }
    }
}

impl<T> Material<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with(mut self, slot: MaterialSlot, texture: T) -> Self {
        *self.slot_mut(slot) = Some(texture);
        self
    }

    pub fn get(&self, slot: MaterialSlot) -> Option<&T> {
        match slot {
            MaterialSlot::Albedo => self.albedo.as_ref(),
            MaterialSlot::Normal => self.normal.as_ref(),
            MaterialSlot::Metallic => self.metallic.as_ref(),
            MaterialSlot::Roughness => self.roughness.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: MaterialSlot) -> &mut Option<T> {
        match slot {
            MaterialSlot::Albedo => &mut self.albedo,
            MaterialSlot::Normal => &mut self.normal,
            MaterialSlot::Metallic => &mut self.metallic,
            MaterialSlot::Roughness => &mut self.roughness,
        }
    }

    /// The texture sampled for `slot`.
    pub fn resolve<'a>(&'a self, slot: MaterialSlot, defaults: &'a DefaultTextures<T>) -> &'a T {
        resolve(self.get(slot), defaults.get(slot))
    }
}

pub fn resolve<'a, T>(slot: Option<&'a T>, default: &'a T) -> &'a T {
    slot.unwrap_or(default)
}

/// One fallback texture per slot.
#[derive(Debug, Clone)]
pub struct DefaultTextures<T = TextureHandle> {
    pub albedo: T,
    pub normal: T,
    pub metallic: T,
    pub roughness: T,
}

impl<T> DefaultTextures<T> {
    pub fn get(&self, slot: MaterialSlot) -> &T {
        match slot {
            MaterialSlot::Albedo => &self.albedo,
            MaterialSlot::Normal => &self.normal,
            MaterialSlot::Metallic => &self.metallic,
            MaterialSlot::Roughness => &self.roughness,
        }
    }
}

impl DefaultTextures<TextureHandle> {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let solid = |rgba: [u8; 4], format: wgpu::TextureFormat, label: &str| {
            Arc::new(Texture::solid_color(device, queue, rgba, format, label))
        };
        Self {
            albedo: solid(
                DEFAULT_ALBEDO,
                wgpu::TextureFormat::Rgba8UnormSrgb,
                "default albedo",
            ),
            normal: solid(DEFAULT_NORMAL, wgpu::TextureFormat::Rgba8Unorm, "default normal map"),
            metallic: solid(DEFAULT_METALLIC, wgpu::TextureFormat::Rgba8Unorm, "default metallic"),
            roughness: solid(
                DEFAULT_ROUGHNESS,
                wgpu::TextureFormat::Rgba8Unorm,
                "default roughness",
            ),
        }
    }
}
