//! Scene configuration.
//!
//! Every tunable of the turntable scene lives in [`SceneConfig`]: where the
//! camera sits, where the model is anchored, how the lights are coloured and
//! how fast the model spins. [`SceneConfig::default`] carries the reference
//! values; [`SceneConfig::validate`] is called by the bootstrap before anything
//! is built from it.

use anyhow::{Result, ensure};
use cgmath::{Deg, Point3};

/// Linear RGB colour with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour::new(1.0, 1.0, 1.0);
    pub const BLACK: Colour = Colour::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from a `0xRRGGBB` literal.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    pub fn scaled(&self, factor: f32) -> [f32; 3] {
        [self.r * factor, self.g * factor, self.b * factor]
    }

    fn is_normalised(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

impl From<Colour> for wgpu::Color {
    fn from(c: Colour) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: 1.0,
        }
    }
}

/// Colour and strength shared by one class of lights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSettings {
    pub colour: Colour,
    pub intensity: f32,
}

/// Time-to-angle divisors: the model turns `time_ms / divisor` radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinRate {
    pub x_divisor_ms: f64,
    pub y_divisor_ms: f64,
}

impl Default for SpinRate {
    fn default() -> Self {
        Self {
            x_divisor_ms: 2000.0,
            y_divisor_ms: 1000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub window_title: String,
    /// Directory (native) or URL path below the page origin (wasm) all assets resolve against.
    pub asset_root: String,
    pub background: String,
    pub model: String,
    pub clear_colour: Colour,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub camera_position: Point3<f32>,
    /// Where the model is placed once loaded. Lights are arranged around it.
    pub anchor: Point3<f32>,
    pub model_scale: f32,
    pub ambient: LightSettings,
    pub directional: LightSettings,
    /// Distance along z between the anchor and each directional light.
    pub fill_offset: f32,
    pub spin: SpinRate,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            window_title: "turntable".to_string(),
            asset_root: "assets".to_string(),
            background: "background.png".to_string(),
            model: "model.obj".to_string(),
            clear_colour: Colour::BLACK,
            fovy: Deg(45.0),
            znear: 1.0,
            zfar: 1000.0,
            camera_position: Point3::new(0.0, 10.0, 17.0),
            anchor: Point3::new(0.0, 10.0, 10.0),
            model_scale: 0.5,
            ambient: LightSettings {
                colour: Colour::from_hex(0x404040),
                intensity: 1.0,
            },
            directional: LightSettings {
                colour: Colour::WHITE,
                intensity: 1.0,
            },
            fill_offset: 1.0,
            spin: SpinRate::default(),
        }
    }
}

impl SceneConfig {
    /// Replace asset locations with `TURNTABLE_ASSETS`, `TURNTABLE_MODEL` and
    /// `TURNTABLE_BACKGROUND` when they are set.
    pub fn with_env_overrides(mut self) -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        if let Some(root) = read("TURNTABLE_ASSETS") {
            self.asset_root = root;
        }
        if let Some(model) = read("TURNTABLE_MODEL") {
            self.model = model;
        }
        if let Some(background) = read("TURNTABLE_BACKGROUND") {
            self.background = background;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.model.trim().is_empty(), "model path must not be empty");
        ensure!(
            !self.background.trim().is_empty(),
            "background path must not be empty"
        );
        ensure!(
            self.fovy.0 > 0.0 && self.fovy.0 < 180.0,
            "fovy must be within (0, 180) degrees, got {}",
            self.fovy.0
        );
        ensure!(
            self.znear.is_finite() && self.znear > 0.0,
            "znear must be positive, got {}",
            self.znear
        );
        ensure!(
            self.zfar.is_finite() && self.zfar > self.znear,
            "zfar ({}) must be greater than znear ({})",
            self.zfar,
            self.znear
        );
        ensure!(
            self.model_scale.is_finite() && self.model_scale > 0.0,
            "model_scale must be positive, got {}",
            self.model_scale
        );
        ensure!(
            self.fill_offset.is_finite(),
            "fill_offset must be finite, got {}",
            self.fill_offset
        );
        for (name, light) in [("ambient", &self.ambient), ("directional", &self.directional)] {
            ensure!(
                light.intensity.is_finite() && light.intensity >= 0.0,
                "{} intensity must be non-negative, got {}",
                name,
                light.intensity
            );
            ensure!(
                light.colour.is_normalised(),
                "{} colour components must be within 0..=1",
                name
            );
        }
        ensure!(
            self.clear_colour.is_normalised(),
            "clear colour components must be within 0..=1"
        );
        for (axis, divisor) in [("x", self.spin.x_divisor_ms), ("y", self.spin.y_divisor_ms)] {
            ensure!(
                divisor.is_finite() && divisor != 0.0,
                "spin divisor for {} must be finite and non-zero, got {}",
                axis,
                divisor
            );
        }
        Ok(())
    }
}
