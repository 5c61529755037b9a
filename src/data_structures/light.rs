use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

use crate::config::Colour;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    /// Uniform light that ignores direction.
    Ambient,
    /// Parallel rays travelling from `position` towards `target`.
    Directional,
}

/// A light placed in the scene. Lights are created by the scene builder and never mutated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub colour: Colour,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Light {
    pub fn ambient(colour: Colour, intensity: f32, position: Point3<f32>) -> Self {
        Self {
            kind: LightKind::Ambient,
            colour,
            intensity,
            position,
            target: Point3::origin(),
        }
    }

    pub fn directional(colour: Colour, intensity: f32, position: Point3<f32>) -> Self {
        Self {
            kind: LightKind::Directional,
            colour,
            intensity,
            position,
            target: Point3::origin(),
        }
    }

    /// Unit vector pointing from the lit surface towards the light.
    ///
    /// `None` for ambient lights and for directional lights sitting on their own target.
    pub fn direction(&self) -> Option<Vector3<f32>> {
        if self.kind != LightKind::Directional {
            return None;
        }
        let towards_light = self.position - self.target;
        if towards_light.magnitude2() <= f32::EPSILON {
            return None;
        }
        Some(towards_light.normalize())
    }

    /// Colour premultiplied with intensity, as the shader consumes it.
    pub fn radiance(&self) -> [f32; 3] {
        self.colour.scaled(self.intensity)
    }
}
