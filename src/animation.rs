//! The per-frame turntable step.

use cgmath::{Euler, Rad};

use crate::{
    camera::PerspectiveCamera,
    config::SpinRate,
    data_structures::transform::Transform,
    render::Renderer,
    scene::Scene,
};

/// Spins the model as a pure function of elapsed time and asks the renderer for a frame.
///
/// There is no state carried between frames: the angle written on every call is
/// computed from `time_ms` alone, so dropped or repeated frames never cause drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationDriver {
    spin: SpinRate,
}

impl AnimationDriver {
    pub fn new(spin: SpinRate) -> Self {
        Self { spin }
    }

    /// Model orientation at `time_ms`: `time / x_divisor` about X, `time / y_divisor` about Y.
    ///
    /// Z is reported as zero; [`animate`](Self::animate) leaves the model's Z angle alone.
    pub fn rotation_at(&self, time_ms: f64) -> Euler<Rad<f32>> {
        Euler::new(
            Rad((time_ms / self.spin.x_divisor_ms) as f32),
            Rad((time_ms / self.spin.y_divisor_ms) as f32),
            Rad(0.0),
        )
    }

    /// Rotate the model if it has loaded, then draw exactly once regardless.
    pub fn animate<R: Renderer>(
        &self,
        scene: &mut Scene,
        camera: &PerspectiveCamera,
        renderer: &mut R,
        time_ms: f64,
    ) -> Result<(), R::Error> {
        if let Some(model) = scene.model_mut() {
            let rotation = self.rotation_at(time_ms);
            model.set_local_transform_with(&mut |transform: &mut Transform| {
                transform.rotation.x = rotation.x;
                transform.rotation.y = rotation.y;
            });
        }
        renderer.draw(scene, camera)
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new(SpinRate::default())
    }
}
