//! Damped ripple surface
//!
//! Two height buffers, `latest` and `older`. Each step overwrites `older`
//! with `(Σ4 latest)/2 - older`, damps it, relaxes it toward the neighbour
//! average, and swaps the two. The update reads only `latest`, so both
//! backends agree bit-for-bit.

use crate::config::RippleConfig;
use crate::error::Result;
use crate::solver::{create_backend, inject, Field, FieldKind, StencilBackend};
use std::borrow::Cow;
use tracing::{debug, info};

/// Disturbance amplitude per unit of `force_scale · dt`
const DISTURB_GAIN: f32 = 100.0;

/// Interactive damped wave surface
pub struct Ripple {
    config: RippleConfig,
    backend: Box<dyn StencilBackend>,
    latest: Field,
    older: Field,
    steps: u64,
}

impl Ripple {
    /// Create a flat surface
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `config` fails validation.
    pub fn new(config: RippleConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Creating ripple surface: {0}x{0}, damping={1}, diffusion={2}, mode={3}",
            config.resolution, config.damping, config.diffusion, config.mode
        );

        let n = config.resolution;
        Ok(Self {
            backend: create_backend(config.mode),
            latest: Field::new(n, n, FieldKind::Scalar),
            older: Field::new(n, n, FieldKind::Scalar),
            steps: 0,
            config,
        })
    }

    /// Push the surface at `(x, y)`
    ///
    /// Adds `sign · force_scale · falloff · dt · 100` within the configured
    /// input radius. `sign` is `1.0` to raise and `-1.0` to press.
    pub fn disturb(&mut self, x: isize, y: isize, sign: f32, dt: f32) {
        let amount = sign * self.config.force_scale * dt * DISTURB_GAIN;
        inject(&mut self.latest, (x, y), self.config.radius_cells(), amount);
        self.latest.zero_border();
    }

    /// Advance the wave one step
    pub fn step(&mut self) {
        self.backend.wave(
            &mut self.older,
            &self.latest,
            self.config.damping,
            self.config.diffusion,
        );
        self.latest.swap_cells(&mut self.older);
        self.steps += 1;

        debug!(
            "Ripple step {}: peak height {:.4}",
            self.steps,
            self.latest.max_abs()
        );
    }

    /// Flatten the surface
    pub fn clear(&mut self) {
        self.latest.fill(0.0);
        self.older.fill(0.0);
    }

    /// Reallocate at a new resolution, flat
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for a resolution below 3.
    pub fn resize(&mut self, resolution: usize) -> Result<()> {
        let config = RippleConfig {
            resolution,
            ..self.config.clone()
        };
        config.validate()?;

        info!(
            "Resizing ripple surface: {0}x{0} -> {1}x{1}",
            self.config.resolution, resolution
        );
        self.latest = Field::new(resolution, resolution, FieldKind::Scalar);
        self.older = Field::new(resolution, resolution, FieldKind::Scalar);
        self.config = config;
        Ok(())
    }

    /// Current surface heights
    pub fn surface(&self) -> &Field {
        &self.latest
    }

    /// Read heights for rendering
    pub fn read_surface(&self) -> Cow<'_, [f32]> {
        Cow::Borrowed(self.latest.as_slice())
    }

    /// Steps since construction
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Active configuration
    pub fn config(&self) -> &RippleConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn surface(resolution: usize) -> Ripple {
        Ripple::new(RippleConfig {
            resolution,
            ..RippleConfig::default()
        })
        .expect("valid config")
    }

    #[test]
    fn test_disturb_amplitude() {
        let mut ripple = surface(40);
        // radius = trunc(10 · 40 / 100) = 4
        ripple.disturb(20, 20, -1.0, 0.01);
        assert_abs_diff_eq!(ripple.surface().get(20, 20), -100.0, epsilon = 1e-3);
        assert_abs_diff_eq!(ripple.surface().get(22, 20), -50.0, epsilon = 1e-3);
        assert_eq!(ripple.surface().get(24, 20), 0.0);
    }

    #[test]
    fn test_wave_stays_symmetric() {
        let mut ripple = surface(41);
        ripple.disturb(20, 20, 1.0, 0.01);
        for _ in 0..30 {
            ripple.step();
        }
        let s = ripple.surface();
        for j in 0..41 {
            for i in 0..41 {
                assert_abs_diff_eq!(s.get(i, j), s.get(40 - i, j), epsilon = 1e-2);
                assert_abs_diff_eq!(s.get(i, j), s.get(i, 40 - j), epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn test_damping_drains_energy() {
        let mut ripple = surface(32);
        ripple.disturb(16, 16, 1.0, 0.01);
        let start = ripple.surface().max_abs();
        for _ in 0..500 {
            ripple.step();
        }
        assert!(ripple.surface().max_abs() < start);
    }
}
