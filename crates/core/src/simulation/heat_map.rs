//! Per-frame heat painting
//!
//! A double-buffered temperature grid. Each frame runs one explicit diffusion
//! update followed by proportional cooling; a brush adds heat with radial
//! falloff. The border is a cold frame held at zero.

use crate::config::HeatMapConfig;
use crate::error::Result;
use crate::solver::{create_backend, inject, Field, FieldKind, StencilBackend};
use std::borrow::Cow;
use tracing::{debug, info};

/// Interactive heat-diffusion canvas
pub struct HeatMap {
    config: HeatMapConfig,
    backend: Box<dyn StencilBackend>,
    current: Field,
    next: Field,
    frames: u64,
}

impl HeatMap {
    /// Create a cold canvas
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `config` fails validation.
    pub fn new(config: HeatMapConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Creating heat map: {}x{}, rate={}, cooling={}, mode={}",
            config.width, config.height, config.diffusion_rate, config.cooling_rate, config.mode
        );

        let (w, h) = (config.width, config.height);
        Ok(Self {
            backend: create_backend(config.mode),
            current: Field::new(w, h, FieldKind::Scalar),
            next: Field::new(w, h, FieldKind::Scalar),
            frames: 0,
            config,
        })
    }

    /// Paint heat at `(x, y)` with the configured brush
    pub fn add_heat(&mut self, x: isize, y: isize) {
        inject(
            &mut self.current,
            (x, y),
            self.config.brush_size,
            self.config.heat_intensity,
        );
        self.current.zero_border();
    }

    /// Advance one frame: diffuse, then cool
    pub fn step(&mut self) {
        let retain = 1.0 - self.config.cooling_rate;
        self.backend.explicit_diffusion(
            &mut self.next,
            &self.current,
            self.config.diffusion_rate,
            retain,
        );
        self.current.swap_cells(&mut self.next);
        self.frames += 1;

        debug!(
            "Heat map frame {}: total heat {:.4}",
            self.frames,
            self.total_heat()
        );
    }

    /// Zero every cell
    pub fn clear(&mut self) {
        self.current.fill(0.0);
        self.next.fill(0.0);
    }

    /// Reallocate at a new size, zeroed
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if either dimension is below 3.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let config = HeatMapConfig {
            width,
            height,
            ..self.config.clone()
        };
        config.validate()?;

        info!(
            "Resizing heat map: {}x{} -> {}x{}",
            self.config.width, self.config.height, width, height
        );
        self.current = Field::new(width, height, FieldKind::Scalar);
        self.next = Field::new(width, height, FieldKind::Scalar);
        self.config = config;
        Ok(())
    }

    /// Temperature field
    pub fn temperature(&self) -> &Field {
        &self.current
    }

    /// Read temperature for rendering
    pub fn read_temperature(&self) -> Cow<'_, [f32]> {
        Cow::Borrowed(self.current.as_slice())
    }

    /// Sum of all cells
    pub fn total_heat(&self) -> f32 {
        self.current.sum()
    }

    /// Hottest cell
    pub fn max_temperature(&self) -> f32 {
        self.current.max_abs()
    }

    /// Frames stepped since construction
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Active configuration
    pub fn config(&self) -> &HeatMapConfig {
        &self.config
    }
}
