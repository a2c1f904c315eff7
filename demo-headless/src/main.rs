use clap::{Parser, Subcommand};
use fluid_sim_core::{
    EquilibriumConfig, EquilibriumSolver, ExecutionMode, Field, FluidConfig, FluidSimulation,
    HeatMap, HeatMapConfig, PressureStencil, Ripple, RippleConfig, SolverError,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::ControlFlow;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Headless driver for the fluid simulation engine
#[derive(Parser, Debug)]
#[command(name = "fluid-sim-demo")]
#[command(about = "Stable-fluids, heat and ripple simulations in the terminal", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use the data-parallel backend
    #[arg(short, long, global = true)]
    parallel: bool,

    /// Width of the ASCII rendering in characters (0 disables it)
    #[arg(long, global = true, default_value_t = 48)]
    render_width: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Smoke: inject density and a rising force, then step the fluid
    Smoke {
        /// Cells per side
        #[arg(short, long, default_value_t = 64)]
        resolution: usize,

        /// Number of steps
        #[arg(short, long, default_value_t = 120)]
        steps: u32,

        /// Relaxation sweeps per solve
        #[arg(short, long, default_value_t = 20)]
        iterations: usize,

        /// Use the legacy 6-weight pressure stencil
        #[arg(long)]
        six_neighbor: bool,

        /// Report interval in steps
        #[arg(long, default_value_t = 20)]
        report_interval: u32,
    },

    /// Heat map: paint random strokes and let them diffuse and cool
    Heat {
        /// Canvas width in cells
        #[arg(long, default_value_t = 96)]
        width: usize,

        /// Canvas height in cells
        #[arg(long, default_value_t = 64)]
        height: usize,

        /// Frames to run
        #[arg(short, long, default_value_t = 200)]
        frames: u32,

        /// Brush dabs painted during the first half of the run
        #[arg(long, default_value_t = 40)]
        strokes: u32,

        /// RNG seed for the stroke positions
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },

    /// Ripple: drop a few disturbances and watch the waves damp out
    Ripple {
        /// Cells per side
        #[arg(short, long, default_value_t = 64)]
        resolution: usize,

        /// Number of steps
        #[arg(short, long, default_value_t = 150)]
        steps: u32,

        /// Number of droplets
        #[arg(long, default_value_t = 3)]
        drops: u32,

        /// RNG seed for the droplet positions
        #[arg(long, default_value_t = 11)]
        seed: u64,
    },

    /// Equilibrium: diffuse heat from a fixed source until it settles
    Equilibrium {
        /// Cells per side
        #[arg(short, long, default_value_t = 16)]
        grid_size: usize,

        /// Diffusion coefficient r (ignored with --air)
        #[arg(long, default_value_t = 0.1)]
        coefficient: f32,

        /// Derive r from the thermal diffusivity of air
        #[arg(long)]
        air: bool,

        /// Iteration cap (0 = uncapped)
        #[arg(long, default_value_t = 100_000)]
        max_iterations: usize,

        /// Free pulse instead of a held source
        #[arg(long)]
        pulse: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let mode = if cli.parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Sequential
    };

    let result = match cli.command {
        Commands::Smoke {
            resolution,
            steps,
            iterations,
            six_neighbor,
            report_interval,
        } => run_smoke(
            FluidConfig {
                resolution,
                iterations,
                mode,
                pressure_stencil: if six_neighbor {
                    PressureStencil::SixNeighbor
                } else {
                    PressureStencil::FourNeighbor
                },
                ..FluidConfig::default()
            },
            steps,
            report_interval.max(1),
            cli.render_width,
        ),
        Commands::Heat {
            width,
            height,
            frames,
            strokes,
            seed,
        } => run_heat(
            HeatMapConfig {
                width,
                height,
                brush_size: 6.0,
                mode,
                ..HeatMapConfig::default()
            },
            frames,
            strokes,
            seed,
            cli.render_width,
        ),
        Commands::Ripple {
            resolution,
            steps,
            drops,
            seed,
        } => run_ripple(
            RippleConfig {
                resolution,
                mode,
                ..RippleConfig::default()
            },
            steps,
            drops,
            seed,
            cli.render_width,
        ),
        Commands::Equilibrium {
            grid_size,
            coefficient,
            air,
            max_iterations,
            pulse,
        } => {
            let base = if air {
                EquilibriumConfig::air(grid_size)
            } else {
                EquilibriumConfig {
                    grid_size,
                    diffusion_coefficient: coefficient,
                    ..EquilibriumConfig::default()
                }
            };
            run_equilibrium(
                EquilibriumConfig {
                    max_iterations: (max_iterations > 0).then_some(max_iterations),
                    mode,
                    ..base
                },
                pulse,
                cli.render_width,
            )
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_smoke(
    config: FluidConfig,
    steps: u32,
    report_interval: u32,
    render_width: usize,
) -> Result<(), SolverError> {
    let mut sim = FluidSimulation::new(config)?;
    let n = sim.resolution() as isize;
    let source = (n / 2, n - n / 6);

    println!("=== Smoke ===");
    println!("Step  | Density   | Max speed | Kinetic energy");
    println!("------|-----------|-----------|---------------");

    for step in 1..=steps {
        sim.add_density(source, 1.0);
        sim.add_force(source, (0.0, -0.05));
        sim.step()?;

        if step % report_interval == 0 {
            let stats = sim.stats();
            println!(
                "{:5} | {:9.3} | {:9.4} | {:13.5}",
                step, stats.total_density, stats.max_speed, stats.kinetic_energy
            );
        }
    }

    println!("\nSimulated {:.2}s in {} steps", sim.simulation_time(), sim.steps());
    render(sim.density(), render_width);
    Ok(())
}

fn run_heat(
    config: HeatMapConfig,
    frames: u32,
    strokes: u32,
    seed: u64,
    render_width: usize,
) -> Result<(), SolverError> {
    let mut map = HeatMap::new(config)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let (w, h) = (map.config().width as isize, map.config().height as isize);
    let paint_frames = (frames / 2).max(1);

    println!("=== Heat map ===");
    for frame in 1..=frames {
        if frame <= paint_frames && strokes > 0 {
            let per_frame = strokes.div_ceil(paint_frames);
            for _ in 0..per_frame {
                map.add_heat(rng.random_range(0..w as i64) as isize, rng.random_range(0..h as i64) as isize);
            }
        }
        map.step();

        if frame % 50 == 0 {
            println!(
                "frame {:4}: total heat {:9.3}, hottest cell {:.4}",
                frame,
                map.total_heat(),
                map.max_temperature()
            );
        }
    }

    render(map.temperature(), render_width);
    Ok(())
}

fn run_ripple(
    config: RippleConfig,
    steps: u32,
    drops: u32,
    seed: u64,
    render_width: usize,
) -> Result<(), SolverError> {
    let mut ripple = Ripple::new(config)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let n = ripple.config().resolution as isize;
    let dt = 1.0 / 60.0;

    for _ in 0..drops {
        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        ripple.disturb(rng.random_range(1..n as i64 - 1) as isize, rng.random_range(1..n as i64 - 1) as isize, sign, dt);
    }

    println!("=== Ripple ===");
    for step in 1..=steps {
        ripple.step();
        if step % 25 == 0 {
            println!("step {:4}: peak height {:.4}", step, ripple.surface().max_abs());
        }
    }

    render_signed(ripple.surface(), render_width);
    Ok(())
}

fn run_equilibrium(
    config: EquilibriumConfig,
    pulse: bool,
    render_width: usize,
) -> Result<(), SolverError> {
    let mut solver = EquilibriumSolver::new(config)?;
    let center = solver.config().grid_size / 2;
    if pulse {
        solver.seed_pulse(center, center, 1.0)?;
    } else {
        solver.pin(center, center, 1.0)?;
    }

    println!("=== Equilibrium ===");
    let outcome = solver.solve_with(|report| {
        if report.iteration % 1000 == 0 {
            println!(
                "iteration {:6}: residual {:.3e}",
                report.iteration, report.residual
            );
        }
        ControlFlow::Continue(())
    });

    match outcome {
        Ok(result) => {
            info!(
                "Settled after {} iterations (residual {:.3e})",
                result.iterations, result.residual
            );
            render(&result.field, render_width);
            Ok(())
        }
        Err(err @ SolverError::ConvergenceTimeout { .. }) => {
            println!("Best-effort field after timeout:");
            render(solver.field(), render_width);
            Err(err)
        }
        Err(err) => Err(err),
    }
}

/// Density ramp from empty to full
const RAMP: &[u8] = b" .:-=+*#%@";

fn render(field: &Field, width: usize) {
    let values: Vec<f32> = field.clamped_unit().collect();
    draw(field, &values, width);
}

fn render_signed(field: &Field, width: usize) {
    let peak = field.max_abs().max(f32::EPSILON);
    let values: Vec<f32> = field
        .as_slice()
        .iter()
        .map(|v| 0.5 + 0.5 * v / peak)
        .collect();
    draw(field, &values, width);
}

/// Nearest-cell downsample of `values` (laid out like `field`) to ASCII
fn draw(field: &Field, values: &[f32], width: usize) {
    if width == 0 {
        return;
    }

    let (fw, fh) = (field.width(), field.height());
    let cols = width.min(fw);
    // Terminal cells are about twice as tall as wide
    let rows = (fh * cols / fw / 2).max(1);

    println!();
    for row in 0..rows {
        let j = row * fh / rows;
        let line: String = (0..cols)
            .map(|col| {
                let i = col * fw / cols;
                let v = values[field.index(i, j)].clamp(0.0, 1.0);
                let k = (v * (RAMP.len() - 1) as f32).round() as usize;
                RAMP[k] as char
            })
            .collect();
        println!("{line}");
    }
}
