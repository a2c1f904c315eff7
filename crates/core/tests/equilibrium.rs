use fluid_sim_core::{EquilibriumConfig, EquilibriumSolver, ExecutionMode, SolverError};
use std::ops::ControlFlow;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(mode: ExecutionMode) -> EquilibriumConfig {
    EquilibriumConfig {
        grid_size: 16,
        diffusion_coefficient: 0.1,
        mode,
        ..EquilibriumConfig::default()
    }
}

#[test]
fn test_single_source_settles_smoothly() {
    let mut solver = EquilibriumSolver::new(config(ExecutionMode::Sequential)).expect("config");
    solver.pin(8, 8, 1.0).expect("interior");

    let result = solver.solve().expect("converges");

    assert!(result.iterations >= 1);
    assert!(result.iterations < 5000, "took {} iterations", result.iterations);
    assert!(result.residual < 1e-5);

    // Non-increasing with distance from the source along its row and column
    let field = &result.field;
    for k in 8..15 {
        assert!(field.get(k + 1, 8) <= field.get(k, 8), "row east of source at {k}");
        assert!(field.get(8, k + 1) <= field.get(8, k), "column south of source at {k}");
    }
    for k in 1..8 {
        assert!(field.get(k, 8) <= field.get(k + 1, 8), "row west of source at {k}");
        assert!(field.get(8, k) <= field.get(8, k + 1), "column north of source at {k}");
    }
    assert_eq!(field.get(8, 8), 1.0);
    assert_eq!(field.get(0, 8), 0.0);
    assert!(field.get(1, 8) > 0.0);
}

#[test]
fn test_backends_are_bit_identical() {
    if !cfg!(feature = "parallel") {
        return;
    }

    let mut outcomes = Vec::new();
    for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let mut solver = EquilibriumSolver::new(config(mode)).expect("config");
        solver.pin(5, 9, 1.0).expect("interior");
        solver.seed_pulse(11, 4, 0.5).expect("interior");
        outcomes.push(solver.solve().expect("converges"));
    }

    assert_eq!(outcomes[0], outcomes[1]);
}

#[test]
fn test_iteration_cap_returns_timeout_with_best_effort_field() {
    let mut solver = EquilibriumSolver::new(EquilibriumConfig {
        max_iterations: Some(10),
        ..config(ExecutionMode::Sequential)
    })
    .expect("config");
    solver.pin(8, 8, 1.0).expect("interior");

    match solver.solve() {
        Err(SolverError::ConvergenceTimeout {
            iterations,
            residual,
        }) => {
            assert_eq!(iterations, 10);
            assert!(residual >= 1e-5);
        }
        other => panic!("expected ConvergenceTimeout, got {other:?}"),
    }

    assert_eq!(solver.iterations(), 10);
    assert!(solver.field().get(9, 8) > 0.0);
}

#[test]
fn test_observer_can_interrupt_between_iterations() {
    let mut solver = EquilibriumSolver::new(config(ExecutionMode::Sequential)).expect("config");
    solver.pin(8, 8, 1.0).expect("interior");

    let result = solver.solve_with(|report| {
        if report.iteration == 5 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    assert_eq!(result, Err(SolverError::Interrupted { iterations: 5 }));
    assert_eq!(solver.iterations(), 5);
}

#[test]
fn test_unstable_coefficient_reports_divergence() {
    let mut solver = EquilibriumSolver::new(EquilibriumConfig {
        diffusion_coefficient: 1.0,
        max_iterations: None,
        ..config(ExecutionMode::Sequential)
    })
    .expect("unstable coefficients are accepted");
    solver.seed_pulse(8, 8, 1.0).expect("interior");

    assert!(matches!(
        solver.solve(),
        Err(SolverError::ComputationDiverged { .. })
    ));
}

#[test]
fn test_invalid_configuration_rejected() {
    let too_small = EquilibriumSolver::new(EquilibriumConfig {
        grid_size: 2,
        ..EquilibriumConfig::default()
    });
    assert!(matches!(
        too_small,
        Err(SolverError::InvalidConfiguration {
            parameter: "grid_size",
            ..
        })
    ));

    let bad_epsilon = EquilibriumSolver::new(EquilibriumConfig {
        epsilon: f32::NAN,
        ..EquilibriumConfig::default()
    });
    assert!(bad_epsilon.is_err());
}

#[test]
fn test_resize_clears_field_and_sources() {
    let mut solver = EquilibriumSolver::new(config(ExecutionMode::Sequential)).expect("config");
    solver.pin(8, 8, 1.0).expect("interior");
    solver.solve().expect("converges");

    solver.resize(10).expect("resize");

    assert_eq!(solver.field().width(), 10);
    assert!(solver.field().as_slice().iter().all(|&t| t == 0.0));
    assert_eq!(solver.iterations(), 0);

    // No source left: the zero field is already settled
    let result = solver.solve().expect("converges");
    assert_eq!(result.iterations, 1);
}

#[test]
fn test_air_benchmark_pulse_settles() {
    let mut solver = EquilibriumSolver::new(EquilibriumConfig::air(16)).expect("config");
    solver.seed_pulse(8, 8, 1.0).expect("interior");
    let result = solver.solve().expect("converges");
    assert!(result.field.get(8, 8) < 1.0);
    assert!(result.field.is_finite());
}
