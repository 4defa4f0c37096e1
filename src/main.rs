//! Track reconstruction demo: classical and HHL solves on generated events.

use std::f64::consts::PI;
use std::time::Instant;

use track_hhl::prelude::*;

const SEED: u64 = 2024;

fn generate(n_modules: usize, n_particles: usize) -> Event {
    let geometry = SimpleDetectorGeometry::uniform(n_modules, 10_000.0, 10_000.0, 1.0, 1.0);
    SimpleGenerator::with_seed(geometry, SEED)
        .theta_range(0.0, PI / 3.0)
        .generate_event(n_particles)
}

fn main() -> Result<(), TrackError> {
    env_logger::init();

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║   TRACK RECONSTRUCTION — segment Hamiltonian A·x = b       ║");
    println!("║   conjugate gradient · HHL on a statevector simulator      ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    let params = HamiltonianParams::default();
    println!(
        "  ε = {:e}   γ = {}   δ = {}   threshold = {}",
        params.epsilon, params.gamma, params.delta, DEFAULT_THRESHOLD
    );
    println!();

    // ═══════════════════════════════════════
    // Classical
    // ═══════════════════════════════════════
    println!("━━━ Conjugate Gradient ━━━");
    println!();
    println!(
        "  {:>7}  {:>9}  {:>9}  {:>6}  {:>10}  {:>10}  {:>9}",
        "Modules", "Particles", "Segments", "Iters", "Energy", "Mismatch", "Time (ms)"
    );
    println!(
        "  {:─>7}  {:─>9}  {:─>9}  {:─>6}  {:─>10}  {:─>10}  {:─>9}",
        "", "", "", "", "", "", ""
    );

    for &(n_modules, n_particles) in &[(3, 2), (5, 10), (10, 25), (25, 50)] {
        let event = generate(n_modules, n_particles);
        let start = Instant::now();
        let mut ham = SimpleHamiltonian::new(params)?;
        ham.construct_hamiltonian(&event);
        let solution = ham.solve_classically()?;
        let elapsed = start.elapsed().as_secs_f64() * 1e3;

        let energy = ham.evaluate_column(&solution.x)?;
        let truth = Event::segment_truth(ham.segments());
        let report = SolutionReport::new(solution.x.as_slice(), &truth, DEFAULT_THRESHOLD)?;
        println!(
            "  {:>7}  {:>9}  {:>9}  {:>6}  {:>10.3}  {:>9.2}%  {:>9.1}",
            n_modules,
            n_particles,
            report.n_segments,
            solution.iterations,
            energy,
            100.0 * report.mismatch_fraction(),
            elapsed
        );
    }
    println!();

    #[cfg(feature = "quantum")]
    run_hhl(params)?;

    Ok(())
}

#[cfg(feature = "quantum")]
fn run_hhl(params: HamiltonianParams) -> Result<(), TrackError> {
    use track_hhl::quantum::upscale;

    // ═══════════════════════════════════════
    // HHL
    // ═══════════════════════════════════════
    println!("━━━ HHL ━━━");
    println!();
    println!(
        "  {:>7}  {:>9}  {:>9}  {:>6}  {:>6}  {:>10}  {:>10}",
        "Modules", "Particles", "Segments", "Qubits", "Gates", "Max |Δx|", "Mismatch"
    );
    println!(
        "  {:─>7}  {:─>9}  {:─>9}  {:─>6}  {:─>6}  {:─>10}  {:─>10}",
        "", "", "", "", "", "", ""
    );

    for &(n_modules, n_particles) in &[(3, 2), (3, 3)] {
        let event = generate(n_modules, n_particles);
        let mut ham = SimpleHamiltonian::new(params)?;
        ham.construct_hamiltonian(&event);

        let options = HhlOptions::default();
        let circuit = ham.solve_hhl(&options.circuit_only())?.into_circuit();
        let (qubits, gates) = circuit
            .map(|c| (c.num_qubits(), c.circuit.len()))
            .unwrap_or_default();

        let Some(x) = ham.solve_hhl(&options)?.into_solution() else {
            continue;
        };
        let classical = ham.solve_classically()?;

        // Padded systems decode with the original ‖b‖; undo that before comparing.
        let system = ham.system()?;
        let (_, b_up) = upscale(&system.a, &system.b);
        let x = x * (b_up.norm() / system.b.norm());
        let max_diff = x
            .iter()
            .zip(classical.x.iter())
            .map(|(q, c)| (q - c).abs())
            .fold(0.0, f64::max);

        let truth = Event::segment_truth(ham.segments());
        let report = SolutionReport::new(x.as_slice(), &truth, DEFAULT_THRESHOLD)?;
        println!(
            "  {:>7}  {:>9}  {:>9}  {:>6}  {:>6}  {:>10.2e}  {:>9.2}%",
            n_modules,
            n_particles,
            report.n_segments,
            qubits,
            gates,
            max_diff,
            100.0 * report.mismatch_fraction()
        );
    }
    println!();
    Ok(())
}
