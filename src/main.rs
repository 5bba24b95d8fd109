// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! SFE noise simulator CLI
//!
//! Runs the engine's drivers on a register prepared in |+⟩^⊗n (or |0…0⟩ for
//! circuits) and prints a report.
//!
//! # Usage
//!
//! ```bash
//! # Free decay with closed-form predictions
//! sfe-sim evolve --time 50 --steps 1000
//!
//! # CPMG vs UDD under 1/f noise, plus the notch sequence
//! sfe-sim decoupling --pulses 8 --alpha 1.0 --notch
//!
//! # Bell circuit with suppression, JSON output
//! sfe-sim --json circuit --gates "h:0,cnot:0:1" --qubits 2
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ndarray::Array2;
use num_complex::Complex64;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sfe_quantum::cancellation::{ActiveCanceller, FieldModel};
use sfe_quantum::config::Config;
use sfe_quantum::decoupling::{
    coherence, compare_sequences, decoherence_integral, solve_notch_sequence, PowerLawSpectrum,
    PulseSequence, SequenceKind, Suppressed,
};
use sfe_quantum::linalg::{c, conjugate, embed};
use sfe_quantum::lindblad::{
    parse_circuit, purity, state_fidelity, CorrectionOptions, DecoherenceEngine,
};
use sfe_quantum::suppression::FidelityModel;
use sfe_quantum::{Result, VERSION};

/// Open-system qubit noise simulator
#[derive(Parser)]
#[command(name = "sfe-sim")]
#[command(author = "SFE Contributors")]
#[command(version = VERSION)]
#[command(about = "Decoherence, decoupling, cancellation and ZNE for small qubit registers")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "SFE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Register size
    #[arg(long, global = true)]
    qubits: Option<usize>,

    /// Coherence time T2
    #[arg(long, global = true)]
    t2: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Free decay of |+⟩^⊗n against the closed-form fidelity laws
    Evolve {
        #[arg(long)]
        time: Option<f64>,

        #[arg(long)]
        steps: Option<usize>,

        /// Rows to print
        #[arg(long, default_value_t = 10)]
        samples: usize,

        /// Compare uncorrected and phase/amplitude-corrected branches
        #[arg(long)]
        correct: bool,

        /// Drift frequency ω₀ for --correct
        #[arg(long, default_value_t = 1.0)]
        omega_0: f64,

        /// Run under the engine's coherent field with this pulse sequence
        /// (free, hahn_echo, cpmg, udd, log_warped)
        #[arg(long, conflicts_with = "correct")]
        sequence: Option<String>,
    },

    /// Filter-function comparison of free, CPMG and UDD
    Decoupling {
        #[arg(long)]
        pulses: Option<usize>,

        /// Spectral exponent α
        #[arg(long)]
        alpha: Option<f64>,

        /// Scale the spectrum by (1 − ε_mass)
        #[arg(long)]
        suppressed: bool,

        /// Also solve for a notch sequence
        #[arg(long)]
        notch: bool,
    },

    /// Active cancellation of the engine's coherent field
    Cancel {
        #[arg(long)]
        efficiency: Option<f64>,

        #[arg(long)]
        time: Option<f64>,

        #[arg(long)]
        steps: Option<usize>,
    },

    /// Zero-noise extrapolation of ⟨σx⟩ on qubit 0
    Zne {
        /// Noise scale factors
        #[arg(long, value_delimiter = ',')]
        scales: Option<Vec<f64>>,

        #[arg(long)]
        order: Option<usize>,

        #[arg(long)]
        time: Option<f64>,

        #[arg(long)]
        steps: Option<usize>,
    },

    /// Noisy gate sequence from |0…0⟩, with and without suppression
    Circuit {
        /// Comma-separated gates, e.g. "h:0,cnot:0:1"
        #[arg(long, default_value = "h:0,cnot:0:1")]
        gates: String,

        #[arg(long)]
        gate_time: Option<f64>,
    },

    /// Show effective configuration
    Config,

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, then apply CLI overrides
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(n) = cli.qubits {
        config.engine.num_qubits = n;
    }
    if let Some(t2) = cli.t2 {
        config.engine.t2 = t2;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging.level, config.logging.format == "json");

    match cli.command {
        Commands::Evolve {
            time,
            steps,
            samples,
            correct,
            omega_0,
            sequence,
        } => {
            config.validate()?;
            let total_time = time.unwrap_or(config.simulation.total_time);
            let n_steps = steps.unwrap_or(config.simulation.n_steps);
            let mut engine = build_engine(&config)?;
            let rho0 = plus_register(engine.num_qubits());

            if correct {
                let options = CorrectionOptions {
                    omega_0,
                    ..CorrectionOptions::default()
                };
                let run = engine.simulate_with_correction(&rho0, total_time, n_steps, options)?;
                let uncorrected = engine.calculate_fidelity_history(&run.uncorrected, &rho0)?;
                let corrected = engine.calculate_fidelity_history(&run.corrected, &rho0)?;
                let rows: Vec<CorrectionRow> = sample_indices(run.times.len(), samples)
                    .into_iter()
                    .map(|i| CorrectionRow {
                        t: run.times[i],
                        uncorrected: uncorrected[i],
                        corrected: corrected[i],
                    })
                    .collect();

                if cli.json {
                    print_json(&rows)?;
                } else {
                    println!("{:>12}  {:>12}  {:>12}", "t", "uncorrected", "corrected");
                    for r in &rows {
                        println!("{:>12.4}  {:>12.6}  {:>12.6}", r.t, r.uncorrected, r.corrected);
                    }
                    println!("ε_total = {:.6}", engine.epsilon_total());
                }
            } else {
                let evolution = match sequence {
                    Some(kind) => {
                        let kind: SequenceKind = kind.parse()?;
                        let seq = PulseSequence::build(kind, config.decoupling.n_pulses);
                        let p = engine.noise_parameters();
                        let field = FieldModel::from_t2(p.epsilon_0, p.t2);
                        engine.simulate_with_decoupling(&rho0, total_time, n_steps, &seq, &field)?
                    }
                    None => engine.simulate_evolution(&rho0, total_time, n_steps)?,
                };
                let history = engine.calculate_fidelity_history(&evolution.states, &rho0)?;
                let rows: Vec<EvolveRow> = sample_indices(evolution.times.len(), samples)
                    .into_iter()
                    .map(|i| {
                        let t = evolution.times[i];
                        EvolveRow {
                            t,
                            simulated: history[i],
                            purity: purity(&evolution.states[i]),
                            predicted: FidelityModel::all()
                                .iter()
                                .map(|&m| (m.name(), engine.predict_fidelity(t, m, 1.0)))
                                .collect(),
                        }
                    })
                    .collect();

                if cli.json {
                    print_json(&rows)?;
                } else {
                    print!("{:>12}  {:>10}  {:>10}", "t", "simulated", "purity");
                    for m in FidelityModel::all() {
                        print!("  {:>10}", m.name());
                    }
                    println!();
                    for r in &rows {
                        print!("{:>12.4}  {:>10.6}  {:>10.6}", r.t, r.simulated, r.purity);
                        for m in FidelityModel::all() {
                            print!("  {:>10.6}", r.predicted.get(m.name()).copied().unwrap_or(0.0));
                        }
                        println!();
                    }
                }
            }
        }

        Commands::Decoupling {
            pulses,
            alpha,
            suppressed,
            notch,
        } => {
            if let Some(n) = pulses {
                config.decoupling.n_pulses = n;
            }
            if let Some(a) = alpha {
                config.decoupling.alpha = a;
            }
            config.validate()?;

            let dd = &config.decoupling;
            let grid = dd.grid()?;
            let base = PowerLawSpectrum::new(dd.amplitude, dd.alpha);
            let comparison = if suppressed {
                let spectrum = Suppressed::new(base, config.constants.epsilon_mass());
                compare_sequences(dd.n_pulses, &spectrum, dd.total_time, &grid)
            } else {
                compare_sequences(dd.n_pulses, &base, dd.total_time, &grid)
            };

            let notch_report = if notch {
                let result = solve_notch_sequence(dd.n_pulses, dd.notch_omega_max)?;
                let w = decoherence_integral(&result.sequence, dd.total_time, &base, &grid);
                Some(NotchReport {
                    fractions: result.sequence.fractions().to_vec(),
                    initial_residual: result.initial_residual,
                    final_residual: result.final_residual,
                    fell_back: result.fell_back,
                    decoherence: w,
                })
            } else {
                None
            };

            if cli.json {
                print_json(&DecouplingReport {
                    comparison,
                    notch: notch_report,
                })?;
            } else {
                println!(
                    "n = {}, α = {}, T = {}",
                    comparison.n_pulses, dd.alpha, comparison.total_time
                );
                println!("{:>8}  {:>14}  {:>12}", "sequence", "W", "coherence");
                for (name, w) in [
                    ("free", comparison.free),
                    ("cpmg", comparison.cpmg),
                    ("udd", comparison.udd),
                ] {
                    println!("{:>8}  {:>14.6e}  {:>12.6}", name, w, coherence(w));
                }
                let (best, _) = comparison.best();
                println!("best pulsed sequence: {best}");

                if let Some(n) = notch_report {
                    println!(
                        "notch: residual {:.3e} -> {:.3e}{}, W = {:.6e}",
                        n.initial_residual,
                        n.final_residual,
                        if n.fell_back { " (UDD fallback)" } else { "" },
                        n.decoherence
                    );
                    println!("notch positions: {:?}", n.fractions);
                }
            }
        }

        Commands::Cancel {
            efficiency,
            time,
            steps,
        } => {
            if let Some(e) = efficiency {
                config.simulation.cancellation_efficiency = e;
            }
            config.validate()?;
            let total_time = time.unwrap_or(config.simulation.total_time);
            let n_steps = steps.unwrap_or(config.simulation.n_steps);
            let engine = build_engine(&config)?;
            let rho0 = plus_register(engine.num_qubits());

            let canceller =
                ActiveCanceller::for_engine(&engine, config.simulation.cancellation_efficiency);
            let report = canceller.simulate(&engine, &rho0, total_time, n_steps)?;
            let summary = CancelSummary {
                efficiency: report.efficiency,
                fidelity_without: report.fidelity_without.last().copied().unwrap_or(1.0),
                fidelity_with: report.fidelity_with.last().copied().unwrap_or(1.0),
                suppression_factor: report.suppression_factor(),
            };

            if cli.json {
                print_json(&summary)?;
            } else {
                println!("efficiency          {:.6}", summary.efficiency);
                println!("F without           {:.6}", summary.fidelity_without);
                println!("F with              {:.6}", summary.fidelity_with);
                println!("suppression factor  {:.3}", summary.suppression_factor);
            }
        }

        Commands::Zne {
            scales,
            order,
            time,
            steps,
        } => {
            if let Some(s) = scales {
                config.simulation.zne_scales = s;
            }
            if let Some(o) = order {
                config.simulation.zne_order = o;
            }
            config.validate()?;
            let sim = &config.simulation;
            let total_time = time.unwrap_or(sim.total_time);
            let n_steps = steps.unwrap_or(sim.n_steps);
            let engine = build_engine(&config)?;
            let n = engine.num_qubits();
            let rho0 = plus_register(n);
            let observable = embed(&[(0, &sigma_x())], n);

            let result = engine.zero_noise_extrapolate(
                &observable,
                &rho0,
                total_time,
                n_steps,
                &sim.zne_scales,
                sim.zne_order,
            )?;

            if cli.json {
                print_json(&result)?;
            } else {
                println!("{:>8}  {:>12}", "scale", "⟨σx⟩");
                for (s, v) in result.scales.iter().zip(&result.values) {
                    println!("{:>8.3}  {:>12.6}", s, v);
                }
                println!("fit order {}, mitigated {:.6}", result.fit.order, result.mitigated());
            }
        }

        Commands::Circuit { gates, gate_time } => {
            config.validate()?;
            let gates = parse_circuit(&gates)?;
            let gate_time = gate_time.unwrap_or(config.simulation.gate_time);
            let mut engine = build_engine(&config)?;
            let n = engine.num_qubits();
            let rho0 = ground_register(n);

            let mut ideal = rho0.clone();
            for g in &gates {
                ideal = conjugate(&ideal, &g.unitary(n)?);
            }

            let plain = engine.simulate_circuit(&rho0, &gates, gate_time, false)?;
            engine.reset_epsilon();
            let suppressed = engine.simulate_circuit(&rho0, &gates, gate_time, true)?;

            let summary = CircuitSummary {
                gates: gates.iter().map(ToString::to_string).collect(),
                duration: plain.times.last().copied().unwrap_or(0.0),
                fidelity_plain: plain
                    .final_state()
                    .map(|r| state_fidelity(r, &ideal))
                    .unwrap_or(1.0),
                fidelity_suppressed: suppressed
                    .final_state()
                    .map(|r| state_fidelity(r, &ideal))
                    .unwrap_or(1.0),
                epsilon_total: engine.epsilon_total(),
            };

            if cli.json {
                print_json(&summary)?;
            } else {
                println!("gates               {}", summary.gates.join(", "));
                println!("duration            {:.4}", summary.duration);
                println!("F (plain)           {:.6}", summary.fidelity_plain);
                println!("F (suppressed)      {:.6}", summary.fidelity_suppressed);
                println!("ε_total             {:.6}", summary.epsilon_total);
            }
        }

        Commands::Config => {
            // Show effective configuration
            println!("{}", serde_yaml::to_string(&config)?);
        }

        Commands::Validate => match config.validate() {
            Ok(()) => {
                let engine = build_engine(&config)?;
                if cli.json {
                    print_json(&engine.info())?;
                } else {
                    println!("Configuration is valid");
                }
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Initialize logging with tracing. Logs go to stderr so reports stay clean.
fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn build_engine(config: &Config) -> Result<DecoherenceEngine> {
    let engine = DecoherenceEngine::with_constants(config.engine.clone(), &config.constants)?;
    info!(version = VERSION, num_qubits = engine.num_qubits(), "Engine ready");
    Ok(engine)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// At most `samples + 1` evenly spread indices into a series of `len`,
/// always including both ends.
fn sample_indices(len: usize, samples: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let last = len - 1;
    let samples = samples.clamp(1, last.max(1));
    let mut idx: Vec<usize> = (0..=samples).map(|k| k * last / samples).collect();
    idx.dedup();
    idx
}

fn plus_register(n_qubits: usize) -> Array2<Complex64> {
    let d = 1usize << n_qubits;
    Array2::from_elem((d, d), c(1.0 / d as f64))
}

fn ground_register(n_qubits: usize) -> Array2<Complex64> {
    let d = 1usize << n_qubits;
    let mut rho = Array2::zeros((d, d));
    rho[[0, 0]] = c(1.0);
    rho
}

fn sigma_x() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 1]] = c(1.0);
    m[[1, 0]] = c(1.0);
    m
}

#[derive(Serialize)]
struct EvolveRow {
    t: f64,
    simulated: f64,
    purity: f64,
    predicted: BTreeMap<&'static str, f64>,
}

#[derive(Serialize)]
struct CorrectionRow {
    t: f64,
    uncorrected: f64,
    corrected: f64,
}

#[derive(Serialize)]
struct NotchReport {
    fractions: Vec<f64>,
    initial_residual: f64,
    final_residual: f64,
    fell_back: bool,
    decoherence: f64,
}

#[derive(Serialize)]
struct DecouplingReport {
    comparison: sfe_quantum::decoupling::SequenceComparison,
    notch: Option<NotchReport>,
}

#[derive(Serialize)]
struct CancelSummary {
    efficiency: f64,
    fidelity_without: f64,
    fidelity_with: f64,
    suppression_factor: f64,
}

#[derive(Serialize)]
struct CircuitSummary {
    gates: Vec<String>,
    duration: f64,
    fidelity_plain: f64,
    fidelity_suppressed: f64,
    epsilon_total: f64,
}
