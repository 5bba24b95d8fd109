// Copyright 2026 SFE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for the simulator.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. sfe.yaml file (or `--config PATH`)
//! 3. Environment variables (SFE_*)
//! 4. CLI arguments
//!
//! Times share one arbitrary unit throughout (T2, durations, gate times);
//! rates are in its inverse.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::decoupling::FrequencyGrid;
use crate::error::{Error, Result, ValidationError};
use crate::lindblad::{CorrelationMode, CorrelationModel, NoiseParameters};
use crate::validation::validate_num_qubits;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Noise engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Physical constants behind T_sfe and ε_mass
    #[serde(default)]
    pub constants: PhysicalConstants,

    /// Time-domain run settings
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Filter-function settings
    #[serde(default)]
    pub decoupling: DecouplingConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yaml::from_str(&content)?;
            }
        } else {
            for path in &["sfe.yaml", "sfe.yml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides. Unparseable values are ignored.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("SFE_NUM_QUBITS") {
            if let Ok(n) = val.parse() {
                self.engine.num_qubits = n;
            }
        }
        if let Ok(val) = env::var("SFE_T2") {
            if let Ok(t2) = val.parse() {
                self.engine.t2 = t2;
            }
        }
        if let Ok(val) = env::var("SFE_EPSILON_0") {
            if let Ok(eps) = val.parse() {
                self.engine.epsilon_0 = eps;
            }
        }
        if let Ok(val) = env::var("SFE_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("SFE_LOG_FORMAT") {
            self.logging.format = val;
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.engine.validate_physics()?;
        self.simulation.validate()?;
        self.decoupling.validate()?;

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(Error::Config(format!(
                "log format must be 'json' or 'pretty', got '{}'",
                self.logging.format
            )));
        }
        if !(self.constants.omega_lambda.is_finite() && self.constants.omega_lambda >= 0.0) {
            return Err(Error::Config("omega_lambda must be non-negative".into()));
        }
        Ok(())
    }
}

/// Engine construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Register size (1..=6)
    #[serde(default = "default_num_qubits")]
    pub num_qubits: usize,

    /// Coherence time T2
    #[serde(default = "default_t2")]
    pub t2: f64,

    /// Initial suppression coefficient ε₀
    #[serde(default = "default_epsilon_0")]
    pub epsilon_0: f64,

    /// Dephasing rate override (default 1/(2·T2))
    #[serde(default)]
    pub gamma_phi: Option<f64>,

    /// Damping rate override (default γ_φ/2)
    #[serde(default)]
    pub gamma_1: Option<f64>,

    /// T_sfe override (default derived from the physical constants)
    #[serde(default)]
    pub t_sfe: Option<f64>,

    /// Spatial noise correlation
    #[serde(default)]
    pub correlation: CorrelationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_qubits: default_num_qubits(),
            t2: default_t2(),
            epsilon_0: default_epsilon_0(),
            gamma_phi: None,
            gamma_1: None,
            t_sfe: None,
            correlation: CorrelationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Config for `num_qubits` qubits with coherence time `t2`, all else default.
    pub fn new(num_qubits: usize, t2: f64) -> Self {
        Self {
            num_qubits,
            t2,
            ..Self::default()
        }
    }

    pub fn noise_parameters(&self) -> NoiseParameters {
        NoiseParameters::from_t2(self.t2, self.epsilon_0).with_rates(self.gamma_phi, self.gamma_1)
    }

    /// Uncorrelated when no coordinates are given.
    pub fn correlation_model(&self) -> Result<CorrelationModel> {
        if self.correlation.coordinates.is_empty() {
            return Ok(CorrelationModel::uncorrelated(self.num_qubits));
        }
        CorrelationModel::from_coordinates(&self.correlation.coordinates, &self.correlation.modes)
    }

    /// Structural checks: register size, coordinate count, correlation
    /// modes. Physical values are not checked here; the engine maps T2 ≤ 0
    /// to zero rates and clamps negative rates.
    pub fn validate(&self) -> Result<()> {
        validate_num_qubits(self.num_qubits)?;

        let corr = &self.correlation;
        if !corr.coordinates.is_empty() && corr.coordinates.len() != self.num_qubits {
            return Err(ValidationError::Dimension {
                expected: self.num_qubits,
                actual: corr.coordinates.len(),
            }
            .into());
        }
        if let Some(mode) = corr.modes.iter().find(|m| m.weight.is_nan() || m.weight <= 0.0) {
            return Err(ValidationError::field(
                "correlation.modes",
                format!("weight must be positive, got {}", mode.weight),
            )
            .into());
        }
        self.correlation_model()?;
        Ok(())
    }

    /// Range checks on the physical values, applied to loaded config files.
    pub fn validate_physics(&self) -> Result<()> {
        if !(self.t2.is_finite() && self.t2 > 0.0) {
            return Err(ValidationError::field("t2", "must be positive").into());
        }
        if !self.epsilon_0.is_finite() {
            return Err(ValidationError::field("epsilon_0", "must be finite").into());
        }
        for (name, rate) in [("gamma_phi", self.gamma_phi), ("gamma_1", self.gamma_1)] {
            if let Some(r) = rate {
                if !(r.is_finite() && r >= 0.0) {
                    return Err(ValidationError::field(name, "must be non-negative").into());
                }
            }
        }
        if let Some(t) = self.t_sfe {
            if t.is_nan() || t <= 0.0 {
                return Err(ValidationError::field("t_sfe", "must be positive").into());
            }
        }
        Ok(())
    }
}

fn default_num_qubits() -> usize {
    1
}

fn default_t2() -> f64 {
    10.0
}

fn default_epsilon_0() -> f64 {
    0.355
}

/// Qubit positions and correlation kernels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// One [x, y, z] per qubit; empty means uncorrelated
    #[serde(default)]
    pub coordinates: Vec<[f64; 3]>,

    /// Exponential kernels
    #[serde(default)]
    pub modes: Vec<CorrelationMode>,
}

/// Constants feeding T_sfe and ε_mass (SI units).
///
///   M_P = √(ħc/G),  α = (m_p/M_P)^{2/3}·√(G/c),  g_q = α·√m_qubit
///   1/T_sfe = g_q²·Δφ²,  ε_mass = 2Ω_Λ − 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    #[serde(default = "default_g")]
    pub g: f64,
    #[serde(default = "default_c")]
    pub c: f64,
    #[serde(default = "default_hbar")]
    pub hbar: f64,
    /// Proton mass
    #[serde(default = "default_m_p")]
    pub m_p: f64,
    /// Effective qubit mass
    #[serde(default = "default_m_qubit")]
    pub m_qubit: f64,
    /// Field fluctuation variance Δφ²
    #[serde(default = "default_delta_phi_sq")]
    pub delta_phi_sq: f64,
    /// Dark-energy density fraction Ω_Λ
    #[serde(default = "default_omega_lambda")]
    pub omega_lambda: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            g: default_g(),
            c: default_c(),
            hbar: default_hbar(),
            m_p: default_m_p(),
            m_qubit: default_m_qubit(),
            delta_phi_sq: default_delta_phi_sq(),
            omega_lambda: default_omega_lambda(),
        }
    }
}

impl PhysicalConstants {
    pub fn planck_mass(&self) -> f64 {
        (self.hbar * self.c / self.g).sqrt()
    }

    pub fn coupling_alpha(&self) -> f64 {
        (self.m_p / self.planck_mass()).powf(2.0 / 3.0) * (self.g / self.c).sqrt()
    }

    /// g_q = α·√m_qubit
    pub fn qubit_coupling(&self) -> f64 {
        self.coupling_alpha() * self.m_qubit.sqrt()
    }

    /// Suppression timescale; infinite when the coupling vanishes.
    pub fn t_sfe(&self) -> f64 {
        let g = self.qubit_coupling();
        let rate = g * g * self.delta_phi_sq;
        if rate > 0.0 {
            1.0 / rate
        } else {
            f64::INFINITY
        }
    }

    pub fn epsilon_mass(&self) -> f64 {
        2.0 * self.omega_lambda - 1.0
    }
}

fn default_g() -> f64 {
    6.67430e-11
}

fn default_c() -> f64 {
    2.99792458e8
}

fn default_hbar() -> f64 {
    1.0545718e-34
}

fn default_m_p() -> f64 {
    1.6726219e-27
}

fn default_m_qubit() -> f64 {
    1e-30
}

fn default_delta_phi_sq() -> f64 {
    1e-60
}

fn default_omega_lambda() -> f64 {
    0.685
}

/// Time-domain run settings shared by the CLI commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Total evolution time
    #[serde(default = "default_total_time")]
    pub total_time: f64,

    /// Number of Kraus steps
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,

    /// Duration charged per gate in circuit runs
    #[serde(default = "default_gate_time")]
    pub gate_time: f64,

    /// Active-cancellation efficiency in [0, 1]
    #[serde(default = "default_efficiency")]
    pub cancellation_efficiency: f64,

    /// Noise scale factors for ZNE
    #[serde(default = "default_zne_scales")]
    pub zne_scales: Vec<f64>,

    /// ZNE polynomial order
    #[serde(default = "default_zne_order")]
    pub zne_order: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            total_time: default_total_time(),
            n_steps: default_n_steps(),
            gate_time: default_gate_time(),
            cancellation_efficiency: default_efficiency(),
            zne_scales: default_zne_scales(),
            zne_order: default_zne_order(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_steps == 0 {
            return Err(ValidationError::field("n_steps", "must be greater than 0").into());
        }
        if !(self.total_time.is_finite() && self.total_time > 0.0) {
            return Err(ValidationError::field("total_time", "must be positive").into());
        }
        if !(self.gate_time.is_finite() && self.gate_time >= 0.0) {
            return Err(ValidationError::field("gate_time", "must be non-negative").into());
        }
        if !(0.0..=1.0).contains(&self.cancellation_efficiency) {
            return Err(ValidationError::field(
                "cancellation_efficiency",
                "must lie in [0, 1]",
            )
            .into());
        }
        if self.zne_scales.is_empty() {
            return Err(ValidationError::field("zne_scales", "must not be empty").into());
        }
        Ok(())
    }
}

fn default_total_time() -> f64 {
    50.0
}

fn default_n_steps() -> usize {
    1000
}

fn default_gate_time() -> f64 {
    0.02
}

fn default_efficiency() -> f64 {
    0.9999
}

fn default_zne_scales() -> Vec<f64> {
    vec![1.0, 2.0, 3.0]
}

fn default_zne_order() -> usize {
    2
}

/// Filter-function evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecouplingConfig {
    /// π pulses per sequence
    #[serde(default = "default_n_pulses")]
    pub n_pulses: usize,

    /// Spectral exponent α of S(ω) = A/ω^α
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Spectral amplitude A
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,

    /// Sequence duration T
    #[serde(default = "default_dd_total_time")]
    pub total_time: f64,

    #[serde(default = "default_omega_min")]
    pub omega_min: f64,

    #[serde(default = "default_omega_max")]
    pub omega_max: f64,

    #[serde(default = "default_grid_points")]
    pub grid_points: usize,

    /// Highest notch target frequency
    #[serde(default = "default_notch_omega_max")]
    pub notch_omega_max: f64,
}

impl Default for DecouplingConfig {
    fn default() -> Self {
        Self {
            n_pulses: default_n_pulses(),
            alpha: default_alpha(),
            amplitude: default_amplitude(),
            total_time: default_dd_total_time(),
            omega_min: default_omega_min(),
            omega_max: default_omega_max(),
            grid_points: default_grid_points(),
            notch_omega_max: default_notch_omega_max(),
        }
    }
}

impl DecouplingConfig {
    /// Log-spaced quadrature grid.
    pub fn grid(&self) -> Result<FrequencyGrid> {
        FrequencyGrid::log_spaced(self.omega_min, self.omega_max, self.grid_points)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid()?;
        if !self.alpha.is_finite() {
            return Err(ValidationError::field("alpha", "must be finite").into());
        }
        if !(self.amplitude.is_finite() && self.amplitude >= 0.0) {
            return Err(ValidationError::field("amplitude", "must be non-negative").into());
        }
        if !(self.total_time.is_finite() && self.total_time > 0.0) {
            return Err(ValidationError::field("decoupling.total_time", "must be positive").into());
        }
        if !(self.notch_omega_max.is_finite() && self.notch_omega_max > 0.0) {
            return Err(ValidationError::field("notch_omega_max", "must be positive").into());
        }
        Ok(())
    }
}

fn default_n_pulses() -> usize {
    8
}

fn default_alpha() -> f64 {
    1.0
}

fn default_amplitude() -> f64 {
    1.0
}

fn default_dd_total_time() -> f64 {
    1.0
}

fn default_omega_min() -> f64 {
    crate::decoupling::filter::DEFAULT_OMEGA_MIN
}

fn default_omega_max() -> f64 {
    crate::decoupling::filter::DEFAULT_OMEGA_MAX
}

fn default_grid_points() -> usize {
    crate::decoupling::filter::DEFAULT_GRID_POINTS
}

fn default_notch_omega_max() -> f64 {
    16.0
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write as _;

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.num_qubits, 1);
        assert_eq!(config.engine.epsilon_0, 0.355);
        assert_eq!(config.simulation.n_steps, 1000);
        assert_eq!(config.decoupling.n_pulses, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_physical_constants() {
        let k = PhysicalConstants::default();
        assert_relative_eq!(k.epsilon_mass(), 0.37, epsilon = 1e-12);
        assert_relative_eq!(k.planck_mass(), 2.176e-8, max_relative = 1e-3);
        let t_sfe = k.t_sfe();
        assert!(t_sfe.is_finite() && t_sfe > 0.0);
        let g = k.qubit_coupling();
        assert_relative_eq!(1.0 / t_sfe, g * g * 1e-60, max_relative = 1e-12);

        let zero = PhysicalConstants {
            delta_phi_sq: 0.0,
            ..k
        };
        assert_eq!(zero.t_sfe(), f64::INFINITY);
    }

    #[test]
    fn test_noise_parameters_from_engine_config() {
        let mut cfg = EngineConfig::new(2, 4.0);
        let p = cfg.noise_parameters();
        assert_relative_eq!(p.gamma_phi, 0.125);
        assert_relative_eq!(p.gamma_1, 0.0625);

        cfg.gamma_1 = Some(0.5);
        assert_eq!(cfg.noise_parameters().gamma_1, 0.5);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn test_engine_validation() {
        assert!(EngineConfig::new(0, 1.0).validate().is_err());
        assert!(EngineConfig::new(7, 1.0).validate().is_err());
        assert!(EngineConfig::new(2, 0.0).validate().is_ok());
        assert!(EngineConfig::new(2, 0.0).validate_physics().is_err());
        assert!(EngineConfig::new(2, -1.0).validate_physics().is_err());

        let mut rates = EngineConfig::new(2, 1.0);
        rates.gamma_1 = Some(-0.5);
        rates.t_sfe = Some(0.0);
        assert!(rates.validate().is_ok());
        assert!(rates.validate_physics().is_err());

        let mut config = Config::default();
        config.engine.t2 = 0.0;
        assert!(config.validate().is_err());

        let mut cfg = EngineConfig::new(2, 1.0);
        cfg.correlation.coordinates = vec![[0.0; 3]];
        cfg.correlation.modes = vec![CorrelationMode::new(1.0, 1.0)];
        let msg = format!("{}", cfg.validate().unwrap_err());
        assert!(msg.contains("expected 2"));

        cfg.correlation.coordinates = vec![[0.0; 3], [1.0, 0.0, 0.0]];
        assert!(cfg.validate().is_ok());

        cfg.correlation.modes = vec![CorrelationMode::new(-1.0, 1.0)];
        assert!(cfg.validate().is_err());

        cfg.correlation.modes = vec![CorrelationMode::new(1.0, 0.0)];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_simulation_validation() {
        let mut config = Config::default();
        config.simulation.n_steps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.total_time = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.cancellation_efficiency = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.zne_scales.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decoupling_validation() {
        let mut config = Config::default();
        config.decoupling.omega_min = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.decoupling.grid_points = 1;
        assert!(config.validate().is_err());

        assert_eq!(
            DecouplingConfig::default().grid().unwrap().len(),
            crate::decoupling::filter::DEFAULT_GRID_POINTS
        );
    }

    #[test]
    fn test_log_format_validation() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        let msg = format!("{}", config.validate().unwrap_err());
        assert!(msg.contains("log format"));
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn test_config_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
engine:
  num_qubits: 3
  gamma_1: 0.25
  correlation:
    coordinates: [[0, 0, 0], [1, 0, 0], [2, 0, 0]]
    modes:
      - length: 1.5
      - length: 10.0
        weight: 0.5
simulation:
  n_steps: 50
"#
        )
        .unwrap();

        let config = Config::load(Some(f.path())).unwrap();
        assert_eq!(config.engine.num_qubits, 3);
        assert_eq!(config.engine.gamma_1, Some(0.25));
        assert_eq!(config.engine.correlation.modes[0].weight, 1.0);
        assert_eq!(config.simulation.n_steps, 50);
        // untouched sections keep their defaults
        assert_eq!(config.simulation.total_time, 50.0);
        assert!(config.validate().is_ok());

        let model = config.engine.correlation_model().unwrap();
        assert_eq!(model.n_qubits(), 3);
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let path = std::path::Path::new("/tmp/does_not_exist_sfe_test.yaml");
        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.simulation.n_steps, 1000);
    }

    #[test]
    fn test_config_load_invalid_yaml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{{{{not: valid: yaml::::").unwrap();

        let result = Config::load(Some(f.path()));
        assert!(result.is_err());
    }

    // =========================================================================
    // Environment overrides
    // =========================================================================

    #[test]
    fn test_env_override_num_qubits() {
        let mut config = Config::default();
        std::env::set_var("SFE_NUM_QUBITS", "3");
        config.apply_env_overrides();
        assert_eq!(config.engine.num_qubits, 3);
        std::env::remove_var("SFE_NUM_QUBITS");
    }

    #[test]
    fn test_env_override_t2_ignores_garbage() {
        let mut config = Config::default();
        std::env::set_var("SFE_T2", "not-a-number");
        config.apply_env_overrides();
        assert_eq!(config.engine.t2, 10.0);
        std::env::set_var("SFE_T2", "7.5");
        config.apply_env_overrides();
        assert_eq!(config.engine.t2, 7.5);
        std::env::remove_var("SFE_T2");
    }

    #[test]
    fn test_env_override_epsilon_0() {
        let mut config = Config::default();
        std::env::set_var("SFE_EPSILON_0", "0.1");
        config.apply_env_overrides();
        assert_eq!(config.engine.epsilon_0, 0.1);
        std::env::remove_var("SFE_EPSILON_0");
    }

    #[test]
    fn test_env_override_logging() {
        let mut config = Config::default();
        std::env::set_var("SFE_LOG_LEVEL", "debug");
        std::env::set_var("SFE_LOG_FORMAT", "json");
        config.apply_env_overrides();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        std::env::remove_var("SFE_LOG_LEVEL");
        std::env::remove_var("SFE_LOG_FORMAT");
    }
}
