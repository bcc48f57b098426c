//! Backend configuration types.
//!
//! One config struct per reconstruction backend, loadable from JSON with
//! every field defaulted, plus the derived-value rules the flows rely on
//! (reconstruction matrix naming, per-tensor-count model menus).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TractoError};
use crate::gradients::GradientSource;

/// Diffusion acquisition model handled by the DTK backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagingModel {
    #[serde(rename = "DSI")]
    Dsi,
    #[serde(rename = "HARDI")]
    Hardi,
    #[serde(rename = "DTI")]
    Dti,
}

/// Scalar maps the DTK flow can derive from an ODF reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdditionalMap {
    #[serde(rename = "gFA")]
    GFa,
    #[serde(rename = "skewness")]
    Skewness,
    #[serde(rename = "kurtosis")]
    Kurtosis,
    #[serde(rename = "P0")]
    P0,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DtkReconConfig {
    pub imaging_model: ImagingModel,
    pub maximum_b_value: u32,
    pub gradient: GradientSource,
    pub dsi_number_of_directions: u32,
    pub number_of_directions: u32,
    pub number_of_output_directions: u32,
    pub apply_gradient_orientation_correction: bool,
    pub number_of_averages: u32,
    pub multiple_high_b_values: bool,
    pub number_of_b0_volumes: u32,
    pub compute_additional_maps: Vec<AdditionalMap>,
}

impl Default for DtkReconConfig {
    fn default() -> Self {
        Self {
            imaging_model: ImagingModel::Dsi,
            maximum_b_value: 1000,
            gradient: GradientSource::default(),
            dsi_number_of_directions: 514,
            number_of_directions: 514,
            number_of_output_directions: 181,
            apply_gradient_orientation_correction: true,
            number_of_averages: 1,
            multiple_high_b_values: false,
            number_of_b0_volumes: 1,
            compute_additional_maps: vec![
                AdditionalMap::GFa,
                AdditionalMap::Skewness,
                AdditionalMap::Kurtosis,
                AdditionalMap::P0,
            ],
        }
    }
}

/// DSI grids supported by the packaged reconstruction matrices
pub const DSI_DIRECTION_COUNTS: &[u32] = &[514, 257, 124];

impl DtkReconConfig {
    /// File name of the DSI reconstruction matrix for the configured grid
    /// (the matrix has one more row than the sampling has directions).
    pub fn recon_matrix_file(&self) -> String {
        format!("DSI_matrix_{}x181.dat", self.dsi_number_of_directions + 1)
    }

    /// Effective direction count: the DSI grid for DSI, otherwise the
    /// gradient table's count.
    pub fn effective_directions(&self) -> u32 {
        match self.imaging_model {
            ImagingModel::Dsi => self.dsi_number_of_directions,
            _ => self.gradient.number_of_directions(self.number_of_directions),
        }
    }

    pub fn wants_map(&self, map: AdditionalMap) -> bool {
        self.compute_additional_maps.contains(&map)
    }

    pub fn validate(&self) -> Result<()> {
        if self.imaging_model == ImagingModel::Dsi
            && !DSI_DIRECTION_COUNTS.contains(&self.dsi_number_of_directions)
        {
            return Err(TractoError::InvalidParameter(format!(
                "dsi_number_of_directions must be one of {:?}, got {}",
                DSI_DIRECTION_COUNTS, self.dsi_number_of_directions
            )));
        }
        if self.imaging_model != ImagingModel::Dsi {
            self.gradient.resolve()?;
        }
        if self.number_of_b0_volumes == 0 {
            return Err(TractoError::InvalidParameter(
                "number_of_b0_volumes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tractography seeding mode; probabilistic tracking requires CSD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingMode {
    Deterministic,
    Probabilistic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MrtrixReconConfig {
    pub gradient: GradientSource,
    pub b_value: u32,
    /// false: tensor only, true: constrained spherical deconvolution
    pub local_model: bool,
    /// Maximum spherical harmonic order; `None` lets the tools choose
    pub lmax_order: Option<u32>,
    pub normalize_to_b0: bool,
    /// FA threshold for the single-fiber voxel mask
    pub single_fib_thr: f64,
    pub recon_mode: TrackingMode,
}

impl Default for MrtrixReconConfig {
    fn default() -> Self {
        Self {
            gradient: GradientSource::default(),
            b_value: 1000,
            local_model: false,
            lmax_order: None,
            normalize_to_b0: false,
            single_fib_thr: 0.7,
            recon_mode: TrackingMode::Deterministic,
        }
    }
}

impl MrtrixReconConfig {
    /// Whether the CSD sub-graph is built. Probabilistic tracking cannot
    /// run on a plain tensor fit, so it forces the local model on.
    pub fn effective_local_model(&self) -> bool {
        self.local_model || self.recon_mode == TrackingMode::Probabilistic
    }

    pub fn validate(&self) -> Result<()> {
        self.gradient.resolve()?;
        if let Some(lmax) = self.lmax_order {
            if lmax % 2 != 0 || !(2..=16).contains(&lmax) {
                return Err(TractoError::InvalidParameter(format!(
                    "lmax_order must be an even value in 2..=16, got {}",
                    lmax
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.single_fib_thr) {
            return Err(TractoError::InvalidParameter(format!(
                "single_fib_thr must be within [0, 1], got {}",
                self.single_fib_thr
            )));
        }
        Ok(())
    }
}

/// Number of tensors fitted per voxel by the Camino backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensorCount {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    Multitensor,
}

impl TensorCount {
    /// Fit models selectable for this tensor count
    pub fn model_menu(&self) -> &'static [&'static str] {
        match self {
            TensorCount::One => &["dt", "nldt_pos", "nldt", "ldt_wtd"],
            TensorCount::Two => &[
                "cylcyl",
                "cylcyl_eq",
                "pospos",
                "pospos_eq",
                "poscyl",
                "poscyl_eq",
            ],
            TensorCount::Three => &[
                "cylcylcyl",
                "cylcylcyl_eq",
                "pospospos",
                "pospospos_eq",
                "posposcyl",
                "posposcyl_eq",
                "poscylcyl",
                "poscylcyl_eq",
            ],
            TensorCount::Multitensor => &["adc", "ball_stick"],
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.model_menu()[0]
    }

    /// `-inputmodel` value the scalar-map tools expect for fitted data
    pub fn inputmodel(&self) -> &'static str {
        match self {
            TensorCount::One => "dt",
            TensorCount::Two => "twotensor",
            TensorCount::Three => "threetensor",
            TensorCount::Multitensor => "multitensor",
        }
    }

    /// The eigensystem tool only distinguishes single from multi tensor
    pub fn eigen_inputmodel(&self) -> &'static str {
        match self {
            TensorCount::One => "dt",
            _ => "multitensor",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaminoReconConfig {
    pub gradient: GradientSource,
    pub b_value: u32,
    pub number_of_tensors: TensorCount,
    pub max_components: u32,
    pub local_model: String,
}

impl Default for CaminoReconConfig {
    fn default() -> Self {
        Self {
            gradient: GradientSource::default(),
            b_value: 1000,
            number_of_tensors: TensorCount::One,
            max_components: 1,
            local_model: "dt".to_string(),
        }
    }
}

impl CaminoReconConfig {
    pub fn validate(&self) -> Result<()> {
        self.gradient.resolve()?;
        let menu = self.number_of_tensors.model_menu();
        if !menu.contains(&self.local_model.as_str()) {
            return Err(TractoError::InvalidParameter(format!(
                "model '{}' is not valid for {:?} tensors; choose one of {:?}",
                self.local_model, self.number_of_tensors, menu
            )));
        }
        if self.max_components == 0 {
            return Err(TractoError::InvalidParameter(
                "max_components must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Spherical harmonic coefficient convention of the Gibbs input image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShConvention {
    #[serde(rename = "FSL")]
    Fsl,
    #[serde(rename = "MRtrix")]
    Mrtrix,
}

impl ShConvention {
    pub fn as_arg(&self) -> &'static str {
        match self {
            ShConvention::Fsl => "FSL",
            ShConvention::Mrtrix => "MRtrix",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GibbsReconConfig {
    pub iterations: u64,
    pub particle_length: f64,
    pub particle_width: f64,
    pub particle_weight: f64,
    pub temp_start: f64,
    pub temp_end: f64,
    pub inexbalance: i32,
    pub fiber_length: f64,
    pub curvature_threshold: f64,
    pub sh_coefficient_convention: ShConvention,
}

impl Default for GibbsReconConfig {
    fn default() -> Self {
        Self {
            iterations: 100_000_000,
            particle_length: 1.5,
            particle_width: 0.5,
            particle_weight: 0.0003,
            temp_start: 0.1,
            temp_end: 0.001,
            inexbalance: -2,
            fiber_length: 20.0,
            curvature_threshold: 90.0,
            sh_coefficient_convention: ShConvention::Fsl,
        }
    }
}

impl GibbsReconConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(TractoError::InvalidParameter(
                "iterations must be greater than 0".to_string(),
            ));
        }
        if self.temp_end >= self.temp_start {
            return Err(TractoError::InvalidParameter(format!(
                "temp_end ({}) must be below temp_start ({})",
                self.temp_end, self.temp_start
            )));
        }
        Ok(())
    }
}

/// A complete reconstruction configuration, tagged by backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ReconConfig {
    Dtk(DtkReconConfig),
    Mrtrix(MrtrixReconConfig),
    Camino(CaminoReconConfig),
    Gibbs(GibbsReconConfig),
}

impl ReconConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            ReconConfig::Dtk(_) => "dtk",
            ReconConfig::Mrtrix(_) => "mrtrix",
            ReconConfig::Camino(_) => "camino",
            ReconConfig::Gibbs(_) => "gibbs",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ReconConfig::Dtk(c) => c.validate(),
            ReconConfig::Mrtrix(c) => c.validate(),
            ReconConfig::Camino(c) => c.validate(),
            ReconConfig::Gibbs(c) => c.validate(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| TractoError::FileNotFound(path.display().to_string()))?;
        serde_json::from_str(&text)
            .map_err(|e| TractoError::InvalidParameter(format!("bad config file: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtk_defaults() {
        let config = DtkReconConfig::default();
        assert_eq!(config.imaging_model, ImagingModel::Dsi);
        assert_eq!(config.maximum_b_value, 1000);
        assert_eq!(config.compute_additional_maps.len(), 4);
    }

    #[test]
    fn test_recon_matrix_file_naming() {
        let mut config = DtkReconConfig::default();
        assert_eq!(config.recon_matrix_file(), "DSI_matrix_515x181.dat");
        config.dsi_number_of_directions = 257;
        assert_eq!(config.recon_matrix_file(), "DSI_matrix_258x181.dat");
        config.dsi_number_of_directions = 124;
        assert_eq!(config.recon_matrix_file(), "DSI_matrix_125x181.dat");
    }

    #[test]
    fn test_dtk_rejects_bad_dsi_grid() {
        let config = DtkReconConfig {
            dsi_number_of_directions: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_directions_follow_table() {
        let config = DtkReconConfig {
            imaging_model: ImagingModel::Hardi,
            gradient: GradientSource::named("siemens_64"),
            ..Default::default()
        };
        assert_eq!(config.effective_directions(), 64);
    }

    #[test]
    fn test_probabilistic_forces_csd() {
        let config = MrtrixReconConfig {
            local_model: false,
            recon_mode: TrackingMode::Probabilistic,
            ..Default::default()
        };
        assert!(config.effective_local_model());
    }

    #[test]
    fn test_mrtrix_lmax_validation() {
        let ok = MrtrixReconConfig {
            lmax_order: Some(8),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let odd = MrtrixReconConfig {
            lmax_order: Some(7),
            ..Default::default()
        };
        assert!(odd.validate().is_err());

        let too_big = MrtrixReconConfig {
            lmax_order: Some(18),
            ..Default::default()
        };
        assert!(too_big.validate().is_err());
    }

    #[test]
    fn test_camino_model_menus() {
        assert_eq!(TensorCount::One.default_model(), "dt");
        assert_eq!(TensorCount::Two.default_model(), "cylcyl");
        assert_eq!(TensorCount::Three.default_model(), "cylcylcyl");
        assert_eq!(TensorCount::Multitensor.default_model(), "adc");
        assert!(TensorCount::Multitensor.model_menu().contains(&"ball_stick"));
    }

    #[test]
    fn test_camino_inputmodel_mapping() {
        assert_eq!(TensorCount::One.inputmodel(), "dt");
        assert_eq!(TensorCount::Two.inputmodel(), "twotensor");
        assert_eq!(TensorCount::Three.inputmodel(), "threetensor");
        assert_eq!(TensorCount::Multitensor.inputmodel(), "multitensor");
        assert_eq!(TensorCount::Three.eigen_inputmodel(), "multitensor");
        assert_eq!(TensorCount::One.eigen_inputmodel(), "dt");
    }

    #[test]
    fn test_camino_rejects_model_outside_menu() {
        let config = CaminoReconConfig {
            number_of_tensors: TensorCount::Two,
            local_model: "dt".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gibbs_defaults_and_validation() {
        let config = GibbsReconConfig::default();
        assert_eq!(config.iterations, 100_000_000);
        assert!(config.validate().is_ok());

        let inverted = GibbsReconConfig {
            temp_start: 0.001,
            temp_end: 0.1,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_config_json_round_trip_with_defaults() {
        let json = r#"{"backend": "mrtrix", "local_model": true}"#;
        let config: ReconConfig = serde_json::from_str(json).unwrap();
        match &config {
            ReconConfig::Mrtrix(c) => {
                assert!(c.local_model);
                assert_eq!(c.b_value, 1000);
                assert_eq!(c.single_fib_thr, 0.7);
            }
            other => panic!("wrong backend parsed: {:?}", other),
        }
        assert_eq!(config.backend_name(), "mrtrix");
    }

    #[test]
    fn test_imaging_model_serde_names() {
        let json = r#"{"backend": "dtk", "imaging_model": "HARDI"}"#;
        let config: ReconConfig = serde_json::from_str(json).unwrap();
        match config {
            ReconConfig::Dtk(c) => assert_eq!(c.imaging_model, ImagingModel::Hardi),
            other => panic!("wrong backend parsed: {:?}", other),
        }
    }

    #[test]
    fn test_additional_map_serde_names() {
        let maps: Vec<AdditionalMap> =
            serde_json::from_str(r#"["gFA", "P0", "skewness"]"#).unwrap();
        assert_eq!(
            maps,
            vec![AdditionalMap::GFa, AdditionalMap::P0, AdditionalMap::Skewness]
        );
    }
}
