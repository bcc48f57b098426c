//! MITK Gibbs global tracking wrapper. The tracker reads its annealing
//! parameters from a `.gtp` XML file written next to the invocation:
//! `mitkFiberTrackingMiniApps.sh GibbsTracking -i <image> -p <gtp> [-m <mask>] [-s <convention>] [-o <out>]`

use std::path::{Path, PathBuf};

use crate::config::{GibbsReconConfig, ShConvention};
use crate::error::Result;
use crate::workflow::{input_path, Interface, Invocation, PortMap, PortValue};

pub const PARAMETER_FILE: &str = "gibbs_parameters.gtp";

/// Render the `.gtp` parameter file body.
pub fn parameter_file_contents(config: &GibbsReconConfig) -> String {
    format!(
        "<?xml version=\"1.0\" ?>\n\
         <global_tracking_parameter_file file_version=\"0.1\">\n\
         \x20   <parameter_set iterations=\"{}\" particle_length=\"{}\" particle_width=\"{}\" \
         particle_weight=\"{}\" temp_start=\"{}\" temp_end=\"{}\" inexbalance=\"{}\" \
         fiber_length=\"{}\" curvature_threshold=\"{}\" />\n\
         </global_tracking_parameter_file>",
        config.iterations,
        config.particle_length,
        config.particle_width,
        config.particle_weight,
        config.temp_start,
        config.temp_end,
        config.inexbalance,
        config.fiber_length,
        config.curvature_threshold
    )
}

pub struct GibbsRecon {
    pub config: GibbsReconConfig,
    pub sh_coefficients: ShConvention,
    pub out_file_name: String,
}

impl GibbsRecon {
    pub fn new(config: &GibbsReconConfig, out_file_name: &str) -> Self {
        Self {
            config: config.clone(),
            sh_coefficients: config.sh_coefficient_convention,
            out_file_name: out_file_name.to_string(),
        }
    }

    fn out_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.out_file_name)
    }
}

impl Interface for GibbsRecon {
    fn name(&self) -> &'static str {
        "mitkFiberTrackingMiniApps.sh"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file", "mask"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["out_file"]
    }

    fn prepare(&self, work_dir: &Path) -> Result<()> {
        std::fs::write(
            work_dir.join(PARAMETER_FILE),
            parameter_file_contents(&self.config),
        )?;
        Ok(())
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut args = vec![
            "GibbsTracking".to_string(),
            "-i".to_string(),
            in_file.display().to_string(),
            "-p".to_string(),
            work_dir.join(PARAMETER_FILE).display().to_string(),
        ];
        if let Some(mask) = inputs.get("mask").and_then(PortValue::as_path) {
            args.push("-m".to_string());
            args.push(mask.display().to_string());
        }
        args.push("-s".to_string());
        args.push(self.sh_coefficients.as_arg().to_string());
        args.push("-o".to_string());
        args.push(self.out_path(work_dir).display().to_string());
        Ok(Some(Invocation::new("mitkFiberTrackingMiniApps.sh", args)))
    }

    fn outputs(&self, _inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let mut map = PortMap::new();
        map.insert(
            "out_file".to_string(),
            PortValue::Path(self.out_path(work_dir)),
        );
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_file_carries_all_settings() {
        let config = GibbsReconConfig::default();
        let contents = parameter_file_contents(&config);
        assert!(contents.starts_with("<?xml version=\"1.0\" ?>"));
        assert!(contents.contains("iterations=\"100000000\""));
        assert!(contents.contains("particle_length=\"1.5\""));
        assert!(contents.contains("particle_weight=\"0.0003\""));
        assert!(contents.contains("temp_start=\"0.1\""));
        assert!(contents.contains("temp_end=\"0.001\""));
        assert!(contents.contains("inexbalance=\"-2\""));
        assert!(contents.contains("fiber_length=\"20\""));
        assert!(contents.contains("curvature_threshold=\"90\""));
    }

    #[test]
    fn test_parameter_file_written_on_prepare() {
        let tmp = tempfile::tempdir().unwrap();
        let recon = GibbsRecon::new(&GibbsReconConfig::default(), "global_tractography.fib");
        recon.prepare(tmp.path()).unwrap();
        let written = std::fs::read_to_string(tmp.path().join(PARAMETER_FILE)).unwrap();
        assert!(written.contains("<global_tracking_parameter_file"));
    }

    #[test]
    fn test_tracking_invocation_order() {
        let recon = GibbsRecon::new(&GibbsReconConfig::default(), "global_tractography.fib");
        let mut inputs = PortMap::new();
        inputs.insert("in_file".to_string(), PortValue::path("/data/dwi.nii"));
        inputs.insert("mask".to_string(), PortValue::path("/data/wm_mask.nii"));

        let inv = recon.plan(&inputs, Path::new("/work")).unwrap().unwrap();
        assert_eq!(inv.program, "mitkFiberTrackingMiniApps.sh");
        assert_eq!(
            inv.args,
            vec![
                "GibbsTracking",
                "-i",
                "/data/dwi.nii",
                "-p",
                "/work/gibbs_parameters.gtp",
                "-m",
                "/data/wm_mask.nii",
                "-s",
                "FSL",
                "-o",
                "/work/global_tractography.fib"
            ]
        );
    }

    #[test]
    fn test_mask_omitted_when_absent() {
        let recon = GibbsRecon::new(&GibbsReconConfig::default(), "out.fib");
        let mut inputs = PortMap::new();
        inputs.insert("in_file".to_string(), PortValue::path("/data/dwi.nii"));
        let inv = recon.plan(&inputs, Path::new("/work")).unwrap().unwrap();
        assert!(!inv.args.contains(&"-m".to_string()));
    }

    #[test]
    fn test_mrtrix_convention_argument() {
        let config = GibbsReconConfig {
            sh_coefficient_convention: ShConvention::Mrtrix,
            ..Default::default()
        };
        let recon = GibbsRecon::new(&config, "out.fib");
        let mut inputs = PortMap::new();
        inputs.insert("in_file".to_string(), PortValue::path("/data/dwi.nii"));
        let inv = recon.plan(&inputs, Path::new("/work")).unwrap().unwrap();
        let pos = inv.args.iter().position(|a| a == "-s").unwrap();
        assert_eq!(inv.args[pos + 1], "MRtrix");
    }
}
