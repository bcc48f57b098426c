//! Diffusion Toolkit wrappers: `dti_recon`, `odf_recon`, `hardi_mat`.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::workflow::{input_path, Interface, Invocation, PortMap, PortValue};

/// `dti_recon <DWI> <out_prefix> -gm ... -b ... -nex ... -b0 ... [-mb] [-oc] -ot nii`
pub struct DtiRecon {
    pub out_prefix: String,
    pub gradient_matrix: PathBuf,
    pub b_value: u32,
    pub multiple_b_values: bool,
    pub n_averages: u32,
    pub number_of_b0: u32,
    pub oblique_correction: bool,
}

impl DtiRecon {
    fn prefixed(&self, work_dir: &Path, suffix: &str) -> PathBuf {
        work_dir.join(format!("{}_{}.nii", self.out_prefix, suffix))
    }
}

impl Interface for DtiRecon {
    fn name(&self) -> &'static str {
        "dti_recon"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["DWI"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["DWI", "B0", "V1", "FA", "ADC", "tensor"]
    }

    fn plan(&self, inputs: &PortMap, _work_dir: &Path) -> Result<Option<Invocation>> {
        let dwi = input_path(inputs, self.name(), "DWI")?;
        let mut args = vec![
            dwi.display().to_string(),
            self.out_prefix.clone(),
            "-gm".to_string(),
            self.gradient_matrix.display().to_string(),
            "-b".to_string(),
            self.b_value.to_string(),
            "-nex".to_string(),
            self.n_averages.to_string(),
            "-b0".to_string(),
            self.number_of_b0.to_string(),
        ];
        if self.multiple_b_values {
            args.push("-mb".to_string());
        }
        if self.oblique_correction {
            args.push("-oc".to_string());
        }
        args.push("-ot".to_string());
        args.push("nii".to_string());
        Ok(Some(Invocation::new("dti_recon", args)))
    }

    fn outputs(&self, _inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let mut map = PortMap::new();
        map.insert("DWI".to_string(), PortValue::Path(self.prefixed(work_dir, "dwi")));
        map.insert("B0".to_string(), PortValue::Path(self.prefixed(work_dir, "b0")));
        map.insert("V1".to_string(), PortValue::Path(self.prefixed(work_dir, "v1")));
        map.insert("FA".to_string(), PortValue::Path(self.prefixed(work_dir, "fa")));
        map.insert("ADC".to_string(), PortValue::Path(self.prefixed(work_dir, "adc")));
        map.insert(
            "tensor".to_string(),
            PortValue::Path(self.prefixed(work_dir, "tensor")),
        );
        Ok(map)
    }
}

/// `odf_recon <DWI> <n_directions> <n_output_directions> <out_prefix> -b0 ... [-mat ...] [-dsi] -ot nii`
///
/// The reconstruction matrix arrives on the `matrix` input port: preset
/// for DSI (packaged matrix), wired from `hardi_mat` for HARDI.
pub struct OdfRecon {
    pub out_prefix: String,
    pub n_directions: u32,
    pub n_output_directions: u32,
    pub n_b0: u32,
    pub dsi: bool,
}

impl OdfRecon {
    fn prefixed(&self, work_dir: &Path, suffix: &str) -> PathBuf {
        work_dir.join(format!("{}_{}.nii", self.out_prefix, suffix))
    }
}

impl Interface for OdfRecon {
    fn name(&self) -> &'static str {
        "odf_recon"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["DWI", "matrix"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["DWI", "B0", "ODF", "max"]
    }

    fn plan(&self, inputs: &PortMap, _work_dir: &Path) -> Result<Option<Invocation>> {
        let dwi = input_path(inputs, self.name(), "DWI")?;
        let mut args = vec![
            dwi.display().to_string(),
            self.n_directions.to_string(),
            self.n_output_directions.to_string(),
            self.out_prefix.clone(),
            "-b0".to_string(),
            self.n_b0.to_string(),
        ];
        if let Some(matrix) = inputs.get("matrix").and_then(PortValue::as_path) {
            args.push("-mat".to_string());
            args.push(matrix.display().to_string());
        }
        if self.dsi {
            args.push("-dsi".to_string());
        }
        args.push("-ot".to_string());
        args.push("nii".to_string());
        Ok(Some(Invocation::new("odf_recon", args)))
    }

    fn outputs(&self, _inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let mut map = PortMap::new();
        map.insert("DWI".to_string(), PortValue::Path(self.prefixed(work_dir, "dwi")));
        map.insert("B0".to_string(), PortValue::Path(self.prefixed(work_dir, "b0")));
        map.insert("ODF".to_string(), PortValue::Path(self.prefixed(work_dir, "odf")));
        map.insert("max".to_string(), PortValue::Path(self.prefixed(work_dir, "max")));
        Ok(map)
    }
}

/// `hardi_mat <gradient_table> <out_file> -ref <reference> [-oc]`
pub struct HardiMat {
    pub gradient_table: PathBuf,
    pub oblique_correction: bool,
}

const HARDI_MAT_OUT: &str = "recon_mat.dat";

impl Interface for HardiMat {
    fn name(&self) -> &'static str {
        "hardi_mat"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["reference_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["out_file"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let reference = input_path(inputs, self.name(), "reference_file")?;
        let mut args = vec![
            self.gradient_table.display().to_string(),
            work_dir.join(HARDI_MAT_OUT).display().to_string(),
            "-ref".to_string(),
            reference.display().to_string(),
        ];
        if self.oblique_correction {
            args.push("-oc".to_string());
        }
        Ok(Some(Invocation::new("hardi_mat", args)))
    }

    fn outputs(&self, _inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let mut map = PortMap::new();
        map.insert(
            "out_file".to_string(),
            PortValue::Path(work_dir.join(HARDI_MAT_OUT)),
        );
        Ok(map)
    }
}
