//! MRtrix legacy tool wrappers. These commands take flagged options first
//! and end with `<in_file> [extra inputs] <out_file>`; generated output
//! names follow the `<input-stem>_<suffix>.mif` convention.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::workflow::{derived_name, input_path, Interface, Invocation, PortMap, PortValue};

/// `dwi2tensor -grad <encoding> <in> <out>`
pub struct Dwi2Tensor {
    pub encoding_file: PathBuf,
}

impl Interface for Dwi2Tensor {
    fn name(&self) -> &'static str {
        "dwi2tensor"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["tensor"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, "_tensor.mif"));
        Ok(Some(Invocation::new(
            "dwi2tensor",
            [
                "-grad".to_string(),
                self.encoding_file.display().to_string(),
                in_file.display().to_string(),
                out.display().to_string(),
            ],
        )))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "tensor".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_tensor.mif"))),
        );
        Ok(map)
    }
}

/// `tensor2FA <in> <out>`
pub struct Tensor2Fa;

impl Interface for Tensor2Fa {
    fn name(&self) -> &'static str {
        "tensor2FA"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["FA"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, "_FA.mif"));
        Ok(Some(Invocation::new(
            "tensor2FA",
            [in_file.display().to_string(), out.display().to_string()],
        )))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "FA".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_FA.mif"))),
        );
        Ok(map)
    }
}

/// `tensor2vector <in> <out>`
pub struct Tensor2Vector;

impl Interface for Tensor2Vector {
    fn name(&self) -> &'static str {
        "tensor2vector"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["vector"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, "_vector.mif"));
        Ok(Some(Invocation::new(
            "tensor2vector",
            [in_file.display().to_string(), out.display().to_string()],
        )))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "vector".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_vector.mif"))),
        );
        Ok(map)
    }
}

/// `erode -npass <n> <in> <out>`
pub struct Erode {
    pub number_of_passes: u32,
}

impl Interface for Erode {
    fn name(&self) -> &'static str {
        "erode"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["out_file"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, "_erode.mif"));
        Ok(Some(Invocation::new(
            "erode",
            [
                "-npass".to_string(),
                self.number_of_passes.to_string(),
                in_file.display().to_string(),
                out.display().to_string(),
            ],
        )))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "out_file".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_erode.mif"))),
        );
        Ok(map)
    }
}

/// `mrmult <input1> <input2> <out>` — voxelwise multiplication
pub struct MrMult {
    pub out_filename: Option<String>,
}

impl MrMult {
    fn out_name(&self, input1: &Path) -> String {
        self.out_filename
            .clone()
            .unwrap_or_else(|| derived_name(input1, "_masked.mif"))
    }
}

impl Interface for MrMult {
    fn name(&self) -> &'static str {
        "mrmult"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["input1", "input2"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["out_file"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let input1 = input_path(inputs, self.name(), "input1")?;
        let input2 = input_path(inputs, self.name(), "input2")?;
        let out = work_dir.join(self.out_name(input1));
        Ok(Some(Invocation::new(
            "mrmult",
            [
                input1.display().to_string(),
                input2.display().to_string(),
                out.display().to_string(),
            ],
        )))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let input1 = input_path(inputs, self.name(), "input1")?;
        let mut map = PortMap::new();
        map.insert(
            "out_file".to_string(),
            PortValue::Path(work_dir.join(self.out_name(input1))),
        );
        Ok(map)
    }
}

/// `threshold -abs <value> <in> <out>`
pub struct Threshold {
    pub absolute_threshold_value: f64,
}

impl Interface for Threshold {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["out_file"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, "_thr.mif"));
        Ok(Some(Invocation::new(
            "threshold",
            [
                "-abs".to_string(),
                self.absolute_threshold_value.to_string(),
                in_file.display().to_string(),
                out.display().to_string(),
            ],
        )))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "out_file".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_thr.mif"))),
        );
        Ok(map)
    }
}

/// `estimate_response -grad <encoding> [-lmax <n>] [-normalise] <in> <mask> <out>`
pub struct EstimateResponse {
    pub encoding_file: PathBuf,
    pub maximum_harmonic_order: Option<u32>,
    pub normalise: bool,
}

impl Interface for EstimateResponse {
    fn name(&self) -> &'static str {
        "estimate_response"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file", "mask_image"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["response"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mask = input_path(inputs, self.name(), "mask_image")?;
        let out = work_dir.join(derived_name(in_file, "_ER.mif"));
        let mut args = vec![
            "-grad".to_string(),
            self.encoding_file.display().to_string(),
        ];
        if let Some(lmax) = self.maximum_harmonic_order {
            args.push("-lmax".to_string());
            args.push(lmax.to_string());
        }
        if self.normalise {
            args.push("-normalise".to_string());
        }
        args.push(in_file.display().to_string());
        args.push(mask.display().to_string());
        args.push(out.display().to_string());
        Ok(Some(Invocation::new("estimate_response", args)))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "response".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_ER.mif"))),
        );
        Ok(map)
    }
}

/// `csdeconv -grad <encoding> -mask <mask> [-lmax <n>] [-normalise] <in> <response> <out>`
pub struct CsDeconv {
    pub encoding_file: PathBuf,
    pub maximum_harmonic_order: Option<u32>,
    pub normalise: bool,
}

impl Interface for CsDeconv {
    fn name(&self) -> &'static str {
        "csdeconv"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file", "response_file", "mask_image"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["spherical_harmonics_image"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let response = input_path(inputs, self.name(), "response_file")?;
        let mask = input_path(inputs, self.name(), "mask_image")?;
        let out = work_dir.join(derived_name(in_file, "_CSD.mif"));
        let mut args = vec![
            "-grad".to_string(),
            self.encoding_file.display().to_string(),
            "-mask".to_string(),
            mask.display().to_string(),
        ];
        if let Some(lmax) = self.maximum_harmonic_order {
            args.push("-lmax".to_string());
            args.push(lmax.to_string());
        }
        if self.normalise {
            args.push("-normalise".to_string());
        }
        args.push(in_file.display().to_string());
        args.push(response.display().to_string());
        args.push(out.display().to_string());
        Ok(Some(Invocation::new("csdeconv", args)))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "spherical_harmonics_image".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_CSD.mif"))),
        );
        Ok(map)
    }
}
