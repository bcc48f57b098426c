//! Camino tool wrappers. The Camino utilities are stream filters: they
//! read voxel data on stdin (or via `-inputfile`) and write their result
//! to stdout, so these invocations carry explicit redirections.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::workflow::{derived_name, input_path, Interface, Invocation, PortMap, PortValue};

/// `image2voxel -4dimage <in> -outputdatatype float > <stem>.Bfloat`
pub struct Image2Voxel;

impl Interface for Image2Voxel {
    fn name(&self) -> &'static str {
        "image2voxel"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["voxel_order"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, ".Bfloat"));
        Ok(Some(
            Invocation::new(
                "image2voxel",
                [
                    "-4dimage".to_string(),
                    in_file.display().to_string(),
                    "-outputdatatype".to_string(),
                    "float".to_string(),
                ],
            )
            .stdout_to(out),
        ))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "voxel_order".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, ".Bfloat"))),
        );
        Ok(map)
    }
}

/// `modelfit -model <model> -inputfile <in> -schemefile <scheme> -bgmask <mask> > <stem>_fit.Bdouble`
pub struct ModelFit {
    pub model: String,
    pub scheme_file: PathBuf,
}

impl Interface for ModelFit {
    fn name(&self) -> &'static str {
        "modelfit"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file", "bgmask"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["fitted_data"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, "_fit.Bdouble"));
        let mut args = vec![
            "-model".to_string(),
            self.model.clone(),
            "-inputfile".to_string(),
            in_file.display().to_string(),
            "-schemefile".to_string(),
            self.scheme_file.display().to_string(),
        ];
        if let Some(mask) = inputs.get("bgmask").and_then(PortValue::as_path) {
            args.push("-bgmask".to_string());
            args.push(mask.display().to_string());
        }
        Ok(Some(Invocation::new("modelfit", args).stdout_to(out)))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "fitted_data".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_fit.Bdouble"))),
        );
        Ok(map)
    }
}

/// `fa -inputmodel <model> < <in> > <stem>_FA.Bdouble`
pub struct ComputeFa {
    pub inputmodel: String,
}

impl Interface for ComputeFa {
    fn name(&self) -> &'static str {
        "fa"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["fa"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, "_FA.Bdouble"));
        Ok(Some(
            Invocation::new("fa", ["-inputmodel".to_string(), self.inputmodel.clone()])
                .stdin_from(in_file)
                .stdout_to(out),
        ))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "fa".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_FA.Bdouble"))),
        );
        Ok(map)
    }
}

/// `md -inputmodel <model> < <in> > <stem>_MD.Bdouble`
pub struct ComputeMd {
    pub inputmodel: String,
}

impl Interface for ComputeMd {
    fn name(&self) -> &'static str {
        "md"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["md"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, "_MD.Bdouble"));
        Ok(Some(
            Invocation::new("md", ["-inputmodel".to_string(), self.inputmodel.clone()])
                .stdin_from(in_file)
                .stdout_to(out),
        ))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "md".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_MD.Bdouble"))),
        );
        Ok(map)
    }
}

/// `dteig -inputmodel <model> -maxcomponents <n> < <in> > <stem>_eig.Bdouble`
pub struct ComputeEigensystem {
    pub inputmodel: String,
    pub maxcomponents: u32,
}

impl Interface for ComputeEigensystem {
    fn name(&self) -> &'static str {
        "dteig"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["in_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["eigen"]
    }

    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let out = work_dir.join(derived_name(in_file, "_eig.Bdouble"));
        Ok(Some(
            Invocation::new(
                "dteig",
                [
                    "-inputmodel".to_string(),
                    self.inputmodel.clone(),
                    "-maxcomponents".to_string(),
                    self.maxcomponents.to_string(),
                ],
            )
            .stdin_from(in_file)
            .stdout_to(out),
        ))
    }

    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
        let in_file = input_path(inputs, self.name(), "in_file")?;
        let mut map = PortMap::new();
        map.insert(
            "eigen".to_string(),
            PortValue::Path(work_dir.join(derived_name(in_file, "_eig.Bdouble"))),
        );
        Ok(map)
    }
}
