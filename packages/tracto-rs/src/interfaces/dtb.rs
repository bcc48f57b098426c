//! DTB scalar-map tools. Both commands address the ODF reconstruction by
//! its path/basename pair (e.g. `data/dsi_`), recovered here from the ODF
//! file produced by `odf_recon`.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::workflow::{input_path, Interface, Invocation, PortMap, PortValue};

/// Basepath of a reconstruction: the ODF file's directory joined with
/// `<prefix>_`.
pub fn dsi_basepath(odf_file: &Path, prefix: &str) -> PathBuf {
    odf_file
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("{}_", prefix))
}

/// Moment computed by `DTB_gfa`: 2 = gFA, 3 = skewness, 4 = kurtosis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfaMoment {
    Gfa = 2,
    Skewness = 3,
    Kurtosis = 4,
}

impl GfaMoment {
    pub fn output_suffix(&self) -> &'static str {
        match self {
            GfaMoment::Gfa => "gfa.nii",
            GfaMoment::Skewness => "skewness.nii",
            GfaMoment::Kurtosis => "kurtosis.nii",
        }
    }
}

/// `DTB_gfa --dsi <basepath> --m <moment>`
pub struct DtbGfa {
    pub prefix: String,
    pub moment: GfaMoment,
}

impl Interface for DtbGfa {
    fn name(&self) -> &'static str {
        "DTB_gfa"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["odf_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["out_file"]
    }

    fn plan(&self, inputs: &PortMap, _work_dir: &Path) -> Result<Option<Invocation>> {
        let odf = input_path(inputs, self.name(), "odf_file")?;
        let basepath = dsi_basepath(odf, &self.prefix);
        Ok(Some(Invocation::new(
            "DTB_gfa",
            [
                "--dsi".to_string(),
                basepath.display().to_string(),
                "--m".to_string(),
                (self.moment as u8).to_string(),
            ],
        )))
    }

    fn outputs(&self, inputs: &PortMap, _work_dir: &Path) -> Result<PortMap> {
        let odf = input_path(inputs, self.name(), "odf_file")?;
        let basepath = dsi_basepath(odf, &self.prefix);
        let out = PathBuf::from(format!(
            "{}{}",
            basepath.display(),
            self.moment.output_suffix()
        ));
        let mut map = PortMap::new();
        map.insert("out_file".to_string(), PortValue::Path(out));
        Ok(map)
    }
}

/// `DTB_P0 --dsi <basepath> --dwi <dwi_file>`
pub struct DtbP0 {
    pub prefix: String,
}

impl Interface for DtbP0 {
    fn name(&self) -> &'static str {
        "DTB_P0"
    }

    fn input_ports(&self) -> &[&'static str] {
        &["odf_file", "dwi_file"]
    }

    fn output_ports(&self) -> &[&'static str] {
        &["out_file"]
    }

    fn plan(&self, inputs: &PortMap, _work_dir: &Path) -> Result<Option<Invocation>> {
        let odf = input_path(inputs, self.name(), "odf_file")?;
        let dwi = input_path(inputs, self.name(), "dwi_file")?;
        let basepath = dsi_basepath(odf, &self.prefix);
        Ok(Some(Invocation::new(
            "DTB_P0",
            [
                "--dsi".to_string(),
                basepath.display().to_string(),
                "--dwi".to_string(),
                dwi.display().to_string(),
            ],
        )))
    }

    fn outputs(&self, inputs: &PortMap, _work_dir: &Path) -> Result<PortMap> {
        let odf = input_path(inputs, self.name(), "odf_file")?;
        let basepath = dsi_basepath(odf, &self.prefix);
        let out = PathBuf::from(format!("{}P0.nii", basepath.display()));
        let mut map = PortMap::new();
        map.insert("out_file".to_string(), PortValue::Path(out));
        Ok(map)
    }
}
