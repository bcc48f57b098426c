//! External tool registry and discovery.
//!
//! Every reconstruction step shells out to a pre-built executable from one
//! of the supported toolchains. Resolution order per tool: the backend's
//! directory environment variable, then $PATH.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, TractoError};

/// Environment variable naming the directory with the DTK reconstruction
/// matrices (`DSI_matrix_*.dat`)
pub const DSI_MATRIX_DIR_ENV: &str = "DSI_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    Dtk,
    Mrtrix,
    Camino,
    Dtb,
    Mitk,
}

impl Toolchain {
    /// Directory environment variable consulted before $PATH
    pub fn env_var(&self) -> &'static str {
        match self {
            Toolchain::Dtk => "DTK_PATH",
            Toolchain::Mrtrix => "MRTRIX_PATH",
            Toolchain::Camino => "CAMINO_PATH",
            Toolchain::Dtb => "DTB_PATH",
            Toolchain::Mitk => "MITK_PATH",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Toolchain::Dtk => "Diffusion Toolkit",
            Toolchain::Mrtrix => "MRtrix",
            Toolchain::Camino => "Camino",
            Toolchain::Dtb => "DTB",
            Toolchain::Mitk => "MITK Diffusion",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub toolchain: Toolchain,
}

/// Every executable the four reconstruction flows may invoke
pub const TOOL_REGISTRY: &[ToolSpec] = &[
    ToolSpec { name: "dti_recon", toolchain: Toolchain::Dtk },
    ToolSpec { name: "odf_recon", toolchain: Toolchain::Dtk },
    ToolSpec { name: "hardi_mat", toolchain: Toolchain::Dtk },
    ToolSpec { name: "dwi2tensor", toolchain: Toolchain::Mrtrix },
    ToolSpec { name: "tensor2FA", toolchain: Toolchain::Mrtrix },
    ToolSpec { name: "tensor2vector", toolchain: Toolchain::Mrtrix },
    ToolSpec { name: "erode", toolchain: Toolchain::Mrtrix },
    ToolSpec { name: "mrmult", toolchain: Toolchain::Mrtrix },
    ToolSpec { name: "threshold", toolchain: Toolchain::Mrtrix },
    ToolSpec { name: "estimate_response", toolchain: Toolchain::Mrtrix },
    ToolSpec { name: "csdeconv", toolchain: Toolchain::Mrtrix },
    ToolSpec { name: "image2voxel", toolchain: Toolchain::Camino },
    ToolSpec { name: "modelfit", toolchain: Toolchain::Camino },
    ToolSpec { name: "fa", toolchain: Toolchain::Camino },
    ToolSpec { name: "md", toolchain: Toolchain::Camino },
    ToolSpec { name: "dteig", toolchain: Toolchain::Camino },
    ToolSpec { name: "DTB_gfa", toolchain: Toolchain::Dtb },
    ToolSpec { name: "DTB_P0", toolchain: Toolchain::Dtb },
    ToolSpec { name: "mitkFiberTrackingMiniApps.sh", toolchain: Toolchain::Mitk },
];

impl ToolSpec {
    pub fn from_name(name: &str) -> Option<&'static ToolSpec> {
        TOOL_REGISTRY.iter().find(|t| t.name == name)
    }
}

fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

/// Scan $PATH for an executable by name.
pub fn which(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Locate a registered tool.
///
/// Checks the owning toolchain's directory variable first, then $PATH.
/// Unregistered names fall back to a plain $PATH lookup.
pub fn find_tool(name: &str) -> Option<PathBuf> {
    if let Some(spec) = ToolSpec::from_name(name) {
        if let Ok(dir) = std::env::var(spec.toolchain.env_var()) {
            let candidate = PathBuf::from(dir).join(name);
            if is_executable_file(&candidate) {
                return Some(candidate);
            }
        }
    }
    which(name)
}

/// Locate a tool or fail with a resolution error.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    find_tool(name).ok_or_else(|| TractoError::ToolNotFound(name.to_string()))
}

/// Program path used for an invocation: the discovered absolute path when
/// available, otherwise the bare name (letting the OS search $PATH at
/// spawn time).
pub fn resolve_program(name: &str) -> PathBuf {
    find_tool(name).unwrap_or_else(|| PathBuf::from(name))
}

/// Directory with the DTK DSI reconstruction matrices.
pub fn dsi_matrix_dir() -> Result<PathBuf> {
    std::env::var(DSI_MATRIX_DIR_ENV)
        .map(PathBuf::from)
        .map_err(|_| TractoError::EnvVarNotSet(DSI_MATRIX_DIR_ENV))
}

/// Discovery status of every tool in a toolchain, for diagnostics.
pub fn toolchain_status(toolchain: Toolchain) -> Vec<(&'static str, Option<PathBuf>)> {
    TOOL_REGISTRY
        .iter()
        .filter(|t| t.toolchain == toolchain)
        .map(|t| (t.name, find_tool(t.name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_all_toolchains() {
        for toolchain in [
            Toolchain::Dtk,
            Toolchain::Mrtrix,
            Toolchain::Camino,
            Toolchain::Dtb,
            Toolchain::Mitk,
        ] {
            assert!(
                TOOL_REGISTRY.iter().any(|t| t.toolchain == toolchain),
                "no tools registered for {:?}",
                toolchain
            );
        }
    }

    #[test]
    fn test_tool_lookup() {
        assert!(ToolSpec::from_name("odf_recon").is_some());
        assert!(ToolSpec::from_name("dtifit").is_none());
    }

    #[test]
    fn test_resolve_program_falls_back_to_name() {
        // Unregistered, certainly not on PATH
        let program = resolve_program("no_such_tool_for_sure");
        assert_eq!(program, PathBuf::from("no_such_tool_for_sure"));
    }

    #[test]
    fn test_require_missing_tool_errors() {
        let err = require_tool("no_such_tool_for_sure").unwrap_err();
        assert!(err.to_string().contains("no_such_tool_for_sure"));
    }

    #[test]
    fn test_toolchain_status_lists_backend_tools() {
        let status = toolchain_status(Toolchain::Camino);
        let names: Vec<&str> = status.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["image2voxel", "modelfit", "fa", "md", "dteig"]);
    }
}
