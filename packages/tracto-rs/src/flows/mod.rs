//! Reconstruction flow builders, one per backend. Each builder declares
//! the nodes for its external-tool chain, wires named ports, and
//! includes or skips sub-graphs based on the configuration.

mod camino;
mod dtk;
mod gibbs;
mod mrtrix;

pub use camino::create_camino_recon_flow;
pub use dtk::create_dtk_recon_flow;
pub use gibbs::create_gibbs_recon_flow;
pub use mrtrix::create_mrtrix_recon_flow;

use std::path::Path;

use crate::config::ReconConfig;
use crate::error::Result;
use crate::workflow::{PortValue, Workflow};

/// Name shared by all reconstruction flows
pub const FLOW_NAME: &str = "reconstruction";

/// Build the flow for any backend configuration.
pub fn create_recon_flow(config: &ReconConfig) -> Result<Workflow> {
    config.validate()?;
    match config {
        ReconConfig::Dtk(c) => create_dtk_recon_flow(c),
        ReconConfig::Mrtrix(c) => create_mrtrix_recon_flow(c),
        ReconConfig::Camino(c) => create_camino_recon_flow(c),
        ReconConfig::Gibbs(c) => create_gibbs_recon_flow(c),
    }
}

/// Paths fed into a reconstruction flow's input node.
#[derive(Debug, Clone, Default)]
pub struct ReconInputs<'a> {
    pub diffusion: Option<&'a Path>,
    pub diffusion_resampled: Option<&'a Path>,
    pub wm_mask_resampled: Option<&'a Path>,
}

impl ReconInputs<'_> {
    /// Preset every provided input on the flow's `inputnode`, skipping
    /// ports the flow does not declare.
    pub fn apply(&self, flow: &mut Workflow) -> Result<()> {
        for (port, value) in [
            ("diffusion", self.diffusion),
            ("diffusion_resampled", self.diffusion_resampled),
            ("wm_mask_resampled", self.wm_mask_resampled),
        ] {
            if let Some(path) = value {
                match flow.set_input("inputnode", port, PortValue::path(path)) {
                    Ok(()) => {}
                    Err(crate::error::TractoError::UnknownPort { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }
}
