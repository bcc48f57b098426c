//! Gibbs global tracking flow: a single tracking node fed by the
//! resampled diffusion image and the white-matter mask.

use crate::config::GibbsReconConfig;
use crate::error::Result;
use crate::interfaces::gibbs::GibbsRecon;
use crate::workflow::{IdentityInterface, Workflow};

use super::FLOW_NAME;

pub const TRACTOGRAPHY_FILE: &str = "global_tractography.fib";

pub fn create_gibbs_recon_flow(config: &GibbsReconConfig) -> Result<Workflow> {
    let mut flow = Workflow::new(FLOW_NAME);

    flow.add_node(
        "inputnode",
        IdentityInterface::new(&["diffusion_resampled", "wm_mask_resampled"]),
    )?;
    flow.add_node("outputnode", IdentityInterface::new(&["DWI"]))?;

    flow.add_node("gibbs_recon", GibbsRecon::new(config, TRACTOGRAPHY_FILE))?;

    flow.connect("inputnode", "diffusion_resampled", "gibbs_recon", "in_file")?;
    flow.connect("inputnode", "wm_mask_resampled", "gibbs_recon", "mask")?;
    flow.connect("gibbs_recon", "out_file", "outputnode", "DWI")?;

    Ok(flow)
}
