//! Camino reconstruction flow: voxel-order conversion, model fit, and the
//! FA / MD / eigensystem scalar maps.

use crate::config::CaminoReconConfig;
use crate::error::Result;
use crate::interfaces::camino::{ComputeEigensystem, ComputeFa, ComputeMd, Image2Voxel, ModelFit};
use crate::workflow::{IdentityInterface, Workflow};

use super::FLOW_NAME;

pub fn create_camino_recon_flow(config: &CaminoReconConfig) -> Result<Workflow> {
    let mut flow = Workflow::new(FLOW_NAME);
    let inputmodel = config.number_of_tensors.inputmodel();

    flow.add_node(
        "inputnode",
        IdentityInterface::new(&["diffusion", "diffusion_resampled", "wm_mask_resampled"]),
    )?;
    flow.add_node(
        "outputnode",
        IdentityInterface::new(&["DWI", "FA", "MD", "eigVec", "RF", "SD", "grad"]),
    )?;

    // Convert diffusion data to camino voxel order
    flow.add_node("camino_convert", Image2Voxel)?;
    flow.connect(
        "inputnode",
        "diffusion_resampled",
        "camino_convert",
        "in_file",
    )?;

    // Fit the configured model
    flow.add_node(
        "camino_ModelFit",
        ModelFit {
            model: config.local_model.clone(),
            scheme_file: config.gradient.resolve()?,
        },
    )?;
    flow.connect("camino_convert", "voxel_order", "camino_ModelFit", "in_file")?;
    flow.connect(
        "inputnode",
        "wm_mask_resampled",
        "camino_ModelFit",
        "bgmask",
    )?;
    flow.connect("camino_ModelFit", "fitted_data", "outputnode", "DWI")?;

    // FA map
    flow.add_node(
        "camino_FA",
        ComputeFa {
            inputmodel: inputmodel.to_string(),
        },
    )?;
    flow.connect("camino_ModelFit", "fitted_data", "camino_FA", "in_file")?;
    flow.connect("camino_FA", "fa", "outputnode", "FA")?;

    // MD map
    flow.add_node(
        "camino_MD",
        ComputeMd {
            inputmodel: inputmodel.to_string(),
        },
    )?;
    flow.connect("camino_ModelFit", "fitted_data", "camino_MD", "in_file")?;
    flow.connect("camino_MD", "md", "outputnode", "MD")?;

    // Eigensystem
    flow.add_node(
        "camino_eigenvectors",
        ComputeEigensystem {
            inputmodel: config.number_of_tensors.eigen_inputmodel().to_string(),
            maxcomponents: config.max_components,
        },
    )?;
    flow.connect(
        "camino_ModelFit",
        "fitted_data",
        "camino_eigenvectors",
        "in_file",
    )?;
    flow.connect("camino_eigenvectors", "eigen", "outputnode", "eigVec")?;

    Ok(flow)
}
