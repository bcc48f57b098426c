//! MRtrix reconstruction flow: tensor fit with FA and eigenvector maps,
//! optionally followed by constrained spherical deconvolution over a
//! single-fiber response estimated inside an eroded, FA-thresholded
//! white-matter mask.

use crate::config::MrtrixReconConfig;
use crate::error::Result;
use crate::interfaces::mrtrix::{
    CsDeconv, Dwi2Tensor, Erode, EstimateResponse, MrMult, Tensor2Fa, Tensor2Vector, Threshold,
};
use crate::workflow::{IdentityInterface, PortValue, Workflow};

use super::FLOW_NAME;

pub fn create_mrtrix_recon_flow(config: &MrtrixReconConfig) -> Result<Workflow> {
    let mut flow = Workflow::new(FLOW_NAME);
    let local_model = config.effective_local_model();
    let gradient_table = config.gradient.resolve()?;

    flow.add_node(
        "inputnode",
        IdentityInterface::new(&["diffusion", "diffusion_resampled", "wm_mask_resampled"]),
    )?;
    flow.add_node(
        "outputnode",
        IdentityInterface::new(&["DWI", "FA", "eigVec", "RF", "SD", "grad"]),
    )?;
    flow.set_input("outputnode", "SD", PortValue::Flag(local_model))?;

    // Tensor
    flow.add_node(
        "mrtrix_make_tensor",
        Dwi2Tensor {
            encoding_file: gradient_table.clone(),
        },
    )?;
    flow.connect(
        "inputnode",
        "diffusion_resampled",
        "mrtrix_make_tensor",
        "in_file",
    )?;

    // Tensor -> FA map
    flow.add_node("mrtrix_FA", Tensor2Fa)?;
    flow.connect("mrtrix_make_tensor", "tensor", "mrtrix_FA", "in_file")?;
    flow.connect("mrtrix_FA", "FA", "outputnode", "FA")?;

    // Tensor -> eigenvectors
    flow.add_node("mrtrix_eigenvectors", Tensor2Vector)?;
    flow.connect(
        "mrtrix_make_tensor",
        "tensor",
        "mrtrix_eigenvectors",
        "in_file",
    )?;
    flow.connect("mrtrix_eigenvectors", "vector", "outputnode", "eigVec")?;

    if local_model {
        // Single-fiber voxel mask
        flow.add_node("mrtrix_erode", Erode { number_of_passes: 3 })?;
        flow.add_node(
            "mrtrix_mul_eroded_FA",
            MrMult {
                out_filename: Some("diffusion_resampled_tensor_FA_masked.mif".to_string()),
            },
        )?;
        flow.add_node(
            "mrtrix_thr",
            Threshold {
                absolute_threshold_value: config.single_fib_thr,
            },
        )?;
        flow.connect("inputnode", "wm_mask_resampled", "mrtrix_erode", "in_file")?;
        flow.connect("mrtrix_erode", "out_file", "mrtrix_mul_eroded_FA", "input2")?;
        flow.connect("mrtrix_FA", "FA", "mrtrix_mul_eroded_FA", "input1")?;
        flow.connect("mrtrix_mul_eroded_FA", "out_file", "mrtrix_thr", "in_file")?;

        // Single-fiber response function
        flow.add_node(
            "mrtrix_rf",
            EstimateResponse {
                encoding_file: gradient_table.clone(),
                maximum_harmonic_order: config.lmax_order,
                normalise: config.normalize_to_b0,
            },
        )?;
        flow.connect("inputnode", "diffusion_resampled", "mrtrix_rf", "in_file")?;
        flow.connect("mrtrix_thr", "out_file", "mrtrix_rf", "mask_image")?;

        // Spherical deconvolution
        flow.add_node(
            "mrtrix_CSD",
            CsDeconv {
                encoding_file: gradient_table,
                maximum_harmonic_order: config.lmax_order,
                normalise: config.normalize_to_b0,
            },
        )?;
        flow.connect("inputnode", "diffusion_resampled", "mrtrix_CSD", "in_file")?;
        flow.connect("mrtrix_rf", "response", "mrtrix_CSD", "response_file")?;
        flow.connect("mrtrix_rf", "response", "outputnode", "RF")?;
        flow.connect("inputnode", "wm_mask_resampled", "mrtrix_CSD", "mask_image")?;
        flow.connect(
            "mrtrix_CSD",
            "spherical_harmonics_image",
            "outputnode",
            "DWI",
        )?;
    } else {
        flow.connect("inputnode", "diffusion_resampled", "outputnode", "DWI")?;
    }

    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingMode;

    #[test]
    fn test_tensor_only_topology() {
        let flow = create_mrtrix_recon_flow(&MrtrixReconConfig::default()).unwrap();
        assert!(flow.has_node("mrtrix_make_tensor"));
        assert!(flow.has_node("mrtrix_FA"));
        assert!(flow.has_node("mrtrix_eigenvectors"));
        for node in [
            "mrtrix_erode",
            "mrtrix_mul_eroded_FA",
            "mrtrix_thr",
            "mrtrix_rf",
            "mrtrix_CSD",
        ] {
            assert!(!flow.has_node(node), "{} should not be built", node);
        }
        // Resampled diffusion passes straight through
        assert!(flow.is_connected("inputnode", "diffusion_resampled", "outputnode", "DWI"));
    }

    #[test]
    fn test_csd_topology() {
        let config = MrtrixReconConfig {
            local_model: true,
            ..Default::default()
        };
        let flow = create_mrtrix_recon_flow(&config).unwrap();
        for node in [
            "mrtrix_erode",
            "mrtrix_mul_eroded_FA",
            "mrtrix_thr",
            "mrtrix_rf",
            "mrtrix_CSD",
        ] {
            assert!(flow.has_node(node), "{} missing", node);
        }
        assert!(flow.is_connected("mrtrix_FA", "FA", "mrtrix_mul_eroded_FA", "input1"));
        assert!(flow.is_connected("mrtrix_erode", "out_file", "mrtrix_mul_eroded_FA", "input2"));
        assert!(flow.is_connected("mrtrix_thr", "out_file", "mrtrix_rf", "mask_image"));
        assert!(flow.is_connected("mrtrix_rf", "response", "mrtrix_CSD", "response_file"));
        assert!(flow.is_connected("mrtrix_rf", "response", "outputnode", "RF"));
        assert!(flow.is_connected(
            "mrtrix_CSD",
            "spherical_harmonics_image",
            "outputnode",
            "DWI"
        ));
        assert!(!flow.is_connected("inputnode", "diffusion_resampled", "outputnode", "DWI"));
    }

    #[test]
    fn test_probabilistic_mode_builds_csd() {
        let config = MrtrixReconConfig {
            local_model: false,
            recon_mode: TrackingMode::Probabilistic,
            ..Default::default()
        };
        let flow = create_mrtrix_recon_flow(&config).unwrap();
        assert!(flow.has_node("mrtrix_CSD"));
    }

    #[test]
    fn test_fa_and_eigenvectors_always_published() {
        for local_model in [false, true] {
            let config = MrtrixReconConfig {
                local_model,
                ..Default::default()
            };
            let flow = create_mrtrix_recon_flow(&config).unwrap();
            assert!(flow.is_connected("mrtrix_FA", "FA", "outputnode", "FA"));
            assert!(flow.is_connected("mrtrix_eigenvectors", "vector", "outputnode", "eigVec"));
        }
    }
}
