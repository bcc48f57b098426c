//! Diffusion Toolkit reconstruction flow: ODF reconstruction for DSI and
//! HARDI acquisitions, tensor reconstruction for DTI, plus the optional
//! DTB scalar maps derived from the ODF.

use crate::config::{AdditionalMap, DtkReconConfig, ImagingModel};
use crate::error::Result;
use crate::interfaces::dtb::{DtbGfa, DtbP0, GfaMoment};
use crate::interfaces::dtk::{DtiRecon, HardiMat, OdfRecon};
use crate::tools;
use crate::workflow::{IdentityInterface, PortValue, Workflow};

use super::FLOW_NAME;

pub fn create_dtk_recon_flow(config: &DtkReconConfig) -> Result<Workflow> {
    let mut flow = Workflow::new(FLOW_NAME);

    flow.add_node(
        "inputnode",
        IdentityInterface::new(&["diffusion", "diffusion_resampled"]),
    )?;
    flow.add_node(
        "outputnode",
        IdentityInterface::new(&[
            "DWI", "B0", "ODF", "gFA", "skewness", "kurtosis", "P0", "max", "V1",
        ]),
    )?;

    let prefix = match config.imaging_model {
        ImagingModel::Dsi => "dsi",
        ImagingModel::Hardi => "hardi",
        ImagingModel::Dti => "dti",
    };

    match config.imaging_model {
        ImagingModel::Dsi => {
            flow.add_node(
                "dtk_odfrecon",
                OdfRecon {
                    out_prefix: prefix.to_string(),
                    n_directions: config.dsi_number_of_directions + 1,
                    n_output_directions: config.number_of_output_directions,
                    n_b0: config.number_of_b0_volumes,
                    dsi: true,
                },
            )?;
            let matrix = tools::dsi_matrix_dir()?.join(config.recon_matrix_file());
            flow.set_input("dtk_odfrecon", "matrix", PortValue::Path(matrix))?;

            flow.connect("inputnode", "diffusion_resampled", "dtk_odfrecon", "DWI")?;
            flow.connect("dtk_odfrecon", "DWI", "outputnode", "DWI")?;
            flow.connect("dtk_odfrecon", "B0", "outputnode", "B0")?;
            flow.connect("dtk_odfrecon", "ODF", "outputnode", "ODF")?;
            flow.connect("dtk_odfrecon", "max", "outputnode", "max")?;
        }
        ImagingModel::Hardi => {
            flow.add_node(
                "dtk_hardimat",
                HardiMat {
                    gradient_table: config.gradient.resolve()?,
                    oblique_correction: config.apply_gradient_orientation_correction,
                },
            )?;
            flow.add_node(
                "dtk_odfrecon",
                OdfRecon {
                    out_prefix: prefix.to_string(),
                    n_directions: config.effective_directions() + 1,
                    n_output_directions: config.number_of_output_directions,
                    n_b0: config.number_of_b0_volumes,
                    dsi: false,
                },
            )?;

            flow.connect(
                "inputnode",
                "diffusion_resampled",
                "dtk_hardimat",
                "reference_file",
            )?;
            flow.connect("dtk_hardimat", "out_file", "dtk_odfrecon", "matrix")?;
            flow.connect("inputnode", "diffusion_resampled", "dtk_odfrecon", "DWI")?;
            flow.connect("dtk_odfrecon", "DWI", "outputnode", "DWI")?;
            flow.connect("dtk_odfrecon", "B0", "outputnode", "B0")?;
            flow.connect("dtk_odfrecon", "ODF", "outputnode", "ODF")?;
            flow.connect("dtk_odfrecon", "max", "outputnode", "max")?;
        }
        ImagingModel::Dti => {
            flow.add_node(
                "dtk_dtirecon",
                DtiRecon {
                    out_prefix: prefix.to_string(),
                    gradient_matrix: config.gradient.resolve()?,
                    b_value: config.maximum_b_value,
                    multiple_b_values: config.multiple_high_b_values,
                    n_averages: config.number_of_averages,
                    number_of_b0: config.number_of_b0_volumes,
                    oblique_correction: config.apply_gradient_orientation_correction,
                },
            )?;

            flow.connect("inputnode", "diffusion", "dtk_dtirecon", "DWI")?;
            flow.connect("dtk_dtirecon", "DWI", "outputnode", "DWI")?;
            flow.connect("dtk_dtirecon", "B0", "outputnode", "B0")?;
            flow.connect("dtk_dtirecon", "V1", "outputnode", "V1")?;
        }
    }

    // Scalar maps only exist for ODF reconstructions
    if config.imaging_model != ImagingModel::Dti {
        if config.wants_map(AdditionalMap::GFa) {
            flow.add_node(
                "dtb_gfa",
                DtbGfa {
                    prefix: prefix.to_string(),
                    moment: GfaMoment::Gfa,
                },
            )?;
            flow.connect("dtk_odfrecon", "ODF", "dtb_gfa", "odf_file")?;
            flow.connect("dtb_gfa", "out_file", "outputnode", "gFA")?;
        }
        if config.wants_map(AdditionalMap::Skewness) {
            flow.add_node(
                "dtb_skewness",
                DtbGfa {
                    prefix: prefix.to_string(),
                    moment: GfaMoment::Skewness,
                },
            )?;
            flow.connect("dtk_odfrecon", "ODF", "dtb_skewness", "odf_file")?;
            flow.connect("dtb_skewness", "out_file", "outputnode", "skewness")?;
        }
        if config.wants_map(AdditionalMap::Kurtosis) {
            flow.add_node(
                "dtb_kurtosis",
                DtbGfa {
                    prefix: prefix.to_string(),
                    moment: GfaMoment::Kurtosis,
                },
            )?;
            flow.connect("dtk_odfrecon", "ODF", "dtb_kurtosis", "odf_file")?;
            flow.connect("dtb_kurtosis", "out_file", "outputnode", "kurtosis")?;
        }
        if config.wants_map(AdditionalMap::P0) {
            flow.add_node(
                "dtb_P0",
                DtbP0 {
                    prefix: prefix.to_string(),
                },
            )?;
            flow.connect("inputnode", "diffusion", "dtb_P0", "dwi_file")?;
            flow.connect("dtk_odfrecon", "ODF", "dtb_P0", "odf_file")?;
            flow.connect("dtb_P0", "out_file", "outputnode", "P0")?;
        }
    }

    Ok(flow)
}
