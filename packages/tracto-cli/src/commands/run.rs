use std::path::{Path, PathBuf};

use serde::Serialize;

use tracto_rs::config::ReconConfig;
use tracto_rs::flows::{create_recon_flow, ReconInputs};
use tracto_rs::workflow::PortMap;

use crate::cli::RunArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct RunSummary {
    id: String,
    backend: &'static str,
    created_at: String,
    work_dir: PathBuf,
    outputs: PortMap,
}

fn check_input(label: &str, path: &Option<PathBuf>) -> Result<(), String> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(format!("{} file not found: {}", label, path.display()));
        }
    }
    Ok(())
}

pub async fn execute(args: RunArgs) -> i32 {
    let config = match ReconConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    for (label, path) in [
        ("diffusion", &args.diffusion),
        ("diffusion_resampled", &args.diffusion_resampled),
        ("wm_mask_resampled", &args.wm_mask_resampled),
    ] {
        if let Err(msg) = check_input(label, path) {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    }

    let mut flow = match create_recon_flow(&config) {
        Ok(flow) => flow,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    let inputs = ReconInputs {
        diffusion: args.diffusion.as_deref(),
        diffusion_resampled: args.diffusion_resampled.as_deref(),
        wm_mask_resampled: args.wm_mask_resampled.as_deref(),
    };
    if let Err(e) = inputs.apply(&mut flow) {
        eprintln!("Error: {}", e);
        return exit_codes::INPUT_ERROR;
    }

    if !args.quiet {
        eprintln!(
            "Running {} reconstruction in {}...",
            config.backend_name(),
            args.work_dir.display()
        );
    }

    let outputs = match flow.run(&args.work_dir).await {
        Ok(outputs) => outputs,
        Err(e) => {
            eprintln!("Reconstruction failed: {}", e);
            return match e {
                tracto_rs::TractoError::ToolNotFound(_) => exit_codes::TOOL_NOT_FOUND,
                _ => exit_codes::EXECUTION_ERROR,
            };
        }
    };

    let summary = RunSummary {
        id: uuid::Uuid::new_v4().to_string(),
        backend: config.backend_name(),
        created_at: chrono::Utc::now().to_rfc3339(),
        work_dir: absolute(&args.work_dir),
        outputs,
    };

    match output::to_json(&summary, args.compact) {
        Ok(json) => {
            if let Err(e) = output::write_output(&json, args.output.as_deref()) {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
            if !args.quiet {
                if let Some(ref path) = args.output {
                    eprintln!("Summary written to {}", path);
                }
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing summary: {}", e);
            exit_codes::EXECUTION_ERROR
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
