use serde::Serialize;

use tracto_rs::config::ReconConfig;
use tracto_rs::flows::create_recon_flow;

use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct ValidateOutput {
    file: String,
    parsed: bool,
    backend: Option<&'static str>,
    valid: bool,
    nodes: Option<usize>,
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let file = args.config.display().to_string();

    let (parsed, backend, valid, nodes, error) = match ReconConfig::load(&args.config) {
        Ok(config) => match create_recon_flow(&config) {
            Ok(flow) => (
                true,
                Some(config.backend_name()),
                true,
                Some(flow.node_names().len()),
                None,
            ),
            Err(e) => (true, Some(config.backend_name()), false, None, Some(e.to_string())),
        },
        Err(e) => (false, None, false, None, Some(e.to_string())),
    };

    let result = ValidateOutput {
        file: file.clone(),
        parsed,
        backend,
        valid,
        nodes,
        error: error.clone(),
    };

    if args.json {
        match output::to_json(&result, false) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, None) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
    } else if let Some(ref err) = error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "Config '{}' is valid ({} backend, {} workflow nodes)",
            file,
            backend.unwrap_or("unknown"),
            nodes.unwrap_or(0)
        );
    }

    if error.is_some() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
