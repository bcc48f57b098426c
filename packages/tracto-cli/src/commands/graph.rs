use tracto_rs::config::ReconConfig;
use tracto_rs::flows::create_recon_flow;

use crate::cli::GraphArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: GraphArgs) -> i32 {
    let config = match ReconConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    let flow = match create_recon_flow(&config) {
        Ok(flow) => flow,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    match output::write_output(&flow.to_dot(), args.output.as_deref()) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::EXECUTION_ERROR
        }
    }
}
