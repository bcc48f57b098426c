use tracto_rs::carbon::{footprint_report, EmissionsModel, EmissionsTracker};
use tracto_rs::docker::{clean_cache, BidsAppRun};

use crate::cli::DockerArgs;
use crate::exit_codes;

pub async fn execute(args: DockerArgs) -> i32 {
    let run = BidsAppRun::from(&args);
    if let Err(e) = run.validate() {
        eprintln!("Error: {}", e);
        return exit_codes::INPUT_ERROR;
    }

    let tracker = args
        .track_carbon_footprint
        .then(|| EmissionsTracker::start(EmissionsModel::default()));

    let exit_code = match run.run().await {
        Ok(0) => exit_codes::SUCCESS,
        Ok(code) => {
            eprintln!("BIDS App exited with status {}", code);
            exit_codes::EXECUTION_ERROR
        }
        Err(e) => {
            eprintln!("Docker invocation failed: {}", e);
            exit_codes::EXECUTION_ERROR
        }
    };

    if let Some(tracker) = tracker {
        let emissions = tracker.stop();
        print!(
            "{}",
            footprint_report(emissions, args.participant_label.len())
        );
    }

    if args.clean_cache {
        match clean_cache(&args.bids_dir) {
            Ok(removed) => {
                if !removed.is_empty() {
                    eprintln!("Removed {} cache entries", removed.len());
                }
            }
            Err(e) => eprintln!("Cache cleaning failed: {}", e),
        }
    }

    exit_code
}
