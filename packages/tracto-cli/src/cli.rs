use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tracto",
    version,
    about = "Diffusion MRI reconstruction pipeline command-line tool",
    long_about = "Assemble and run diffusion MRI reconstruction workflows wrapping the\n\
                  Diffusion Toolkit, MRtrix, Camino and MITK Gibbs tracking binaries,\n\
                  or launch the containerized BIDS App via Docker."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a reconstruction flow on a diffusion dataset
    Run(RunArgs),
    /// Print a reconstruction flow as a DOT graph without running it
    Graph(GraphArgs),
    /// Run the containerized BIDS App via Docker
    Docker(DockerArgs),
    /// Show version and external tool discovery status
    Info(InfoArgs),
    /// Validate a reconstruction config file
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Reconstruction config file (JSON, with a "backend" tag)
    #[arg(long)]
    pub config: PathBuf,

    /// Raw diffusion image
    #[arg(long)]
    pub diffusion: Option<PathBuf>,

    /// Diffusion image resampled to output resolution
    #[arg(long)]
    pub diffusion_resampled: Option<PathBuf>,

    /// White-matter mask in the resampled grid
    #[arg(long)]
    pub wm_mask_resampled: Option<PathBuf>,

    /// Working directory for node outputs
    #[arg(long, default_value = "work")]
    pub work_dir: PathBuf,

    /// Output file for the JSON run summary (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct GraphArgs {
    /// Reconstruction config file (JSON, with a "backend" tag)
    #[arg(long)]
    pub config: PathBuf,

    /// Output file for the DOT graph (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct DockerArgs {
    /// BIDS dataset directory
    #[arg(long)]
    pub bids_dir: PathBuf,

    /// Output derivatives directory
    #[arg(long)]
    pub output_dir: PathBuf,

    /// BIDS App analysis level
    #[arg(long, default_value = "participant")]
    pub analysis_level: String,

    /// Participant labels to process
    #[arg(long, num_args = 1..)]
    pub participant_label: Vec<String>,

    /// Session labels to process
    #[arg(long, num_args = 1..)]
    pub session_label: Vec<String>,

    /// Anatomical pipeline config file name (inside the config dir)
    #[arg(long)]
    pub anat_pipeline_config: Option<String>,

    /// Diffusion pipeline config file name (inside the config dir)
    #[arg(long)]
    pub dwi_pipeline_config: Option<String>,

    /// fMRI pipeline config file name (inside the config dir)
    #[arg(long)]
    pub func_pipeline_config: Option<String>,

    /// Directory with the pipeline config files (default: <bids_dir>/code)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// FreeSurfer license file to mount
    #[arg(long)]
    pub fs_license: Option<PathBuf>,

    #[arg(long)]
    pub number_of_threads: Option<u32>,

    #[arg(long)]
    pub number_of_participants_processed_in_parallel: Option<u32>,

    #[arg(long)]
    pub mrtrix_random_seed: Option<u64>,

    #[arg(long)]
    pub ants_random_seed: Option<u64>,

    #[arg(long)]
    pub ants_number_of_threads: Option<u32>,

    /// Disable usage tracking inside the container
    #[arg(long, default_value_t = false)]
    pub notrack: bool,

    /// Run with the coverage entrypoint
    #[arg(long, default_value_t = false)]
    pub coverage: bool,

    /// Container image
    #[arg(long, env = "TRACTO_DOCKER_IMAGE", default_value = tracto_rs::docker::DEFAULT_IMAGE)]
    pub docker_image: String,

    /// Estimate and report the carbon footprint of the run
    #[arg(long, default_value_t = false)]
    pub track_carbon_footprint: bool,

    /// Remove container cache leftovers from the dataset afterwards
    #[arg(long, default_value_t = false)]
    pub clean_cache: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Reconstruction config file to check
    #[arg(long)]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl From<&DockerArgs> for tracto_rs::docker::BidsAppRun {
    fn from(args: &DockerArgs) -> Self {
        Self {
            bids_dir: args.bids_dir.clone(),
            output_dir: args.output_dir.clone(),
            analysis_level: args.analysis_level.clone(),
            participant_label: args.participant_label.clone(),
            session_label: args.session_label.clone(),
            anat_pipeline_config: args.anat_pipeline_config.clone(),
            dwi_pipeline_config: args.dwi_pipeline_config.clone(),
            func_pipeline_config: args.func_pipeline_config.clone(),
            config_dir: args.config_dir.clone(),
            fs_license: args.fs_license.clone(),
            number_of_threads: args.number_of_threads,
            number_of_participants_processed_in_parallel: args
                .number_of_participants_processed_in_parallel,
            mrtrix_random_seed: args.mrtrix_random_seed,
            ants_random_seed: args.ants_random_seed,
            ants_number_of_threads: args.ants_number_of_threads,
            notrack: args.notrack,
            coverage: args.coverage,
            docker_image: args.docker_image.clone(),
        }
    }
}
