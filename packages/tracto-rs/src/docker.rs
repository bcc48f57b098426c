//! BIDS App Docker wrapper: builds and runs the containerized invocation
//! of the full application.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TractoError};

/// Entrypoint used when running with coverage collection
pub const COVERAGE_ENTRYPOINT: &str = "/app/run_coverage.sh";

/// Default container image
pub const DEFAULT_IMAGE: &str = "tracto/tracto-bidsapp:latest";

/// Everything needed to assemble one `docker run` of the BIDS App.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BidsAppRun {
    pub bids_dir: PathBuf,
    pub output_dir: PathBuf,
    pub analysis_level: String,
    pub participant_label: Vec<String>,
    pub session_label: Vec<String>,
    pub anat_pipeline_config: Option<String>,
    pub dwi_pipeline_config: Option<String>,
    pub func_pipeline_config: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub fs_license: Option<PathBuf>,
    pub number_of_threads: Option<u32>,
    pub number_of_participants_processed_in_parallel: Option<u32>,
    pub mrtrix_random_seed: Option<u64>,
    pub ants_random_seed: Option<u64>,
    pub ants_number_of_threads: Option<u32>,
    pub notrack: bool,
    pub coverage: bool,
    pub docker_image: String,
}

impl Default for BidsAppRun {
    fn default() -> Self {
        Self {
            bids_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            analysis_level: "participant".to_string(),
            participant_label: Vec::new(),
            session_label: Vec::new(),
            anat_pipeline_config: None,
            dwi_pipeline_config: None,
            func_pipeline_config: None,
            config_dir: None,
            fs_license: None,
            number_of_threads: None,
            number_of_participants_processed_in_parallel: None,
            mrtrix_random_seed: None,
            ants_random_seed: None,
            ants_number_of_threads: None,
            notrack: false,
            coverage: false,
            docker_image: DEFAULT_IMAGE.to_string(),
        }
    }
}

impl BidsAppRun {
    /// The argument vector following `docker`, in the exact order the
    /// containerized app expects.
    pub fn docker_args(&self, uid: u32, gid: u32) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "run".into(),
            "-t".into(),
            "--rm".into(),
            "-u".into(),
            format!("{}:{}", uid, gid),
        ];
        if self.coverage {
            args.push("--entrypoint".into());
            args.push(COVERAGE_ENTRYPOINT.into());
        }
        args.push("-v".into());
        args.push(format!("{}:/bids_dir", self.bids_dir.display()));
        args.push("-v".into());
        args.push(format!("{}:/output_dir", self.output_dir.display()));
        args.push("-v".into());
        match &self.config_dir {
            Some(dir) => args.push(format!("{}:/config", dir.display())),
            None => args.push(format!("{}/code:/config", self.bids_dir.display())),
        }
        if let Some(license) = &self.fs_license {
            args.push("-v".into());
            args.push(format!(
                "{}:/bids_dir/code/license.txt",
                license.display()
            ));
        }

        args.push(self.docker_image.clone());

        // Standard BIDS App inputs
        args.push("/bids_dir".into());
        args.push("/output_dir".into());
        args.push(self.analysis_level.clone());
        if !self.participant_label.is_empty() {
            args.push("--participant_label".into());
            args.extend(self.participant_label.iter().cloned());
        }
        if !self.session_label.is_empty() {
            args.push("--session_label".into());
            args.extend(self.session_label.iter().cloned());
        }
        if let Some(config) = &self.anat_pipeline_config {
            args.push("--anat_pipeline_config".into());
            args.push(format!("/config/{}", config));
        }
        if let Some(config) = &self.dwi_pipeline_config {
            args.push("--dwi_pipeline_config".into());
            args.push(format!("/config/{}", config));
        }
        if let Some(config) = &self.func_pipeline_config {
            args.push("--func_pipeline_config".into());
            args.push(format!("/config/{}", config));
        }
        args.push("--fs_license".into());
        args.push("/bids_dir/code/license.txt".into());

        for (flag, value) in [
            ("--number_of_threads", self.number_of_threads.map(u64::from)),
            (
                "--number_of_participants_processed_in_parallel",
                self.number_of_participants_processed_in_parallel
                    .map(u64::from),
            ),
            ("--mrtrix_random_seed", self.mrtrix_random_seed),
            ("--ants_random_seed", self.ants_random_seed),
            (
                "--ants_number_of_threads",
                self.ants_number_of_threads.map(u64::from),
            ),
        ] {
            if let Some(value) = value {
                args.push(flag.into());
                args.push(value.to_string());
            }
        }
        if self.notrack {
            args.push("--notrack".into());
        }
        if self.coverage {
            args.push("--coverage".into());
        }

        args
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bids_dir.is_dir() {
            return Err(TractoError::FileNotFound(format!(
                "BIDS dataset directory {}",
                self.bids_dir.display()
            )));
        }
        Ok(())
    }

    /// Run the container and return its exit code.
    pub async fn run(&self) -> Result<i32> {
        self.validate()?;
        let (uid, gid) = current_uid_gid().await?;
        let args = self.docker_args(uid, gid);
        log::info!("docker {}", args.join(" "));

        let status = tokio::process::Command::new("docker")
            .args(&args)
            .status()
            .await
            .map_err(|e| TractoError::ExecutionFailed {
                tool: "docker".to_string(),
                detail: format!("failed to spawn: {}", e),
            })?;
        Ok(status.code().unwrap_or(1))
    }
}

async fn id_number(flag: &str) -> Result<u32> {
    let output = tokio::process::Command::new("id")
        .arg(flag)
        .output()
        .await
        .map_err(|e| TractoError::ExecutionFailed {
            tool: "id".to_string(),
            detail: e.to_string(),
        })?;
    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .map_err(|_| TractoError::ExecutionFailed {
            tool: "id".to_string(),
            detail: format!("unparseable `id {}` output", flag),
        })
}

/// Current user and group id, resolved through `id(1)`.
pub async fn current_uid_gid() -> Result<(u32, u32)> {
    Ok((id_number("-u").await?, id_number("-g").await?))
}

/// Stale artifacts the containerized tools leave behind in a mounted
/// dataset (java perf data, matlab runtime extractions, X11 leftovers).
const CACHE_PATTERNS: &[&str] = &[
    "hsperfdata_*",
    "._java*",
    "mri_segstats.tmp*",
    "MCR_*",
    "matplotlib*",
    "xvfb-run.*",
    ".X11*",
    ".X99*",
];

/// Remove container cache leftovers from a dataset directory. Returns the
/// paths that were deleted.
pub fn clean_cache(bids_root: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for pattern in CACHE_PATTERNS {
        let full = bids_root.join(pattern);
        let Some(full) = full.to_str().map(String::from) else {
            continue;
        };
        for entry in glob::glob(&full)
            .map_err(|e| TractoError::InvalidParameter(format!("bad glob pattern: {}", e)))?
        {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("skipping unreadable cache entry: {}", e);
                    continue;
                }
            };
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => {
                    log::info!("removed cache entry {}", path.display());
                    removed.push(path);
                }
                Err(e) => log::warn!("could not remove {}: {}", path.display(), e),
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_run() -> BidsAppRun {
        BidsAppRun {
            bids_dir: PathBuf::from("/data/bids"),
            output_dir: PathBuf::from("/data/out"),
            participant_label: vec!["01".to_string(), "02".to_string()],
            dwi_pipeline_config: Some("ref_diffusion_config.json".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_docker_args_prelude_and_mounts() {
        let args = sample_run().docker_args(1000, 1000);
        assert_eq!(args[..5], ["run", "-t", "--rm", "-u", "1000:1000"].map(String::from));
        assert!(args.contains(&"/data/bids:/bids_dir".to_string()));
        assert!(args.contains(&"/data/out:/output_dir".to_string()));
        // No explicit config dir: the dataset's code/ folder is mounted
        assert!(args.contains(&"/data/bids/code:/config".to_string()));
    }

    #[test]
    fn test_docker_args_positional_block() {
        let args = sample_run().docker_args(1000, 1000);
        let image_pos = args.iter().position(|a| a == DEFAULT_IMAGE).unwrap();
        assert_eq!(
            args[image_pos + 1..image_pos + 4],
            ["/bids_dir", "/output_dir", "participant"].map(String::from)
        );
        let label_pos = args.iter().position(|a| a == "--participant_label").unwrap();
        assert_eq!(args[label_pos + 1..label_pos + 3], ["01", "02"].map(String::from));
    }

    #[test]
    fn test_docker_args_config_and_license() {
        let args = sample_run().docker_args(1000, 1000);
        let config_pos = args
            .iter()
            .position(|a| a == "--dwi_pipeline_config")
            .unwrap();
        assert_eq!(args[config_pos + 1], "/config/ref_diffusion_config.json");
        let license_pos = args.iter().position(|a| a == "--fs_license").unwrap();
        assert_eq!(args[license_pos + 1], "/bids_dir/code/license.txt");
    }

    #[test]
    fn test_docker_args_optional_passthrough() {
        let mut run = sample_run();
        run.number_of_threads = Some(4);
        run.mrtrix_random_seed = Some(1234);
        run.notrack = true;
        let args = run.docker_args(1000, 1000);
        let threads_pos = args.iter().position(|a| a == "--number_of_threads").unwrap();
        assert_eq!(args[threads_pos + 1], "4");
        let seed_pos = args.iter().position(|a| a == "--mrtrix_random_seed").unwrap();
        assert_eq!(args[seed_pos + 1], "1234");
        assert_eq!(args.last().unwrap(), "--notrack");
    }

    #[test]
    fn test_coverage_entrypoint_and_trailing_flag() {
        let mut run = sample_run();
        run.coverage = true;
        let args = run.docker_args(1000, 1000);
        let entry_pos = args.iter().position(|a| a == "--entrypoint").unwrap();
        assert_eq!(args[entry_pos + 1], COVERAGE_ENTRYPOINT);
        assert_eq!(args.last().unwrap(), "--coverage");
    }

    #[test]
    fn test_explicit_config_dir_mount() {
        let mut run = sample_run();
        run.config_dir = Some(PathBuf::from("/etc/tracto"));
        let args = run.docker_args(1000, 1000);
        assert!(args.contains(&"/etc/tracto:/config".to_string()));
        assert!(!args.contains(&"/data/bids/code:/config".to_string()));
    }

    #[test]
    fn test_fs_license_mount() {
        let mut run = sample_run();
        run.fs_license = Some(PathBuf::from("/opt/freesurfer/license.txt"));
        let args = run.docker_args(1000, 1000);
        assert!(args.contains(&"/opt/freesurfer/license.txt:/bids_dir/code/license.txt".to_string()));
    }

    #[test]
    fn test_validate_requires_dataset_dir() {
        let run = BidsAppRun {
            bids_dir: PathBuf::from("/definitely/not/here"),
            ..Default::default()
        };
        assert!(run.validate().is_err());
    }

    #[test]
    fn test_clean_cache_removes_matching_entries() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("._java_pid123"), b"x").unwrap();
        std::fs::create_dir(tmp.path().join("MCR_extract")).unwrap();
        std::fs::write(tmp.path().join("participants.tsv"), b"keep").unwrap();

        let removed = clean_cache(tmp.path()).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!tmp.path().join("._java_pid123").exists());
        assert!(!tmp.path().join("MCR_extract").exists());
        assert!(tmp.path().join("participants.tsv").exists());
    }
}
