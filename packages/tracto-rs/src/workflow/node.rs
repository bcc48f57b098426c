//! Node interface abstraction: declared ports, argument-vector
//! construction and output-path derivation for one external tool.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Value carried on a workflow port. Most ports carry file paths; a few
/// carry flags (the MRtrix `SD` marker) or plain strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Flag(bool),
    Path(PathBuf),
    Text(String),
}

impl PortValue {
    pub fn path<P: Into<PathBuf>>(p: P) -> Self {
        PortValue::Path(p.into())
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            PortValue::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            PortValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

/// Resolved port values keyed by port name.
pub type PortMap = BTreeMap<String, PortValue>;

/// Fetch a required path-valued port.
pub fn input_path<'a>(
    inputs: &'a PortMap,
    node: &str,
    port: &str,
) -> Result<&'a Path> {
    inputs
        .get(port)
        .and_then(PortValue::as_path)
        .ok_or_else(|| crate::error::TractoError::MissingInput {
            node: node.to_string(),
            port: port.to_string(),
        })
}

/// One subprocess call. Camino tools are stream filters, so invocations
/// may redirect stdin from and stdout to files.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin_from: Option<PathBuf>,
    pub stdout_to: Option<PathBuf>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            stdin_from: None,
            stdout_to: None,
        }
    }

    pub fn stdin_from<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.stdin_from = Some(path.into());
        self
    }

    pub fn stdout_to<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.stdout_to = Some(path.into());
        self
    }
}

/// A workflow node's contract: declared ports, optional side-file
/// preparation, the command line, and the outputs the tool will leave
/// behind.
///
/// Identity (pass-through) nodes return `None` from [`Interface::plan`].
pub trait Interface: Send + Sync {
    /// Tool label used in node logs and errors
    fn name(&self) -> &'static str;

    fn input_ports(&self) -> &[&'static str];

    fn output_ports(&self) -> &[&'static str];

    /// Write side files the command needs (parameter files etc.)
    fn prepare(&self, _work_dir: &Path) -> Result<()> {
        Ok(())
    }

    /// Build the command for the resolved inputs, or `None` for a
    /// pass-through node.
    fn plan(&self, inputs: &PortMap, work_dir: &Path) -> Result<Option<Invocation>>;

    /// Paths (or values) the node publishes after a successful run.
    fn outputs(&self, inputs: &PortMap, work_dir: &Path) -> Result<PortMap>;
}

/// Pass-through node used for workflow input and output boundaries.
pub struct IdentityInterface {
    fields: Vec<&'static str>,
}

impl IdentityInterface {
    pub fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }
}

impl Interface for IdentityInterface {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn input_ports(&self) -> &[&'static str] {
        &self.fields
    }

    fn output_ports(&self) -> &[&'static str] {
        &self.fields
    }

    fn plan(&self, _inputs: &PortMap, _work_dir: &Path) -> Result<Option<Invocation>> {
        Ok(None)
    }

    fn outputs(&self, inputs: &PortMap, _work_dir: &Path) -> Result<PortMap> {
        Ok(inputs.clone())
    }
}

/// Generated output names follow the `<input-stem><suffix>` convention of
/// the wrapped toolchains; the files land in the node working directory.
pub fn derived_name(input: &Path, suffix: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    format!("{}{}", stem, suffix)
}
