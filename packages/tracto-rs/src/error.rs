use thiserror::Error;

#[derive(Error, Debug)]
pub enum TractoError {
    #[error("Tool '{0}' not found. Set the backend path variable or install it on $PATH")]
    ToolNotFound(String),

    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("Environment variable {0} is not set")]
    EnvVarNotSet(&'static str),

    #[error("Unknown node '{0}' in workflow")]
    UnknownNode(String),

    #[error("Node '{node}' has no port named '{port}'")]
    UnknownPort { node: String, port: String },

    #[error("Duplicate node name '{0}'")]
    DuplicateNode(String),

    #[error("Connecting {src} -> {dst} would create a cycle")]
    CycleDetected { src: String, dst: String },

    #[error("Node '{node}' is missing a value for input port '{port}'")]
    MissingInput { node: String, port: String },

    #[error("'{tool}' execution failed: {detail}")]
    ExecutionFailed { tool: String, detail: String },

    #[error("'{tool}' did not produce expected output {path}")]
    OutputMissing { tool: String, path: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TractoError>;
