//! Named gradient table registry shared by the DTK, MRtrix and Camino backends.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TractoError};

/// Sentinel name selecting a user-supplied gradient table file
pub const CUSTOM_TABLE: &str = "custom";

/// Environment variable pointing at the gradient table directory
pub const GRADIENT_DIR_ENV: &str = "TRACTO_GRADIENT_DIR";

/// A gradient sampling scheme shipped with the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GradientTable {
    pub name: &'static str,
    pub directions: u32,
}

/// All named tables, MGH schemes first, then Siemens vendor schemes
pub const GRADIENT_TABLES: &[GradientTable] = &[
    GradientTable { name: "mgh_dti_006", directions: 6 },
    GradientTable { name: "mgh_dti_018", directions: 18 },
    GradientTable { name: "mgh_dti_030", directions: 30 },
    GradientTable { name: "mgh_dti_042", directions: 42 },
    GradientTable { name: "mgh_dti_060", directions: 60 },
    GradientTable { name: "mgh_dti_072", directions: 72 },
    GradientTable { name: "mgh_dti_090", directions: 90 },
    GradientTable { name: "mgh_dti_120", directions: 120 },
    GradientTable { name: "mgh_dti_144", directions: 144 },
    GradientTable { name: "siemens_06", directions: 6 },
    GradientTable { name: "siemens_12", directions: 12 },
    GradientTable { name: "siemens_20", directions: 20 },
    GradientTable { name: "siemens_30", directions: 30 },
    GradientTable { name: "siemens_64", directions: 64 },
    GradientTable { name: "siemens_256", directions: 256 },
];

impl GradientTable {
    pub fn from_name(name: &str) -> Option<&'static GradientTable> {
        GRADIENT_TABLES.iter().find(|t| t.name == name)
    }
}

/// Number of directions encoded in a table name ("siemens_64" -> 64)
pub fn directions_in_name(name: &str) -> Option<u32> {
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Directory holding the packaged gradient table files.
///
/// Resolution order: $TRACTO_GRADIENT_DIR, then the per-user data
/// directory (`<data_dir>/tracto/gradient_tables`).
pub fn gradient_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(GRADIENT_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tracto")
        .join("gradient_tables")
}

/// Selection of a gradient table: a named scheme or a custom file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientSource {
    pub table: String,
    pub custom_path: Option<PathBuf>,
}

impl Default for GradientSource {
    fn default() -> Self {
        Self {
            table: "siemens_06".to_string(),
            custom_path: None,
        }
    }
}

impl GradientSource {
    pub fn named(table: &str) -> Self {
        Self {
            table: table.to_string(),
            custom_path: None,
        }
    }

    pub fn custom<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            table: CUSTOM_TABLE.to_string(),
            custom_path: Some(path.into()),
        }
    }

    pub fn is_custom(&self) -> bool {
        self.table == CUSTOM_TABLE
    }

    /// Path to the gradient table file this selection refers to.
    pub fn resolve(&self) -> Result<PathBuf> {
        if self.is_custom() {
            return self.custom_path.clone().ok_or_else(|| {
                TractoError::InvalidParameter(
                    "gradient table 'custom' requires custom_path".to_string(),
                )
            });
        }
        if GradientTable::from_name(&self.table).is_none() {
            return Err(TractoError::InvalidParameter(format!(
                "unknown gradient table '{}'",
                self.table
            )));
        }
        Ok(gradient_dir().join(format!("{}.txt", self.table)))
    }

    /// Direction count of the selected table, or `fallback` for custom files.
    pub fn number_of_directions(&self, fallback: u32) -> u32 {
        if self.is_custom() {
            return fallback;
        }
        directions_in_name(&self.table).unwrap_or(fallback)
    }
}
