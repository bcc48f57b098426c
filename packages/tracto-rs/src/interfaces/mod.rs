//! Command wrappers for the external reconstruction tools, one type per
//! executable. Each wrapper reproduces the tool's flag names, positional
//! ordering and output naming exactly.

pub mod camino;
pub mod dtb;
pub mod dtk;
pub mod gibbs;
pub mod mrtrix;
