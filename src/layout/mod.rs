//! Layout algorithms for family tree visualization.
//!
//! The tidy layout is the primary diagram: generations on horizontal ranks,
//! parents centered over children, subtrees packed to minimum width. The
//! fan projection reinterprets a finished tidy layout as a radial chart.

pub mod fan;
pub mod tidy;

pub use fan::{FanConfig, project_fan};
pub use tidy::{TidyConfig, TidyLayout, TreeLayout};
