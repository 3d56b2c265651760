pub mod types;
pub mod modul_filter;

pub use types::*;
pub use modul_filter::{ModulFilter, ModulQuery};
