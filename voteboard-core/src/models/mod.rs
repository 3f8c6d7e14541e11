mod feature;
mod project;
mod vote;

pub use feature::*;
pub use project::*;
pub use vote::*;
