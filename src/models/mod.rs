pub mod enums;
pub mod analysis;
pub mod job;

pub use enums::*;
pub use analysis::*;
pub use job::*;
