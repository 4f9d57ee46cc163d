pub mod keywords;
pub mod classifier;

pub use keywords::*;
pub use classifier::*;
