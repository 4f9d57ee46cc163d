pub mod patterns;
pub mod redactor;

pub use patterns::*;
pub use redactor::*;
