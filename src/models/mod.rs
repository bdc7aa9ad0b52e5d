pub mod tool;

pub use tool::*;
