pub mod command;
pub mod installer_scanner;
pub mod platform;

pub use command::*;
pub use installer_scanner::*;
pub use platform::*;
