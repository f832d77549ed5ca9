pub mod command;
pub mod source;
pub mod toolchain;
