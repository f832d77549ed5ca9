pub mod assets;
pub(crate) mod common;

pub mod compiler;

pub mod cli;
