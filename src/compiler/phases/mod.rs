pub mod types;

pub mod generate;
pub mod parse;
pub mod tokenize;

pub use generate::generate;
pub use parse::parse;
pub use tokenize::tokenize;
