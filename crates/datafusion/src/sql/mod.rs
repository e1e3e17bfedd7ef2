mod parser;
mod statements;

pub use parser::*;
pub use statements::*;
