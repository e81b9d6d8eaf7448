//! SQL front end: tokens, statement AST and a recursive-descent parser.

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::*;
pub use parser::*;
