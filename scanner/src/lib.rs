pub mod ast;
pub mod compiler;
pub mod enums;
pub mod error;
pub mod ident;
pub mod interface;
pub mod parser;
pub mod wire_types;

pub use compiler::{
    CompilerOptions, OutputUnit, ProtocolCompiler, render_module, write_units,
};
