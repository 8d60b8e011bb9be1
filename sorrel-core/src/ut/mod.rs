#[macro_use]
pub mod macros;
pub mod path;
pub mod track;
