mod instruction;
mod main;

pub use main::{invoke, invoke_traced};
