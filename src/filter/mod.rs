pub mod compile;
pub mod document;
pub mod model;
