pub mod resolver;
pub mod validation;
pub mod writer;
