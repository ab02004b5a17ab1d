pub mod details;
pub mod evaluator;
pub(crate) mod log_builder;
