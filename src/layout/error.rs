use thiserror::Error;

/// Failures that make a partial layout meaningless.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("graph layout returned no position for node `{0}`")]
    MissingNode(String),
    #[error("graph layout failed: {0}")]
    Engine(String),
    #[error("classifiers nested deeper than {0} levels")]
    NestingTooDeep(usize),
}
