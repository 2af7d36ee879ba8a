use crate::format::Format;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot infer an output format from {path}; expected one of: {}", .allowed.join(", "))]
    FormatUnknown {
        path: String,
        allowed: Vec<&'static str>,
    },

    #[error("{format} supports at most {available} states, but a variation unit has {needed}")]
    TooManyStates {
        format: Format,
        needed: usize,
        available: usize,
    },

    #[error("failed to format output: {0}")]
    Render(#[from] std::fmt::Error),
}
