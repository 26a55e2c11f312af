#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionErrorKind {
    #[error("Malformed expression `{expression}` at offset {position}: {message}")]
    Expression {
        expression: String,
        position: usize,
        message: String,
    },
    #[error("{0}")]
    Custom(String),
}
