#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid type layout: {0}")]
    InvalidLayout(String),

    #[error("Layout nesting exceeds the supported depth of {0}")]
    NestingTooDeep(usize),

    #[error("Unsupported variadic parameter: {0}")]
    UnsupportedVariadic(String),
}

pub type Result<T> = std::result::Result<T, Error>;
