//! Parser-contract errors: spec.md §7's "Malformed network (parser contract
//! violation, ... cycle, unsupported cover shape, out-of-range id)" as it
//! shows up at the text-format boundary, before a single node has been built.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: undeclared signal `{name}`")]
    UndeclaredSignal { line: usize, name: String },
    #[error("line {line}: signal `{name}` declared more than once")]
    DuplicateSignal { line: usize, name: String },
    #[error("line {line}: `.names` cover row has {got} columns, expected {expected}")]
    CoverShape { line: usize, got: usize, expected: usize },
    #[error("line {line}: unsupported gate keyword `{keyword}`")]
    UnsupportedGate { line: usize, keyword: String },
    #[error("network has no `.model`/top-level declaration")]
    MissingModel,
    #[error("network build failed: {0}")]
    Network(#[from] tpg_core::error::NetworkError),
}

pub type Result<T> = std::result::Result<T, ParseError>;
