#![allow(
    clippy::missing_errors_doc // failure conditions are documented on the Error enum
)]

pub mod arch;
pub mod arrange;
pub mod binding;
pub mod cache;
pub mod classify;
pub mod error;
pub mod layout;
pub mod storage;

pub use arrange::{ArrangeOptions, CallingSequence, Direction, FunctionSignature, arrange};
pub use binding::{BindingStrategy, BoxStrategy, ParameterBinding, RecipeStep, UnboxStrategy};
pub use cache::SequenceCache;
pub use classify::{AbiClass, classify};
pub use error::{Error, Result};
pub use layout::{ScalarKind, TypeLayout};
pub use storage::{RegisterKind, StorageCalculator, StorageLocation};
