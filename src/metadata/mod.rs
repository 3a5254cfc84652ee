pub mod collection;
pub mod extractor;
pub mod parameters;
pub mod types;
pub mod value;
mod xml;
mod yaml;

pub use crate::error::ExtractError;
pub use collection::*;
pub use extractor::*;
pub use parameters::{Container, EnvParameterBag, ParameterBag, ParameterResolver};
pub use types::*;
pub use value::*;
