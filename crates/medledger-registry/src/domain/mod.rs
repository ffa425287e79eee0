//! # Domain Module
//!
//! Session context, record views, error taxonomy and input validation.
//! No I/O: all external interactions go through `ports`.

pub mod entities;
pub mod errors;
pub mod validation;

pub use entities::*;
pub use errors::*;
pub use validation::*;
