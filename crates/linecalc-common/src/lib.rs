pub mod error;
pub mod unit;
pub mod value;

pub use error::*;
pub use unit::*;
pub use value::*;
