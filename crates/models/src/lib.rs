pub mod config;
pub mod error;
pub mod prototype;

pub use config::*;
pub use error::*;
pub use prototype::*;
