pub mod pipeline;

pub use pipeline::{MockEngine, MockRequest};
