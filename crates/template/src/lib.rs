pub mod generators;
pub mod placeholder;
pub mod resolver;

pub use generators::GeneratorRegistry;
pub use resolver::{MockContext, TemplateResolver};
