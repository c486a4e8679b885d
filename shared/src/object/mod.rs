pub mod attribute;
pub mod core;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod replicated;
pub mod serializer;
pub mod snapshot;
