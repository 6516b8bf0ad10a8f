// servitor/src/service/mod.rs

//! Declaring, building and calling services.

pub mod arguments;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod info;

pub use arguments::Arguments;
pub use definition::{Service, ServiceBuilder, ServiceDefinition};
pub use hooks::CallHook;
pub use info::{AttributeInfo, ServiceInfo};
