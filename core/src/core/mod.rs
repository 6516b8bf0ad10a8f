// servitor/src/core/mod.rs

pub mod context;
pub mod control;
pub mod step;

pub use context::{Context, Inputs, Slots};
pub use control::{CallState, StepControl, StepResult};
pub use step::{Condition, RollbackFn, Stage, StageBuilder, Step, StepFn, WrapperFn};
