pub mod definition;
pub mod error;
pub mod file;
pub mod processor;
pub mod transform;
pub mod types;

pub use definition::{Definition, TransformContext};
pub use error::ProcessError;
pub use file::FileHandle;
pub use processor::{
    CommandRunner, ConvertOutput, ConvertRequest, Processor, TokioCommandRunner,
};
pub use transform::{CommandArgvFn, CommandTemplateFn, CustomTransformFn, Transform};
pub use types::*;
