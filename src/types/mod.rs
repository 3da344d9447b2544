pub mod error;

pub use error::{AiError, AiErrorCode, AiResult, Result, ResultExt, ScriptError};
