//! Domain model (specs, context, change detection, codec, errors).

pub mod change;
pub mod codec;
pub mod context;
pub mod errors;
pub mod ids;
pub mod spec;

pub use self::change::ChangeState;
pub use self::context::ExecutionContext;
pub use self::errors::{
    ConfigError, DecodeError, EncodeError, InvocationError, LoadError, Phase, RuntimeError,
};
pub use self::ids::InvocationId;
pub use self::spec::HandlerSpec;
