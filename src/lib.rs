pub mod combinators;
pub mod deferred;
pub mod errors;
pub mod scheduler;
pub mod value;

// Re-export main types
pub use combinators::{
    first_success, in_sequence, race_first, retry, retry_with_backoff, settle_all, wait_all,
    Outcome, Pool, Producer,
};
pub use deferred::{
    cancelable, CancelHandle, CancelScope, ChainResult, Deferred, DeferredState, Eventual, Handler,
};
pub use errors::{CadenceError, ErrorInfo};
pub use value::Val;
