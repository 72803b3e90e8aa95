//! Logging shims that forward to `tracing` when the corresponding
//! feature is enabled and compile to nothing otherwise.

#[cfg(feature = "tracing")]
pub(crate) use tracing::debug;
#[cfg(feature = "tracing")]
pub(crate) use tracing::instrument;
#[cfg(feature = "tracing")]
pub(crate) use tracing::trace;
#[cfg(feature = "tracing")]
pub(crate) use tracing::warn;


#[cfg(not(feature = "tracing"))]
macro_rules! noop {
    ($($args:tt)*) => {{
        if false {
            let _args = format_args!($($args)*);
        }
    }};
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($args:tt)*) => {
        $crate::log::noop!($($args)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_noop {
    ($($args:tt)*) => {
        $crate::log::noop!($($args)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_noop {
    ($($args:tt)*) => {
        $crate::log::noop!($($args)*)
    };
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use noop;
#[cfg(not(feature = "tracing"))]
pub(crate) use trace_noop as trace;
#[cfg(not(feature = "tracing"))]
pub(crate) use warn_noop as warn;
