use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::severity::Severity;

/// Where a record was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub module: &'static str,
    pub function: &'static str,
    pub file: &'static str,
    pub line: u32,
}

impl Location {
    pub const fn new(
        module: &'static str,
        function: &'static str,
        file: &'static str,
        line: u32,
    ) -> Self {
        Self {
            module,
            function,
            file,
            line,
        }
    }
}

/// A single rendered log record, handed to every sink of a logger.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub logger: &'a str,
    pub message: &'a str,
    pub location: Location,
    pub process: u32,
    pub thread: u64,
}

impl<'a> Record<'a> {
    pub fn new(
        logger: &'a str,
        severity: Severity,
        message: &'a str,
        location: Location,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            logger,
            message,
            location,
            process: std::process::id(),
            thread: current_thread_id(),
        }
    }
}

/// A small integer identifying the calling thread, stable for the thread's lifetime.
pub fn current_thread_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static THREAD_ID: u64 = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    }
    THREAD_ID.with(|id| *id)
}

/// Reduce the type name of a marker function declared inside a caller to the
/// caller's own name: `app::worker::run::{{closure}}::f` becomes `run`.
#[doc(hidden)]
pub fn short_function_name(marker: &'static str) -> &'static str {
    let mut path = marker.strip_suffix("::f").unwrap_or(marker);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// Capture the [`Location`] of the macro call site.
#[macro_export]
macro_rules! location {
    () => {
        $crate::Location::new(
            ::std::module_path!(),
            $crate::__function_name!(),
            ::std::file!(),
            ::std::line!(),
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::record::short_function_name(type_name_of(f))
    }};
}
