//! crates/logging/src/macros.rs
//! Logging macros over the global hierarchy.
//!
//! Every macro captures `file!()`, the enclosing function path and `line!()`.
//! Format arguments are evaluated only when the level is enabled.
//! Each macro accepts an optional `logger: <target>,` prefix where the target
//! is anything implementing [`AsLogger`](crate::AsLogger): a name or a
//! [`Logger`](crate::Logger) handle. Without it the default logger is used.

/// Path of the enclosing function.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        let name = name.strip_suffix("::__here").unwrap_or(name);
        name.trim_end_matches("::{{closure}}")
    }};
}

/// Source location of the macro invocation.
#[doc(hidden)]
#[macro_export]
macro_rules! __location {
    () => {
        $crate::Location::new(::core::file!(), $crate::__function_name!(), ::core::line!())
    };
}

/// Logs at an explicit level.
///
/// # Example
/// ```ignore
/// log!(Level::Warn, "retrying {} of {}", attempt, limit);
/// log!(logger: "net.http", Level::Info, "listening on {addr}");
/// ```
#[macro_export]
macro_rules! log {
    (logger: $logger:expr, $level:expr, $($arg:tt)+) => {{
        let __hierarchy = $crate::Hierarchy::global();
        let __logger = $crate::AsLogger::resolve(&$logger, __hierarchy);
        let __level: $crate::Level = $level;
        if __hierarchy.enabled(&__logger, __level) {
            __hierarchy.log_fmt(
                &__logger,
                __level,
                $crate::__location!(),
                ::core::format_args!($($arg)+),
            );
        }
    }};
    ($level:expr, $($arg:tt)+) => {{
        let __hierarchy = $crate::Hierarchy::global();
        let __logger = __hierarchy.default_logger();
        let __level: $crate::Level = $level;
        if __hierarchy.enabled(&__logger, __level) {
            __hierarchy.log_fmt(
                &__logger,
                __level,
                $crate::__location!(),
                ::core::format_args!($($arg)+),
            );
        }
    }};
}

/// Whether a level is enabled, for guarding expensive preparation.
///
/// # Example
/// ```ignore
/// if log_enabled!(logger: "db", Level::Trace) {
///     trace!(logger: "db", "{}", plan.explain());
/// }
/// ```
#[macro_export]
macro_rules! log_enabled {
    (logger: $logger:expr, $level:expr) => {{
        let __hierarchy = $crate::Hierarchy::global();
        let __logger = $crate::AsLogger::resolve(&$logger, __hierarchy);
        __hierarchy.enabled(&__logger, $level)
    }};
    ($level:expr) => {{
        let __hierarchy = $crate::Hierarchy::global();
        __hierarchy.enabled(&__hierarchy.default_logger(), $level)
    }};
}

/// Logs at [`Level::Trace`](crate::Level::Trace).
#[macro_export]
macro_rules! trace {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Trace, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Trace, $($arg)+)
    };
}

/// Logs at [`Level::Debug`](crate::Level::Debug).
#[macro_export]
macro_rules! debug {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Debug, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Debug, $($arg)+)
    };
}

/// Logs at [`Level::Info`](crate::Level::Info).
#[macro_export]
macro_rules! info {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Info, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Info, $($arg)+)
    };
}

/// Logs at [`Level::Warn`](crate::Level::Warn).
#[macro_export]
macro_rules! warn {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Warn, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Warn, $($arg)+)
    };
}

/// Logs at [`Level::Error`](crate::Level::Error).
#[macro_export]
macro_rules! error {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Error, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Error, $($arg)+)
    };
}

/// Logs at [`Level::Fatal`](crate::Level::Fatal). Does not abort.
#[macro_export]
macro_rules! fatal {
    (logger: $logger:expr, $($arg:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Fatal, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log!($crate::Level::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn function_name_is_enclosing_path() {
        let name = crate::__function_name!();
        assert!(
            name.ends_with("macros::tests::function_name_is_enclosing_path"),
            "{name}"
        );
    }

    #[test]
    fn function_name_strips_closures() {
        let name = (|| crate::__function_name!())();
        assert!(name.ends_with("function_name_strips_closures"), "{name}");
    }

    #[test]
    fn location_captures_file_and_line() {
        let location = crate::__location!();
        assert!(location.file.ends_with("macros.rs"));
        assert_eq!(location.line, line!() - 2);
    }
}
