/// Cross-platform logging macro with explicit level selection.
///
/// On native (non-WASM) builds it forwards to [`tracing`] macros.
/// In WASM builds (the browser extension) it forwards to log crate macros.
/// During tests it prints to `stdout`, preserving the log level for context.
///
/// # Examples
/// ```
/// use pdsls_redirect::cross_log;
/// # fn main() {
/// cross_log!(info, "Match: {}", "bsky");
/// cross_log!(warn, "slow response from {}", "plc.directory");
/// # }
/// ```
#[macro_export]
macro_rules! cross_log {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(all(not(test), target_arch = "wasm32"))]
        log::$level!($($arg)*);
        #[cfg(all(not(test), not(target_arch = "wasm32")))]
        tracing::$level!($($arg)*);
        #[cfg(test)]
        println!("[{}] {}", stringify!($level), format_args!($($arg)*));
    }};
}
