//! Structured log helpers.
//!
//! Directive log lines always carry the same identifying fields so that a
//! single directive can be followed across registration, publish and
//! resolution:
//! - `correlation_id`: the directive's correlation ID
//! - `account`: tenant account number
//! - `node_id`: target node
//! - additional context fields

/// Log a directive-related event with standard fields.
#[macro_export]
macro_rules! log_directive_event {
    ($level:ident, $msg:expr, $correlation_id:expr, $account:expr, $node_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            correlation_id = %$correlation_id,
            account = %$account,
            node_id = %$node_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a connectivity-probe event with standard fields.
#[macro_export]
macro_rules! log_probe_event {
    ($level:ident, $msg:expr, $account:expr, $node_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            account = %$account,
            node_id = %$node_id,
            $($($field)*,)?
            $msg
        )
    };
}
