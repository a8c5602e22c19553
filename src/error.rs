//! Hard errors returned to kernel callers.
//!
//! Malformed or sloppy programs never produce a `KernelError`; they produce
//! [`Diagnostic`](crate::interpreter::Diagnostic)s alongside a best-effort
//! toolpath. `KernelError` is reserved for caller misuse and invalid machine
//! configuration.
//!
//! `KernelError` is serialized to `{ kind, message }` JSON payloads so host
//! IPC layers can forward it unchanged and pattern-match on `kind`.

/// Structural error returned by [`build`](crate::build), toolpath queries
/// and configuration parsing.
///
/// Serialized with serde's adjacently-tagged representation:
/// `{ "kind": "<variant>", "message": "<human-readable text>" }`
#[derive(Debug, Clone, PartialEq, thiserror::Error, serde::Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum KernelError {
    /// The program text contains no motion-bearing lines.
    #[error("program contains no motion commands")]
    EmptyProgram,

    /// A command index past the end of the toolpath was requested.
    #[error("{0}")]
    CommandIndexOutOfRange(String),

    /// The program is longer than the caller-imposed `max_lines`.
    #[error("{0}")]
    LineLimitExceeded(String),

    /// Machine parameters or offset tables failed to parse or validate.
    #[error("config error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for KernelError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_program_serializes_with_kind() {
        let value = serde_json::to_value(KernelError::EmptyProgram).expect("serialize");
        assert_eq!(value["kind"], "EmptyProgram");
    }

    #[test]
    fn index_out_of_range_serializes_to_kind_message() {
        let err = KernelError::CommandIndexOutOfRange("index 9 of 3".to_string());
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "CommandIndexOutOfRange");
        assert_eq!(value["message"], "index 9 of 3");
    }

    #[test]
    fn config_error_serializes_to_kind_message() {
        let err = KernelError::Config("rapid_feed must be positive".to_string());
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "Config");
        assert_eq!(value["message"], "rapid_feed must be positive");
    }

    #[test]
    fn from_toml_error_produces_config_variant() {
        let toml_err = toml::from_str::<toml::Table>("not = = toml").expect_err("invalid toml");
        let err = KernelError::from(toml_err);
        assert!(matches!(err, KernelError::Config(_)));
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            KernelError::EmptyProgram.to_string(),
            "program contains no motion commands"
        );
        assert_eq!(
            KernelError::LineLimitExceeded("program has 12 lines, limit is 10".to_string())
                .to_string(),
            "program has 12 lines, limit is 10"
        );
        assert_eq!(
            KernelError::Config("bad".to_string()).to_string(),
            "config error: bad"
        );
    }
}
