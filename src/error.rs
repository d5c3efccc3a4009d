//! Error taxonomy shared by the single-layer store and the layered store.
//!
//! `NoSection` and `NoOption` propagate unchanged through
//! [`MasterIni`](crate::master::MasterIni); when they come from the layered
//! store they mean the name was absent in *both* layers.

use std::io;

/// Errors raised by [`Ini`](crate::ini::Ini) and
/// [`MasterIni`](crate::master::MasterIni) operations.
#[derive(Debug, thiserror::Error)]
pub enum IniError {
    /// The named section does not exist.
    #[error("No section: '{section}'")]
    NoSection { section: String },

    /// The section exists but does not hold the option, not even via defaults.
    /// `option` carries the name after key normalization.
    #[error("No option '{option}' in section: '{section}'")]
    NoOption { section: String, option: String },

    /// `add_section` was called with a name that is already present.
    #[error("Section '{section}' already exists")]
    DuplicateSection { section: String },

    /// An argument the operation cannot accept, such as an unspecified
    /// target layer for a stream load or a reserved section name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An option line appeared before any `[section]` header.
    #[error("{source_name}, line {line}: option before any section header: '{text}'")]
    MissingSectionHeader {
        source_name: String,
        line: usize,
        text: String,
    },

    /// A line that is neither a header, an option, a comment, nor a
    /// continuation.
    #[error("{source_name}, line {line}: could not parse: '{text}'")]
    Parse {
        source_name: String,
        line: usize,
        text: String,
    },

    /// Underlying I/O failure while reading a stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_error_messages() {
        let err = IniError::NoSection {
            section: "db".to_string(),
        };
        assert_eq!(err.to_string(), "No section: 'db'");

        let err = IniError::NoOption {
            section: "db".to_string(),
            option: "host".to_string(),
        };
        assert_eq!(err.to_string(), "No option 'host' in section: 'db'");
    }

    #[test]
    fn test_parse_error_names_source_and_line() {
        let err = IniError::Parse {
            source_name: "site.ini".to_string(),
            line: 7,
            text: "no separator here".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("site.ini"));
        assert!(msg.contains("line 7"));
    }
}
