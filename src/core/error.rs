//! Error handling for the Iris installer
//!
//! This module provides the typed error vocabulary and the user-facing error
//! report for the installer. The error system follows two rules:
//! 1. **Strongly-typed root causes** ([`IrisError`]) so callers can tell an
//!    integrity failure apart from an unreadable integrity statement
//! 2. **Context layers** added with [`anyhow::Context`] at stage boundaries
//!    (resolve, download, install, kill sweep, launch), keeping the typed root
//!    cause downcastable underneath
//!
//! # Error Categories
//!
//! - **Release metadata**: [`IrisError::Network`], [`IrisError::UnexpectedStatus`],
//!   [`IrisError::MalformedResponse`], [`IrisError::ArtifactNotFound`]
//! - **Artifact integrity**: [`IrisError::EmptyArtifact`],
//!   [`IrisError::UnsupportedDigestFormat`], [`IrisError::DigestMismatch`]
//! - **File system**: [`IrisError::Write`], [`IrisError::Read`]
//! - **Processes**: [`IrisError::ProcessEnumeration`],
//!   [`IrisError::ProcessTermination`], [`IrisError::Launch`]
//!
//! # Reporting
//!
//! [`user_friendly_error`] turns any [`anyhow::Error`] into an [`ErrorContext`]
//! carrying the context chain, details and a suggestion. `main` prints it to
//! standard output and exits with status 1.
//!
//! ```rust,no_run
//! use iris_installer::core::{IrisError, user_friendly_error};
//! use anyhow::Context;
//!
//! let result: anyhow::Result<()> = Err(IrisError::EmptyArtifact {
//!     url: "https://example.com/Iris.apk".to_string(),
//! })
//! .context("failed to download Iris.apk");
//!
//! if let Err(e) = result {
//!     user_friendly_error(e).display();
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Typed root causes for every failure the installer can report.
///
/// Variants carry owned strings rather than source errors so that the enum
/// stays [`Clone`] and can be re-wrapped into an [`ErrorContext`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrisError {
    /// Transport-level failure (DNS, connect, TLS, timeout, body read).
    #[error("Network request to {url} failed: {reason}")]
    Network {
        /// The URL that was requested
        url: String,
        /// The transport error message
        reason: String,
    },

    /// The server answered with a non-success HTTP status.
    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus {
        /// The URL that was requested
        url: String,
        /// The HTTP status code returned
        status: u16,
    },

    /// The release metadata body could not be parsed.
    #[error("Malformed release metadata from {url}: {reason}")]
    MalformedResponse {
        /// The URL the metadata came from
        url: String,
        /// The parser error message
        reason: String,
    },

    /// The release parsed but contains no asset with the expected name.
    #[error("Could not find {name} in the latest release")]
    ArtifactNotFound {
        /// The expected asset file name
        name: String,
    },

    /// The download succeeded but returned zero bytes.
    #[error("Downloaded artifact from {url} is empty")]
    EmptyArtifact {
        /// The URL the artifact was downloaded from
        url: String,
    },

    /// The declared digest does not use a recognised algorithm prefix.
    #[error("Unsupported digest format: {digest}")]
    UnsupportedDigestFormat {
        /// The digest string as published
        digest: String,
    },

    /// The computed digest disagrees with the declared one.
    #[error("Digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch {
        /// The digest published alongside the artifact
        expected: String,
        /// The digest computed over the downloaded bytes
        actual: String,
    },

    /// Writing the artifact to disk failed.
    #[error("Failed to write {path}: {reason}")]
    Write {
        /// The path being written
        path: String,
        /// The I/O error message
        reason: String,
    },

    /// Reading a file from disk failed.
    #[error("Failed to read {path}: {reason}")]
    Read {
        /// The path being read
        path: String,
        /// The I/O error message
        reason: String,
    },

    /// The process table could not be listed.
    #[error("Failed to list processes: {reason}")]
    ProcessEnumeration {
        /// Why enumeration failed
        reason: String,
    },

    /// A single process could not be terminated.
    #[error("Failed to terminate process {pid}: {reason}")]
    ProcessTermination {
        /// The PID that was targeted
        pid: i32,
        /// The errno or platform message
        reason: String,
    },

    /// The managed process could not be spawned, or exited with failure in
    /// the foreground.
    #[error("Failed to launch {command}: {reason}")]
    Launch {
        /// The program that was executed
        command: String,
        /// Why the launch failed
        reason: String,
    },

    /// Configuration file could not be used.
    #[error("Configuration error in {path}: {reason}")]
    Config {
        /// The configuration file path
        path: String,
        /// The parse or read error message
        reason: String,
    },

    /// Anything that has no dedicated variant.
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// User-facing error report.
///
/// Wraps the root [`IrisError`] together with the context layers that were
/// added on the way up (outermost first) and optional details and suggestion.
///
/// # Display Format
///
/// ```text
/// error: failed to install Iris
///   caused by: failed to download Iris.apk
///   caused by: Downloaded artifact from https://... is empty
/// details: ...
/// suggestion: ...
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying typed error
    pub error: IrisError,
    /// Context messages added around the error, outermost first
    pub chain: Vec<String>,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no chain, details or suggestion.
    #[must_use]
    pub const fn new(error: IrisError) -> Self {
        Self {
            error,
            chain: Vec::new(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach the context layers that surrounded the error.
    pub fn with_chain(mut self, chain: Vec<String>) -> Self {
        self.chain = chain;
        self
    }

    /// Print the report to standard output with terminal colors.
    ///
    /// - Headline: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        let mut lines = self.chain.iter().map(String::as_str).collect::<Vec<_>>();
        let root = self.error.to_string();
        lines.push(&root);

        println!("{}: {}", "error".red().bold(), lines[0]);
        for cause in &lines[1..] {
            println!("  {}: {}", "caused by".red(), cause);
        }

        if let Some(details) = &self.details {
            println!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            println!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for layer in &self.chain {
            write!(f, "{layer}: ")?;
        }
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// The typed root cause is found by downcasting through the context layers;
/// everything above it becomes the report's chain. Errors that carry no
/// [`IrisError`] are reported as [`IrisError::Other`] with their full chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let mut chain: Vec<String> = error.chain().map(ToString::to_string).collect();

    if let Some(iris_error) = error.downcast_ref::<IrisError>() {
        // The root error's own message is the last link
        chain.pop();
        return create_error_context(iris_error.clone()).with_chain(chain);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        chain.pop();
        return ErrorContext::new(IrisError::Other {
            message: io_error.to_string(),
        })
        .with_chain(chain)
        .with_suggestion("Run the installer as root (for example through 'su -c')");
    }

    let message = chain.pop().unwrap_or_default();
    ErrorContext::new(IrisError::Other {
        message,
    })
    .with_chain(chain)
}

fn create_error_context(error: IrisError) -> ErrorContext {
    match &error {
        IrisError::Network { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check the device's network connection and try again")
            .with_details("Requests time out after the configured HTTP timeout; nothing is retried"),

        IrisError::UnexpectedStatus { status, .. } => {
            let suggestion = if *status == 403 || *status == 429 {
                "The GitHub API rate limit may be exhausted. Wait a while before retrying"
            } else {
                "Check that the release URL in the configuration is correct"
            };
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }

        IrisError::MalformedResponse { .. } => ErrorContext::new(error.clone())
            .with_details("The release endpoint did not return the expected JSON document")
            .with_suggestion("Check that release_url points at a GitHub 'releases/latest' API endpoint"),

        IrisError::ArtifactNotFound { name } => ErrorContext::new(error.clone())
            .with_details(format!("The latest release has no asset named '{name}'"))
            .with_suggestion("The release may still be uploading. Try again later"),

        IrisError::EmptyArtifact { .. } => ErrorContext::new(error.clone())
            .with_details("The server returned an empty body instead of the artifact")
            .with_suggestion("Try the update again; the existing installation was left untouched"),

        IrisError::UnsupportedDigestFormat { .. } => ErrorContext::new(error.clone())
            .with_details("The release declares its digest with an algorithm this installer does not know")
            .with_suggestion("Update the installer itself to a newer version"),

        IrisError::DigestMismatch { .. } => ErrorContext::new(error.clone())
            .with_details("The downloaded artifact does not match its published digest. It was discarded and nothing was written")
            .with_suggestion("Retry the update. If this keeps happening the download may be tampered with"),

        IrisError::Write { path, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Check that the directory containing {path} exists and is writable")),

        IrisError::ProcessEnumeration { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check that 'ps' is available on this device"),

        IrisError::Launch { command, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Check that '{command}' is available and that the artifact is installed")),

        IrisError::Config { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Fix or remove the file named by IRIS_INSTALLER_CONFIG"),

        _ => ErrorContext::new(error.clone()),
    }
}
