//! Sub-check outcomes.

use std::fmt;

use crate::output::OutputSink;

/// The individual checks a probe can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    /// TCP (and TLS) connection to the POP3 server.
    Connection,
    /// POP3 login.
    Authentication,
    /// UIDL support.
    CapabilitySupport,
    /// STAT message count.
    MessageCount,
    /// OAuth client secrets file present.
    CredentialFound,
    /// Token file loaded.
    TokenLoaded,
    /// Cached token refreshed.
    TokenRefreshed,
    /// New token obtained through the browser.
    TokenObtained,
    /// Token written back to its file.
    TokenSaved,
    /// API service handle built.
    ServiceBuilt,
}

impl Check {
    /// Short name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Authentication => "authentication",
            Self::CapabilitySupport => "capability-support",
            Self::MessageCount => "message-count",
            Self::CredentialFound => "credential-found",
            Self::TokenLoaded => "token-loaded",
            Self::TokenRefreshed => "token-refreshed",
            Self::TokenObtained => "token-obtained",
            Self::TokenSaved => "token-saved",
            Self::ServiceBuilt => "service-built",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one sub-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Which check.
    pub check: Check,
    /// Whether it passed.
    pub passed: bool,
    /// Diagnostic shown to the operator.
    pub message: String,
}

impl CheckResult {
    /// A passed check.
    #[must_use]
    pub fn pass(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            passed: true,
            message: message.into(),
        }
    }

    /// A failed check.
    #[must_use]
    pub fn fail(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            passed: false,
            message: message.into(),
        }
    }
}

/// The checks one probe ran, and its verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    checks: Vec<CheckResult>,
    passed: bool,
}

impl ProbeReport {
    /// Creates an empty, failing report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints a result and keeps it.
    pub fn record(&mut self, sink: &dyn OutputSink, result: CheckResult) {
        if result.passed {
            sink.success(&result.message);
        } else {
            sink.error(&result.message);
        }
        self.checks.push(result);
    }

    /// Keeps a result that the caller has already reported.
    pub fn keep(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    /// Sets the verdict.
    pub const fn set_passed(&mut self, passed: bool) {
        self.passed = passed;
    }

    /// The probe verdict.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.passed
    }

    /// Every recorded check, in order.
    #[must_use]
    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    /// The result of `check`, if it ran.
    #[must_use]
    pub fn get(&self, check: Check) -> Option<&CheckResult> {
        self.checks.iter().find(|r| r.check == check)
    }

    /// Returns true if `check` ran and passed.
    #[must_use]
    pub fn check_passed(&self, check: Check) -> bool {
        self.get(check).is_some_and(|r| r.passed)
    }
}
