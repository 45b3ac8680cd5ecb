//! Per-account configuration resolved from `ACCOUNTn_` settings.

use std::fmt;
use std::path::PathBuf;

use relaycheck_pop3::DEFAULT_TLS_PORT;

use crate::settings::SettingsSource;

/// Settings key holding the number of accounts.
pub const ACCOUNT_COUNT_KEY: &str = "ACCOUNT_COUNT";

/// A required per-account setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    /// `POP3_HOST`.
    Pop3Host,
    /// `POP3_USERNAME`.
    Pop3Username,
    /// `POP3_PASSWORD`.
    Pop3Password,
    /// `GMAIL_CREDENTIALS_FILE`.
    GmailCredentialsFile,
    /// `GMAIL_TOKEN_FILE`.
    GmailTokenFile,
    /// `GMAIL_TARGET_EMAIL`.
    GmailTargetEmail,
}

impl RequiredField {
    /// All required fields, in report order.
    pub const ALL: [Self; 6] = [
        Self::Pop3Host,
        Self::Pop3Username,
        Self::Pop3Password,
        Self::GmailCredentialsFile,
        Self::GmailTokenFile,
        Self::GmailTargetEmail,
    ];

    /// Settings key suffix after the `ACCOUNTn_` prefix.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Pop3Host => "POP3_HOST",
            Self::Pop3Username => "POP3_USERNAME",
            Self::Pop3Password => "POP3_PASSWORD",
            Self::GmailCredentialsFile => "GMAIL_CREDENTIALS_FILE",
            Self::GmailTokenFile => "GMAIL_TOKEN_FILE",
            Self::GmailTargetEmail => "GMAIL_TARGET_EMAIL",
        }
    }

    /// Field name used in diagnostics.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Pop3Host => "pop3_host",
            Self::Pop3Username => "pop3_username",
            Self::Pop3Password => "pop3_password",
            Self::GmailCredentialsFile => "gmail_credentials_file",
            Self::GmailTokenFile => "gmail_token_file",
            Self::GmailTargetEmail => "gmail_target_email",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Everything needed to check one account.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// 1-based account number.
    pub ordinal: u32,
    /// POP3 server host.
    pub pop3_host: String,
    /// POP3 server port.
    pub pop3_port: u16,
    /// Use implicit TLS.
    pub pop3_use_tls: bool,
    /// Verify the server certificate.
    pub pop3_verify_cert: bool,
    /// POP3 username.
    pub pop3_username: String,
    /// POP3 password.
    pub pop3_password: String,
    /// OAuth client secrets file.
    pub credentials_file: PathBuf,
    /// Per-account token cache.
    pub token_file: PathBuf,
    /// Mailbox the importer writes into.
    pub target_email: String,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("ordinal", &self.ordinal)
            .field("pop3_host", &self.pop3_host)
            .field("pop3_port", &self.pop3_port)
            .field("pop3_use_tls", &self.pop3_use_tls)
            .field("pop3_verify_cert", &self.pop3_verify_cert)
            .field("pop3_username", &self.pop3_username)
            .field("credentials_file", &self.credentials_file)
            .field("token_file", &self.token_file)
            .field("target_email", &self.target_email)
            .finish_non_exhaustive()
    }
}

/// What the settings say about one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountResolution {
    /// `ENABLED` is false or absent.
    Disabled,
    /// Enabled, but required settings are missing.
    Invalid(Vec<RequiredField>),
    /// Enabled and complete.
    Ready(AccountConfig),
}

/// Returns the settings key prefix for an account.
#[must_use]
pub fn account_prefix(ordinal: u32) -> String {
    format!("ACCOUNT{ordinal}_")
}

/// Reads `ACCOUNT_COUNT`, defaulting to 1. Negative counts read as zero.
#[must_use]
pub fn account_count<S: SettingsSource + ?Sized>(settings: &S) -> u32 {
    let count = settings.get_int(ACCOUNT_COUNT_KEY, 1);
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

/// Builds the configuration of account `ordinal`.
///
/// A disabled account reads nothing past `ENABLED`. Every missing required
/// field is reported, not just the first.
pub fn resolve_account<S: SettingsSource + ?Sized>(
    ordinal: u32,
    settings: &S,
) -> AccountResolution {
    let prefix = account_prefix(ordinal);
    let key = |suffix: &str| format!("{prefix}{suffix}");

    if !settings.get_bool(&key("ENABLED"), false) {
        return AccountResolution::Disabled;
    }

    let mut missing = Vec::new();
    let mut required = |field: RequiredField| {
        let value = settings
            .get_string(&key(field.key()))
            .filter(|v| !v.is_empty());
        if value.is_none() {
            missing.push(field);
        }
        value.unwrap_or_default()
    };

    let pop3_host = required(RequiredField::Pop3Host);
    let pop3_username = required(RequiredField::Pop3Username);
    let pop3_password = required(RequiredField::Pop3Password);
    let credentials_file = required(RequiredField::GmailCredentialsFile);
    let token_file = required(RequiredField::GmailTokenFile);
    let target_email = required(RequiredField::GmailTargetEmail);

    if !missing.is_empty() {
        return AccountResolution::Invalid(missing);
    }

    let port = settings.get_int(&key("POP3_PORT"), i64::from(DEFAULT_TLS_PORT));

    AccountResolution::Ready(AccountConfig {
        ordinal,
        pop3_host,
        pop3_port: u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .unwrap_or(DEFAULT_TLS_PORT),
        pop3_use_tls: settings.get_bool(&key("POP3_USE_SSL"), true),
        pop3_verify_cert: settings.get_bool(&key("POP3_VERIFY_CERT"), true),
        pop3_username,
        pop3_password,
        credentials_file: PathBuf::from(credentials_file),
        token_file: PathBuf::from(token_file),
        target_email,
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::settings::MapSettings;

    fn complete(ordinal: u32) -> MapSettings {
        let p = account_prefix(ordinal);
        MapSettings::from_pairs([
            (format!("{p}ENABLED"), "true".to_string()),
            (format!("{p}POP3_HOST"), "pop.example.com".to_string()),
            (format!("{p}POP3_USERNAME"), "alice".to_string()),
            (format!("{p}POP3_PASSWORD"), "wonderland".to_string()),
            (format!("{p}GMAIL_CREDENTIALS_FILE"), "credentials.json".to_string()),
            (format!("{p}GMAIL_TOKEN_FILE"), "tokens/account1.json".to_string()),
            (format!("{p}GMAIL_TARGET_EMAIL"), "alice@gmail.com".to_string()),
        ])
    }

    #[test]
    fn test_disabled_by_default() {
        let settings = MapSettings::new();
        assert_eq!(resolve_account(1, &settings), AccountResolution::Disabled);
    }

    #[test]
    fn test_disabled_with_unrecognised_value() {
        let mut settings = complete(1);
        settings.set("ACCOUNT1_ENABLED", "enabled");
        assert_eq!(resolve_account(1, &settings), AccountResolution::Disabled);
    }

    #[test]
    fn test_complete_account_with_defaults() {
        let AccountResolution::Ready(config) = resolve_account(1, &complete(1)) else {
            panic!("expected a ready account");
        };
        assert_eq!(config.ordinal, 1);
        assert_eq!(config.pop3_port, 995);
        assert!(config.pop3_use_tls);
        assert!(config.pop3_verify_cert);
        assert_eq!(config.token_file, PathBuf::from("tokens/account1.json"));
    }

    #[test]
    fn test_reports_every_missing_field() {
        let settings = MapSettings::from_pairs([
            ("ACCOUNT2_ENABLED", "on"),
            ("ACCOUNT2_POP3_HOST", "pop.example.com"),
            ("ACCOUNT2_POP3_PASSWORD", ""),
            ("ACCOUNT2_GMAIL_TOKEN_FILE", "t.json"),
        ]);
        assert_eq!(
            resolve_account(2, &settings),
            AccountResolution::Invalid(vec![
                RequiredField::Pop3Username,
                RequiredField::Pop3Password,
                RequiredField::GmailCredentialsFile,
                RequiredField::GmailTargetEmail,
            ])
        );
    }

    #[test]
    fn test_only_empty_values_are_missing() {
        let settings = MapSettings::from_pairs([
            ("ACCOUNT1_ENABLED", "true"),
            ("ACCOUNT1_POP3_HOST", " "),
            ("ACCOUNT1_POP3_USERNAME", "user"),
            ("ACCOUNT1_POP3_PASSWORD", "  secret "),
            ("ACCOUNT1_GMAIL_CREDENTIALS_FILE", "c.json"),
            ("ACCOUNT1_GMAIL_TOKEN_FILE", "t.json"),
            ("ACCOUNT1_GMAIL_TARGET_EMAIL", ""),
        ]);
        assert_eq!(
            resolve_account(1, &settings),
            AccountResolution::Invalid(vec![RequiredField::GmailTargetEmail])
        );
    }

    #[test]
    fn test_port_fallbacks() {
        for (raw, expected) in [
            ("110", 110),
            ("abc", 995),
            ("0", 995),
            ("-1", 995),
            ("70000", 995),
            ("65535", 65535),
        ] {
            let mut settings = complete(1);
            settings.set("ACCOUNT1_POP3_PORT", raw);
            let AccountResolution::Ready(config) = resolve_account(1, &settings) else {
                panic!("expected a ready account");
            };
            assert_eq!(config.pop3_port, expected, "{raw}");
        }
    }

    #[test]
    fn test_tls_flags() {
        let mut settings = complete(1);
        settings.set("ACCOUNT1_POP3_USE_SSL", "false");
        settings.set("ACCOUNT1_POP3_VERIFY_CERT", "No");
        let AccountResolution::Ready(config) = resolve_account(1, &settings) else {
            panic!("expected a ready account");
        };
        assert!(!config.pop3_use_tls);
        assert!(!config.pop3_verify_cert);
    }

    #[test]
    fn test_account_count() {
        assert_eq!(account_count(&MapSettings::new()), 1);
        assert_eq!(account_count(&MapSettings::from_pairs([("ACCOUNT_COUNT", "3")])), 3);
        assert_eq!(account_count(&MapSettings::from_pairs([("ACCOUNT_COUNT", "-2")])), 0);
        assert_eq!(account_count(&MapSettings::from_pairs([("ACCOUNT_COUNT", "x")])), 1);
    }

    #[test]
    fn test_debug_hides_password() {
        let AccountResolution::Ready(config) = resolve_account(1, &complete(1)) else {
            panic!("expected a ready account");
        };
        assert!(!format!("{config:?}").contains("wonderland"));
    }
}
