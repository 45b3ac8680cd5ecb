//! POP3 extension capabilities (RFC 2449).

/// A single capability advertised in a CAPA response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// TOP command.
    Top,
    /// USER/PASS authentication.
    User,
    /// UIDL command.
    Uidl,
    /// SASL mechanisms accepted by AUTH (upper-cased).
    Sasl(Vec<String>),
    /// STLS (STARTTLS for POP3).
    Stls,
    /// Command pipelining.
    Pipelining,
    /// Extended response codes in brackets.
    RespCodes,
    /// Server implementation string.
    Implementation(String),
    /// Any other capability, kept verbatim.
    Other(String),
}

impl Capability {
    /// Parses one line of a CAPA listing.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Self::Other(String::new());
        };

        match keyword.to_ascii_uppercase().as_str() {
            "TOP" => Self::Top,
            "USER" => Self::User,
            "UIDL" => Self::Uidl,
            "SASL" => Self::Sasl(parts.map(str::to_ascii_uppercase).collect()),
            "STLS" => Self::Stls,
            "PIPELINING" => Self::Pipelining,
            "RESP-CODES" => Self::RespCodes,
            "IMPLEMENTATION" => Self::Implementation(parts.collect::<Vec<_>>().join(" ")),
            _ => Self::Other(line.trim().to_string()),
        }
    }
}

/// Capabilities advertised by the server.
///
/// Empty when the server does not implement CAPA.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    entries: Vec<Capability>,
}

impl Capabilities {
    /// Builds a capability set from CAPA lines.
    #[must_use]
    pub fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        Self {
            entries: lines
                .into_iter()
                .filter(|l| !l.as_ref().trim().is_empty())
                .map(|l| Capability::parse(l.as_ref()))
                .collect(),
        }
    }

    /// Returns true if nothing was advertised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the capability is present.
    #[must_use]
    pub fn contains(&self, cap: &Capability) -> bool {
        self.entries.contains(cap)
    }

    /// Returns true if `mechanism` is listed under SASL.
    #[must_use]
    pub fn supports_sasl(&self, mechanism: &str) -> bool {
        self.entries.iter().any(|c| match c {
            Capability::Sasl(mechs) => mechs.iter().any(|m| m.eq_ignore_ascii_case(mechanism)),
            _ => false,
        })
    }

    /// Iterates over the advertised capabilities.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_keywords() {
        assert_eq!(Capability::parse("TOP"), Capability::Top);
        assert_eq!(Capability::parse("uidl"), Capability::Uidl);
        assert_eq!(Capability::parse("RESP-CODES"), Capability::RespCodes);
    }

    #[test]
    fn test_parse_sasl() {
        assert_eq!(
            Capability::parse("SASL plain LOGIN"),
            Capability::Sasl(vec!["PLAIN".to_string(), "LOGIN".to_string()])
        );
    }

    #[test]
    fn test_parse_implementation() {
        assert_eq!(
            Capability::parse("IMPLEMENTATION Dovecot v2.3"),
            Capability::Implementation("Dovecot v2.3".to_string())
        );
    }

    #[test]
    fn test_unknown_kept_verbatim() {
        assert_eq!(
            Capability::parse("EXPIRE 30 USER"),
            Capability::Other("EXPIRE 30 USER".to_string())
        );
    }

    #[test]
    fn test_capabilities_sasl_lookup() {
        let caps = Capabilities::from_lines(["USER", "SASL PLAIN XOAUTH2", "UIDL"]);
        assert!(caps.supports_sasl("plain"));
        assert!(!caps.supports_sasl("CRAM-MD5"));
        assert!(caps.contains(&Capability::Uidl));
        assert!(!caps.contains(&Capability::Top));
    }

    #[test]
    fn test_empty_capabilities() {
        let caps = Capabilities::from_lines(Vec::<String>::new());
        assert!(caps.is_empty());
        assert!(!caps.supports_sasl("PLAIN"));
    }
}
