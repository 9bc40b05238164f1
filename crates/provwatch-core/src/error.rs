use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    RecordParseError,
    MalformedEvent,
    OperationFetchFailed,
    SubscribeFailed,
    SubscriptionLost,
    EventQueueOverflow,
    DescriptionUnavailable,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::RecordParseError => "E1002",
            Self::MalformedEvent => "E2001",
            Self::OperationFetchFailed => "E3001",
            Self::SubscribeFailed => "E3002",
            Self::SubscriptionLost => "E3003",
            Self::EventQueueOverflow => "E3004",
            Self::DescriptionUnavailable => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::RecordParseError => "Recorded snapshot/operation parse error",
            Self::MalformedEvent => "Malformed event frame",
            Self::OperationFetchFailed => "Operation metadata fetch failed",
            Self::SubscribeFailed => "Event subscription failed to open",
            Self::SubscriptionLost => "Event subscription closed on error",
            Self::EventQueueOverflow => "Pre-snapshot event queue overflowed",
            Self::DescriptionUnavailable => "No description for this operation state",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in provwatch.toml and retry."),
            Self::RecordParseError => {
                Some("Check that the snapshot/operation JSON matches the API shape.")
            }
            Self::MalformedEvent => None,
            Self::OperationFetchFailed => {
                Some("Verify the operation id and API availability, then retry the watch.")
            }
            Self::SubscribeFailed => Some("Verify the channel key and event source availability."),
            Self::SubscriptionLost => {
                Some("Re-open the watch to resubscribe; late state is refetched on open.")
            }
            Self::EventQueueOverflow => {
                Some("Raise queue_cap in provwatch.toml if pre-snapshot bursts are expected.")
            }
            Self::DescriptionUnavailable => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::RecordParseError,
            ErrorCode::MalformedEvent,
            ErrorCode::OperationFetchFailed,
            ErrorCode::SubscribeFailed,
            ErrorCode::SubscriptionLost,
            ErrorCode::EventQueueOverflow,
            ErrorCode::DescriptionUnavailable,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::SubscriptionLost.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }
}
