use super::Role;

/// Normalized authenticated identity, re-derived on every identity change
/// from the provider credential plus the persisted user record.
///
/// Sessions live for the UI session only and are deliberately not
/// serializable: they must never be cached to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub is_anonymous: bool,
    pub role: Role,
    /// True when the user record could not be fetched during resolution.
    /// A degraded session carries the fallback `Customer` role for display
    /// only; repositories re-verify the role before trusting it.
    pub degraded: bool,
}

impl Session {
    /// Whether this session's role can be used for authorization without
    /// re-fetching the user record.
    pub fn is_verified(&self) -> bool {
        !self.degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_session_is_not_verified() {
        let session = Session {
            id: "u1".to_string(),
            email: None,
            display_name: None,
            photo_url: None,
            is_anonymous: false,
            role: Role::Customer,
            degraded: true,
        };
        assert!(!session.is_verified());
    }
}
