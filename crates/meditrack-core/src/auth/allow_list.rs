use crate::error::AuthError;

/// Email addresses permitted to finish sign-in. Comparison ignores case.
///
/// An empty list denies everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    emails: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    /// Parses a comma-separated list, as found in `ALLOWED_EMAILS`.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn is_configured(&self) -> bool {
        !self.emails.is_empty()
    }

    pub fn check(&self, email: &str) -> Result<(), AuthError> {
        if !self.is_configured() {
            return Err(AuthError::AllowListNotConfigured);
        }
        let wanted = email.trim().to_lowercase();
        if self.emails.iter().any(|e| *e == wanted) {
            Ok(())
        } else {
            Err(AuthError::NotAllowListed {
                email: email.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ignores_case_and_whitespace() {
        let list = AllowList::from_csv(" Alice@Example.com , bob@example.com,");
        assert!(list.check("alice@example.com").is_ok());
        assert!(list.check("BOB@EXAMPLE.COM").is_ok());
        assert!(matches!(
            list.check("eve@example.com"),
            Err(AuthError::NotAllowListed { .. })
        ));
    }

    #[test]
    fn empty_list_denies_everyone() {
        let list = AllowList::from_csv("  ,, ");
        assert!(!list.is_configured());
        assert!(matches!(
            list.check("alice@example.com"),
            Err(AuthError::AllowListNotConfigured)
        ));
    }
}
