use async_trait::async_trait;

use super::provider::{AuthVerdict, MembershipProvider, ProviderError, UserAccount};

/// Accepts `anonymous` and `ftp` with any password (conventionally an email
/// address); everyone else is denied.
pub struct AnonymousProvider;

#[async_trait]
impl MembershipProvider for AnonymousProvider {
    async fn authenticate(
        &self,
        username: &str,
        _password: &str,
    ) -> Result<AuthVerdict, ProviderError> {
        match username.to_ascii_lowercase().as_str() {
            "anonymous" | "ftp" => Ok(AuthVerdict::Success(UserAccount::new("anonymous"))),
            _ => Ok(AuthVerdict::Denied),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_anonymous_and_ftp() {
        let provider = AnonymousProvider;
        assert!(matches!(
            provider.authenticate("anonymous", "x@y").await.unwrap(),
            AuthVerdict::Success(_)
        ));
        assert!(matches!(
            provider.authenticate("FTP", "").await.unwrap(),
            AuthVerdict::Success(_)
        ));
        assert!(matches!(
            provider.authenticate("root", "toor").await.unwrap(),
            AuthVerdict::Denied
        ));
    }
}
