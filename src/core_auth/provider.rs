use async_trait::async_trait;
use thiserror::Error;

/// The principal handed back by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub username: String,
    /// Home directory relative to the VFS root; `/` when unset.
    pub home_dir: String,
}

impl UserAccount {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            home_dir: String::from("/"),
        }
    }
}

#[derive(Debug)]
pub enum AuthVerdict {
    Success(UserAccount),
    /// Credentials check out but the provider wants an ACCT to finish.
    NeedsAccount(UserAccount),
    Denied,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("membership provider unavailable: {0}")]
    Unavailable(String),
}

/// The account/membership collaborator. Implementations may be slow; calls
/// happen off the hot path and never on a data-transfer task.
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Checking an unknown user should cost the same as checking a known
    /// one, to the extent the backing store permits.
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<AuthVerdict, ProviderError>;

    fn requires_account(&self, _account: &UserAccount) -> bool {
        false
    }
}
