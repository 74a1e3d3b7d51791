use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};
use log::warn;
use std::collections::HashMap;

use super::provider::{AuthVerdict, MembershipProvider, ProviderError, UserAccount};

/// One `user:bcrypt-hash[:home]` line of the passwd file.
#[derive(Debug, Clone)]
pub struct PasswdEntry {
    username: String,
    hashed_password: String,
    home_dir: String,
}

impl PasswdEntry {
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let mut parts = line.splitn(3, ':');
        let username = parts.next()?.to_string();
        let hashed_password = parts.next()?.to_string();
        if username.is_empty() || hashed_password.is_empty() {
            return None;
        }
        let home_dir = parts
            .next()
            .filter(|h| !h.is_empty())
            .unwrap_or("/")
            .to_string();
        Some(PasswdEntry {
            username,
            hashed_password,
            home_dir,
        })
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Membership provider backed by a `user:hash[:home]` passwd file loaded at
/// startup.
pub struct PasswdFileProvider {
    entries: HashMap<String, PasswdEntry>,
    /// Hash verified for unknown users so a miss costs the same as a hit.
    dummy_hash: String,
}

impl PasswdFileProvider {
    pub fn load(path: &str) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_content(&content))
    }

    pub fn from_content(content: &str) -> Self {
        let mut entries = HashMap::new();
        for line in content.lines() {
            match PasswdEntry::from_line(line) {
                Some(entry) => {
                    entries.insert(entry.username.clone(), entry);
                }
                None if !line.trim().is_empty() && !line.trim_start().starts_with('#') => {
                    warn!("Skipping malformed passwd line");
                }
                None => {}
            }
        }
        let dummy_hash = hash_password("ferroftpd-dummy-password")
            .unwrap_or_else(|_| String::from("$2b$12$invalidinvalidinvalidinvalidinvalidinva"));
        Self {
            entries,
            dummy_hash,
        }
    }
}

#[async_trait]
impl MembershipProvider for PasswdFileProvider {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthVerdict, ProviderError> {
        // bcrypt is CPU-bound; keep it off the async workers.
        let (hashed, account) = match self.entries.get(username) {
            Some(entry) => (
                entry.hashed_password.clone(),
                Some(UserAccount {
                    username: entry.username.clone(),
                    home_dir: entry.home_dir.clone(),
                }),
            ),
            None => (self.dummy_hash.clone(), None),
        };
        let password = password.to_string();
        let ok = tokio::task::spawn_blocking(move || verify(&password, &hashed).unwrap_or(false))
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        match (ok, account) {
            (true, Some(account)) => Ok(AuthVerdict::Success(account)),
            _ => Ok(AuthVerdict::Denied),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_and_skips_comments() {
        let entry = PasswdEntry::from_line("alice:$2b$12$abc:/home/alice").unwrap();
        assert_eq!(entry.get_username(), "alice");
        assert_eq!(entry.home_dir, "/home/alice");

        assert!(PasswdEntry::from_line("# comment").is_none());
        assert!(PasswdEntry::from_line("").is_none());
        assert!(PasswdEntry::from_line("nohash").is_none());
    }

    #[tokio::test]
    async fn verifies_credentials() {
        let hashed = hash_password("hunter2").unwrap();
        let provider = PasswdFileProvider::from_content(&format!("bob:{}:/files", hashed));

        match provider.authenticate("bob", "hunter2").await.unwrap() {
            AuthVerdict::Success(account) => {
                assert_eq!(account.username, "bob");
                assert_eq!(account.home_dir, "/files");
            }
            other => panic!("unexpected verdict: {:?}", other),
        }

        assert!(matches!(
            provider.authenticate("bob", "wrong").await.unwrap(),
            AuthVerdict::Denied
        ));
        assert!(matches!(
            provider.authenticate("mallory", "hunter2").await.unwrap(),
            AuthVerdict::Denied
        ));
    }
}
