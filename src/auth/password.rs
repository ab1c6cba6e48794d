use std::sync::Arc;

use tracing::warn;

use super::AuthError;

/// bcrypt hashing, run on the blocking pool.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        let dummy_hash = bcrypt::hash("pressroom-unknown-account", cost)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Self {
            cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// A malformed stored hash counts as a mismatch.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let result = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        match result {
            Ok(matches) => Ok(matches),
            Err(e) => {
                warn!(error = %e, "stored password hash is unreadable");
                Ok(false)
            }
        }
    }

    /// Spend the same work as `verify` when there is no account to check against.
    pub async fn verify_absent(&self, password: &str) -> Result<(), AuthError> {
        let dummy = self.dummy_hash.clone();
        self.verify(password, &dummy).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = PasswordHasher::new(4).unwrap();
        let hash = hasher.hash("Correct-Horse1").await.unwrap();

        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("Correct-Horse1", &hash).await.unwrap());
        assert!(!hasher.verify("correct-horse1", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        let hasher = PasswordHasher::new(4).unwrap();
        assert!(!hasher.verify("anything", "not-a-bcrypt-hash").await.unwrap());
    }

    #[tokio::test]
    async fn verify_absent_succeeds_without_an_account() {
        let hasher = PasswordHasher::new(4).unwrap();
        hasher.verify_absent("whatever").await.unwrap();
    }
}
