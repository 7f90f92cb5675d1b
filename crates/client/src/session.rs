use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Tokens of the logged-in member.
///
/// Cloning shares the same underlying session, so a refresh done through one
/// handle is seen by every other handle. Each client is given its own context
/// explicitly; nothing is stored globally.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    tokens: Arc<RwLock<Option<TokenPair>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        let session = Self::new();
        session.replace(tokens);
        session
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(|tokens| tokens.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(|tokens| tokens.refresh_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|_| ()).is_some()
    }

    pub fn replace(&self, tokens: TokenPair) {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
    }

    pub fn clear(&self) {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn read<T>(&self, f: impl FnOnce(&TokenPair) -> T) -> Option<T> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}
