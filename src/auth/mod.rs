//! Session credentials and token refresh.

pub mod credential;
pub mod refresh;

pub use credential::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredential};
pub use refresh::{RefreshCoordinator, RefreshOutcome, RefreshState, TokenRefresher};
