//! Response envelope shared by every endpoint.

use serde::{Deserialize, Serialize};

/// `{ "data": T, "message": "..." }` as returned by the API.
///
/// Each endpoint declares its `T` once in [`LmsApi`](crate::LmsApi).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}
