//! Typed calls over the endpoint table.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use super::catalog::{
    Endpoint, GET_CURRENT_USER, GET_HOMEWORK, GET_TEST, LIST_HOMEWORK, LIST_TESTS, LIST_USERS,
    LOGIN, LOGOUT, REGISTER, SUBMIT_TEST, UPDATE_PROFILE, UPDATE_ROLE,
};
use crate::auth::StoredCredential;
use crate::cache::InvalidationPattern;
use crate::gateway::{FetchGateway, RequestOptions};
use crate::types::{
    ApiResponse, Homework, LoginData, LoginRequest, RegisterRequest, Role, RoleUpdate, Test,
    TestSubmission, TestSummary, User,
};
use crate::Result;

/// The LMS API as typed operations.
///
/// Every method returns the server's `{ data: T }` envelope. A rejected
/// session surfaces as an error whose [`is_unauthorized()`](crate::SatchelError::is_unauthorized)
/// is true.
#[derive(Clone)]
pub struct LmsApi {
    gateway: FetchGateway,
}

impl LmsApi {
    pub fn new(gateway: FetchGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &FetchGateway {
        &self.gateway
    }

    /// Log in and persist the issued access token.
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<ApiResponse<LoginData>> {
        let body = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        let response: ApiResponse<LoginData> =
            self.call(&LOGIN, LOGIN.path, Some(serde_json::to_value(&body)?)).await?;
        self.gateway
            .credentials()
            .save(&StoredCredential::issued_now(&response.data.access_token))?;
        info!(user = %response.data.user.id, "logged in");
        Ok(response)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<ApiResponse<User>> {
        self.call(&REGISTER, REGISTER.path, Some(serde_json::to_value(request)?))
            .await
    }

    /// Log out. Local credentials and cache are cleared whatever the
    /// server answers.
    pub async fn logout(&self) -> Result<()> {
        // The logout reply carries no `data`, only the raw payload is checked.
        let options = RequestOptions::new(LOGOUT.method.clone());
        let result = self
            .gateway
            .request(LOGOUT.path, &options, LOGOUT.skip_cache)
            .await;
        self.gateway.clear_session();
        info!("logged out");
        result.map(|_| ())
    }

    pub async fn get_current_user(&self) -> Result<ApiResponse<User>> {
        self.call(&GET_CURRENT_USER, GET_CURRENT_USER.path, None)
            .await
    }

    /// Patch the current user's profile with `changes`.
    pub async fn update_profile(&self, changes: Value) -> Result<ApiResponse<User>> {
        self.call(&UPDATE_PROFILE, UPDATE_PROFILE.path, Some(changes))
            .await
    }

    pub async fn update_role(&self, user_id: &str, role: Role) -> Result<ApiResponse<User>> {
        let body = serde_json::to_value(RoleUpdate { role })?;
        self.call(&UPDATE_ROLE, &UPDATE_ROLE.path_with(user_id), Some(body))
            .await
    }

    pub async fn list_users(&self) -> Result<ApiResponse<Vec<User>>> {
        self.call(&LIST_USERS, LIST_USERS.path, None).await
    }

    pub async fn list_tests(&self) -> Result<ApiResponse<Vec<TestSummary>>> {
        self.call(&LIST_TESTS, LIST_TESTS.path, None).await
    }

    pub async fn get_test(&self, test_id: &str) -> Result<ApiResponse<Test>> {
        self.call(&GET_TEST, &GET_TEST.path_with(test_id), None)
            .await
    }

    /// Submit answers; cached test responses are dropped afterwards.
    pub async fn submit_test(
        &self,
        test_id: &str,
        submission: &TestSubmission,
    ) -> Result<ApiResponse<Value>> {
        let body = serde_json::to_value(submission)?;
        let response = self
            .call(&SUBMIT_TEST, &SUBMIT_TEST.path_with(test_id), Some(body))
            .await?;
        self.gateway.invalidate(InvalidationPattern::Tests);
        Ok(response)
    }

    pub async fn list_homework(&self) -> Result<ApiResponse<Vec<Homework>>> {
        self.call(&LIST_HOMEWORK, LIST_HOMEWORK.path, None).await
    }

    pub async fn get_homework(&self, homework_id: &str) -> Result<ApiResponse<Homework>> {
        self.call(&GET_HOMEWORK, &GET_HOMEWORK.path_with(homework_id), None)
            .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse<T>> {
        let mut options = RequestOptions::new(endpoint.method.clone());
        options.body = body;
        self.gateway
            .request_envelope(path, &options, endpoint.skip_cache)
            .await
    }
}
