//! Public types for the LMS API.

mod coursework;
mod envelope;
mod user;

pub use coursework::{Homework, Question, Test, TestSubmission, TestSummary};
pub use envelope::ApiResponse;
pub use user::{LoginData, LoginRequest, RegisterRequest, Role, RoleUpdate, User};
