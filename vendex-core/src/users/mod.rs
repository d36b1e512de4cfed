//! Account domain entities and the requests that create them.

pub mod user;

pub use user::{
    Gender, LoginRequest, RegisterRequest, Role, User, ValidationError, roles,
};
