//! Authentication and authorization for hospital staff
//!
//! Provides:
//! - JWT token generation and validation
//! - Staff roles and per-operation permissions
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;
pub mod roles;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput, TokenValidationResult};
pub use password::{check_password_policy, hash_password, verify_password, MIN_PASSWORD_LEN};
pub use roles::{is_operation_allowed, Operation, StaffRole};
