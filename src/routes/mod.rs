//! HTTP route handlers

pub mod ai_action;
pub mod auth_routes;
pub mod common;
pub mod health;
pub mod incidents;
pub mod patients;

pub use ai_action::handle_ai_action;
pub use auth_routes::{handle_login, handle_me};
pub use common::{cors_preflight, error_response, json_response, not_found_response, BoxBody};
pub use health::handle_health;
pub use incidents::handle_list_incidents;
pub use patients::{
    handle_delete_patient, handle_list_patients, handle_patient_file, parse_patient_file_path,
};
