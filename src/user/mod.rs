mod service;
mod store;

pub use service::*;
pub use store::*;

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const STUDENT_ID_PREFIX: &str = "IQD";

/// Closed set of roles an account can hold.
///
/// Authorization decisions live in the admin route layer; services treat
/// the role as data they are handed.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

/// User as saved on database.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct User {
    pub id: Uuid,
    pub student_id: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub occupation: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Role,
    pub preferred_language: String,
    pub email_verified: bool,
    pub profile_completion: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Generate a unique student ID: `IQD-YYYY-XXXXX`.
    pub fn generate_student_id() -> String {
        let year = Utc::now().year();
        let number = rand::thread_rng().gen_range(10_000..=99_999);

        format!("{STUDENT_ID_PREFIX}-{year}-{number}")
    }

    /// Profile completion percentage, floored.
    ///
    /// Counts the non-empty fields among full name, email, phone, country,
    /// occupation and profile picture.
    pub fn calculate_profile_completion(&self) -> i32 {
        let fields = [
            Some(&self.full_name),
            Some(&self.email),
            self.phone.as_ref(),
            self.country.as_ref(),
            self.occupation.as_ref(),
            self.profile_picture.as_ref(),
        ];
        let completed = fields
            .iter()
            .filter(|field| field.is_some_and(|value| !value.is_empty()))
            .count();

        (completed * 100 / fields.len()) as i32
    }
}
