//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `AccountRepository` and `ProfileRepository` ports from the `core` crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use focuspoint_core::domain::{
    Note, ProfileRecord, ScheduleEvent, Task, User, UserCredentials, UserSettings,
};
use focuspoint_core::plan::PlanCache;
use focuspoint_core::ports::{AccountRepository, PortError, PortResult, ProfileRepository};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: Some(self.email),
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct ProfileRow {
    settings: Json<UserSettings>,
    tasks: Json<Vec<Task>>,
    schedule: Json<Vec<ScheduleEvent>>,
    notes: Json<Vec<Note>>,
    ai_plans: Json<PlanCache>,
    streak: i32,
    last_login_date: Option<NaiveDate>,
    has_onboarded: bool,
    updated_at: DateTime<Utc>,
}
impl ProfileRow {
    fn to_domain(self) -> ProfileRecord {
        ProfileRecord {
            settings: self.settings.0,
            tasks: self.tasks.0,
            schedule: self.schedule.0,
            notes: self.notes.0,
            ai_plans: self.ai_plans.0,
            streak: u32::try_from(self.streak).unwrap_or(0),
            last_login_date: self.last_login_date,
            has_onboarded: self.has_onboarded,
            updated_at: self.updated_at,
        }
    }
}

//=========================================================================================
// `AccountRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountRepository for DbAdapter {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error().and_then(|d| d.code()) {
            Some(code) if code == "23505" => {
                PortError::Conflict(format!("Email {email} is already registered"))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(CredentialsRecord::to_domain)
        .ok_or_else(|| PortError::NotFound(format!("User {email} not found")))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `ProfileRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileRepository for DbAdapter {
    async fn load_profile(&self, user_id: Uuid) -> PortResult<Option<ProfileRecord>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT settings, tasks, schedule, notes, ai_plans, streak, last_login_date, has_onboarded, updated_at \
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(ProfileRow::to_domain))
    }

    /// Replaces the whole row; the last write wins.
    async fn upsert_profile(&self, user_id: Uuid, record: &ProfileRecord) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO profiles \
                (user_id, settings, tasks, schedule, notes, ai_plans, streak, last_login_date, has_onboarded, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (user_id) DO UPDATE SET \
                settings = EXCLUDED.settings, \
                tasks = EXCLUDED.tasks, \
                schedule = EXCLUDED.schedule, \
                notes = EXCLUDED.notes, \
                ai_plans = EXCLUDED.ai_plans, \
                streak = EXCLUDED.streak, \
                last_login_date = EXCLUDED.last_login_date, \
                has_onboarded = EXCLUDED.has_onboarded, \
                updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id)
        .bind(Json(&record.settings))
        .bind(Json(&record.tasks))
        .bind(Json(&record.schedule))
        .bind(Json(&record.notes))
        .bind(Json(&record.ai_plans))
        .bind(i32::try_from(record.streak).unwrap_or(i32::MAX))
        .bind(record.last_login_date)
        .bind(record.has_onboarded)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        debug!(%user_id, "Profile upserted");
        Ok(())
    }
}
