//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func, SimpleExpr},
};
use shareslice_core::auth::LoginIdentifier;
use shareslice_shared::{AppError, types::PageRequest};
use uuid::Uuid;

use crate::entities::{offers, users};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found or deleted.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Username belongs to another active account.
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    /// Email belongs to another active account.
    #[error("Email '{0}' is already registered")]
    EmailTaken(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => Self::not_found("user", id),
            UserError::UsernameTaken(_) | UserError::EmailTaken(_) => {
                Self::Conflict(err.to_string())
            }
            UserError::Database(e) => crate::db_error_to_app(e),
        }
    }
}

/// Fields that may change on an existing user.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New username.
    pub username: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// New manager flag.
    pub is_manager: Option<bool>,
}

/// Case-insensitive username match.
fn username_eq(username: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(users::Column::Username))).eq(username.to_lowercase())
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an active user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await
    }

    /// Finds an active user by username, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(username_eq(username))
            .filter(users::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await
    }

    /// Finds an active user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .filter(users::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await
    }

    /// Resolves a login string to an active user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_login(
        &self,
        login: &LoginIdentifier,
    ) -> Result<Option<users::Model>, DbErr> {
        match login {
            LoginIdentifier::Email(email) => self.find_by_email(email).await,
            LoginIdentifier::Username(username) => self.find_by_username(username).await,
        }
    }

    /// Registers a user.
    ///
    /// A soft-deleted account with the same username and email is brought
    /// back with the new password instead of creating a second row. The
    /// reactivated account never keeps its manager role.
    ///
    /// # Errors
    ///
    /// Returns `UsernameTaken` or `EmailTaken` when an active account
    /// already uses either value.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<users::Model, UserError> {
        let email = email.to_lowercase();

        if self.find_by_username(username).await?.is_some() {
            return Err(UserError::UsernameTaken(username.to_string()));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(UserError::EmailTaken(email));
        }

        let now = chrono::Utc::now().into();

        let deleted = users::Entity::find()
            .filter(username_eq(username))
            .filter(users::Column::Email.eq(email.as_str()))
            .filter(users::Column::IsDeleted.eq(true))
            .order_by_desc(users::Column::UpdatedAt)
            .one(&self.db)
            .await?;

        if let Some(existing) = deleted {
            tracing::info!(user_id = %existing.id, "Reactivating deleted account");
            let user = users::ActiveModel {
                id: Set(existing.id),
                password_hash: Set(password_hash.to_string()),
                is_manager: Set(false),
                is_deleted: Set(false),
                updated_at: Set(now),
                ..Default::default()
            };
            return Ok(user.update(&self.db).await?);
        }

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email),
            password_hash: Set(password_hash.to_string()),
            is_manager: Set(false),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(user.insert(&self.db).await?)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing or deleted users and a conflict when
    /// the new username or email is taken.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let existing = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        let mut user: users::ActiveModel = existing.into();

        if let Some(username) = input.username {
            if let Some(other) = self.find_by_username(&username).await?
                && other.id != id
            {
                return Err(UserError::UsernameTaken(username));
            }
            user.username = Set(username);
        }
        if let Some(email) = input.email {
            let email = email.to_lowercase();
            if let Some(other) = self.find_by_email(&email).await?
                && other.id != id
            {
                return Err(UserError::EmailTaken(email));
            }
            user.email = Set(email);
        }
        if let Some(hash) = input.password_hash {
            user.password_hash = Set(hash);
        }
        if let Some(is_manager) = input.is_manager {
            user.is_manager = Set(is_manager);
        }
        user.updated_at = Set(chrono::Utc::now().into());

        Ok(user.update(&self.db).await?)
    }

    /// Marks a user as deleted and withdraws their open offers.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist or is already deleted.
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), UserError> {
        let now = chrono::Utc::now();
        let txn = self.db.begin().await?;

        let result = users::Entity::update_many()
            .col_expr(users::Column::IsDeleted, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::IsDeleted.eq(false))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(UserError::NotFound(id));
        }

        let withdrawn = offers::Entity::update_many()
            .col_expr(offers::Column::IsActive, Expr::value(false))
            .col_expr(offers::Column::UpdatedAt, Expr::value(now))
            .filter(offers::Column::UserId.eq(id))
            .filter(offers::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::debug!(
            user_id = %id,
            offers_withdrawn = withdrawn.rows_affected,
            "Withdrew offers of deleted user"
        );
        Ok(())
    }

    /// Lists active users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, page: PageRequest) -> Result<(Vec<users::Model>, u64), DbErr> {
        let query = users::Entity::find().filter(users::Column::IsDeleted.eq(false));

        let total = query.clone().count(&self.db).await?;
        let users = query
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((users, total))
    }

    /// Counts active users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_active(&self) -> Result<u64, DbErr> {
        users::Entity::find()
            .filter(users::Column::IsDeleted.eq(false))
            .count(&self.db)
            .await
    }
}
