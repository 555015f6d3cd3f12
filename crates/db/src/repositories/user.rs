//! User repository for database operations.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};

use crate::entities::{companies, sea_orm_active_enums::UserRole, users};

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

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user by email (login path).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a user inside an existing company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        company_id: i64,
        email: &str,
        password_hash: &str,
        name: &str,
        role: UserRole,
        hourly_rate: Option<Decimal>,
    ) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();

        let user = users::ActiveModel {
            id: NotSet,
            company_id: Set(company_id),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            name: Set(name.to_string()),
            role: Set(role),
            hourly_rate: Set(hourly_rate),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Registers a new company with its first admin user in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if either insert fails; the transaction rolls back.
    pub async fn register_company_admin(
        &self,
        company_name: &str,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<(companies::Model, users::Model), DbErr> {
        let txn = self.db.begin().await?;

        let now = chrono::Utc::now().into();

        let company = companies::ActiveModel {
            id: NotSet,
            name: Set(company_name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let company = company.insert(&txn).await?;

        let user = users::ActiveModel {
            id: NotSet,
            company_id: Set(company.id),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            name: Set(name.to_string()),
            role: Set(UserRole::Admin),
            hourly_rate: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let user = user.insert(&txn).await?;

        txn.commit().await?;

        Ok((company, user))
    }
}
