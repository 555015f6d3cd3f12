//! Expense repository for database operations.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use projextpal_core::{analytics::types::ExpenseRecord, forecast};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::expenses;

/// Expense repository feeding the cost collector and the forecaster.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a project's expenses, optionally restricted to an inclusive
    /// date range, ordered by expense date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn expenses_for(
        &self,
        project_id: i64,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<expenses::Model>, DbErr> {
        let mut query =
            expenses::Entity::find().filter(expenses::Column::ProjectId.eq(project_id));
        if let Some((from, to)) = range {
            query = query
                .filter(expenses::Column::ExpenseDate.gte(from))
                .filter(expenses::Column::ExpenseDate.lte(to));
        }
        query
            .order_by_asc(expenses::Column::ExpenseDate)
            .all(&self.db)
            .await
    }

    /// Loads a project's expenses as forecast records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn records_for(&self, project_id: i64) -> Result<Vec<ExpenseRecord>, DbErr> {
        let rows = self.expenses_for(project_id, None).await?;
        Ok(rows.into_iter().map(to_record).collect())
    }

    /// Sums a project's expenses per calendar month. All approval statuses
    /// count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn monthly_totals(
        &self,
        project_id: i64,
    ) -> Result<BTreeMap<NaiveDate, Decimal>, DbErr> {
        let records = self.records_for(project_id).await?;
        Ok(forecast::monthly_totals(&records))
    }
}

/// Maps a stored expense row into the collector record shape.
pub(crate) fn to_record(model: expenses::Model) -> ExpenseRecord {
    ExpenseRecord {
        id: model.id,
        amount: model.amount,
        date: model.expense_date,
        category: model.category,
        status: model.status.into(),
    }
}
