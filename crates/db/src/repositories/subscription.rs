//! Subscription repository for database operations.
//!
//! Provider events are folded through the pure lifecycle transition and the
//! result upserted keyed by the provider's subscription id, all inside one
//! transaction. A partial unique index allows at most one slot-occupying row
//! per company; when a new subscription takes the slot, the previous row is
//! marked canceled first.

use chrono::Utc;
use projextpal_core::billing::{self, BillingEvent, SubscriptionState};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    NotSet, QueryFilter, Set, TransactionTrait,
};

use crate::entities::{sea_orm_active_enums, subscriptions};

const SLOT_STATUSES: [sea_orm_active_enums::SubscriptionStatus; 3] = [
    sea_orm_active_enums::SubscriptionStatus::Active,
    sea_orm_active_enums::SubscriptionStatus::Trialing,
    sea_orm_active_enums::SubscriptionStatus::PastDue,
];

/// Subscription repository for webhook application and slot queries.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    db: DatabaseConnection,
}

impl SubscriptionRepository {
    /// Creates a new subscription repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the company's slot-occupying subscription, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn active_for_company(
        &self,
        company_id: i64,
    ) -> Result<Option<subscriptions::Model>, DbErr> {
        subscriptions::Entity::find()
            .filter(subscriptions::Column::CompanyId.eq(company_id))
            .filter(subscriptions::Column::Status.is_in(SLOT_STATUSES))
            .one(&self.db)
            .await
    }

    /// Finds a subscription by its provider id, along with the owning
    /// company. Used to resolve webhook deliveries to a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_external_id(
        &self,
        external_subscription_id: &str,
    ) -> Result<Option<subscriptions::Model>, DbErr> {
        subscriptions::Entity::find()
            .filter(subscriptions::Column::ExternalSubscriptionId.eq(external_subscription_id))
            .one(&self.db)
            .await
    }

    /// Records the provider ids handed back by a checkout session, creating
    /// the incomplete row the later webhooks will fold into.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record_checkout(
        &self,
        company_id: i64,
        external_subscription_id: &str,
        external_customer_id: Option<&str>,
        price_id: &str,
    ) -> Result<subscriptions::Model, DbErr> {
        if let Some(existing) = self.find_by_external_id(external_subscription_id).await? {
            return Ok(existing);
        }

        let now = Utc::now().into();
        let row = subscriptions::ActiveModel {
            id: NotSet,
            company_id: Set(company_id),
            external_subscription_id: Set(Some(external_subscription_id.to_string())),
            external_customer_id: Set(external_customer_id.map(ToString::to_string)),
            price_id: Set(Some(price_id.to_string())),
            status: Set(sea_orm_active_enums::SubscriptionStatus::Incomplete),
            cancel_at_period_end: Set(false),
            current_period_start: Set(None),
            current_period_end: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        row.insert(&self.db).await
    }

    /// Applies one provider event to the company's subscription keyed by the
    /// provider id, inside a single transaction. Re-delivery of an event the
    /// state already reflects leaves the row untouched. Returns the row
    /// after application, or `None` when the event carries nothing to apply.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; the transaction rolls back.
    pub async fn apply_event(
        &self,
        company_id: i64,
        external_subscription_id: Option<&str>,
        event: &BillingEvent,
    ) -> Result<Option<subscriptions::Model>, DbErr> {
        let Some(external_id) = external_subscription_id else {
            return Ok(None);
        };
        if matches!(event, BillingEvent::Ignored(_)) {
            return Ok(None);
        }

        let txn = self.db.begin().await?;

        let existing = subscriptions::Entity::find()
            .filter(subscriptions::Column::ExternalSubscriptionId.eq(external_id))
            .one(&txn)
            .await?;

        let current = existing.as_ref().map(model_state);
        let next = billing::lifecycle::apply(current.as_ref(), event);

        // Redelivery: state already reflects the event.
        if current.as_ref() == Some(&next) {
            txn.commit().await?;
            return Ok(existing);
        }

        if next.status.occupies_active_slot() {
            cancel_other_slot_holders(&txn, company_id, external_id).await?;
        }

        let now = Utc::now().into();
        let model = match existing {
            Some(row) => {
                let mut active: subscriptions::ActiveModel = row.into();
                write_state(&mut active, &next);
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                let mut active = subscriptions::ActiveModel {
                    id: NotSet,
                    company_id: Set(company_id),
                    external_subscription_id: Set(Some(external_id.to_string())),
                    external_customer_id: Set(None),
                    price_id: Set(None),
                    status: Set(sea_orm_active_enums::SubscriptionStatus::Incomplete),
                    cancel_at_period_end: Set(false),
                    current_period_start: Set(None),
                    current_period_end: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                write_state(&mut active, &next);
                active.insert(&txn).await?
            }
        };

        txn.commit().await?;

        Ok(Some(model))
    }
}

/// Marks any slot-occupying row of the company under a different provider id
/// as canceled, freeing the partial unique slot before the new row takes it.
async fn cancel_other_slot_holders(
    txn: &DatabaseTransaction,
    company_id: i64,
    external_id: &str,
) -> Result<(), DbErr> {
    let holders = subscriptions::Entity::find()
        .filter(subscriptions::Column::CompanyId.eq(company_id))
        .filter(subscriptions::Column::Status.is_in(SLOT_STATUSES))
        .filter(subscriptions::Column::ExternalSubscriptionId.ne(external_id))
        .all(txn)
        .await?;

    for holder in holders {
        let mut active: subscriptions::ActiveModel = holder.into();
        active.status = Set(sea_orm_active_enums::SubscriptionStatus::Canceled);
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await?;
    }

    Ok(())
}

/// Reads a stored row into the pure lifecycle state.
fn model_state(model: &subscriptions::Model) -> SubscriptionState {
    SubscriptionState {
        status: model.status.clone().into(),
        price_id: model.price_id.clone(),
        current_period_start: model.current_period_start.map(|t| t.with_timezone(&Utc)),
        current_period_end: model.current_period_end.map(|t| t.with_timezone(&Utc)),
        cancel_at_period_end: model.cancel_at_period_end,
    }
}

/// Writes a lifecycle state onto an active model, leaving ids untouched.
fn write_state(active: &mut subscriptions::ActiveModel, state: &SubscriptionState) {
    active.status = Set(state.status.into());
    active.price_id = Set(state.price_id.clone());
    active.current_period_start = Set(state.current_period_start.map(Into::into));
    active.current_period_end = Set(state.current_period_end.map(Into::into));
    active.cancel_at_period_end = Set(state.cancel_at_period_end);
}
