//! SeaORM implementation of TransactionRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{db_err, decimal_column};
use crate::domain::payment::{Transaction, TransactionRepository, TransactionStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::transaction;

pub struct SeaOrmTransactionRepository {
    db: DatabaseConnection,
}

impl SeaOrmTransactionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: transaction::Model) -> DomainResult<Transaction> {
    Ok(Transaction {
        kind: m.kind.parse()?,
        amount: decimal_column("amount", &m.amount)?,
        status: m.status.parse()?,
        id: m.id,
        user_id: m.user_id,
        booking_id: m.booking_id,
        currency: m.currency,
        payment_method: m.payment_method,
        provider_id: m.provider_id,
        description: m.description,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn to_domain_list(models: Vec<transaction::Model>) -> DomainResult<Vec<Transaction>> {
    models.into_iter().map(model_to_domain).collect()
}

#[async_trait]
impl TransactionRepository for SeaOrmTransactionRepository {
    async fn insert(&self, t: Transaction) -> DomainResult<()> {
        debug!(
            "Recording {} {} for booking {}",
            t.kind.as_str(),
            t.id,
            t.booking_id
        );

        let existing = transaction::Entity::find_by_id(t.id.clone())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(DomainError::Conflict(format!(
                "transaction {} already exists",
                t.id
            )));
        }

        let model = transaction::ActiveModel {
            id: Set(t.id),
            user_id: Set(t.user_id),
            booking_id: Set(t.booking_id),
            kind: Set(t.kind.as_str().to_string()),
            amount: Set(t.amount.to_string()),
            currency: Set(t.currency),
            payment_method: Set(t.payment_method),
            provider_id: Set(t.provider_id),
            status: Set(t.status.as_str().to_string()),
            description: Set(t.description),
            created_at: Set(t.created_at),
            updated_at: Set(t.updated_at),
        };
        model.insert(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_for_user(&self, user_id: &str, id: &str) -> DomainResult<Option<Transaction>> {
        transaction::Entity::find()
            .filter(transaction::Column::Id.eq(id))
            .filter(transaction::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<Transaction>> {
        let models = transaction::Entity::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .order_by_desc(transaction::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        to_domain_list(models)
    }

    async fn list_for_user_by_status(
        &self,
        user_id: &str,
        status: TransactionStatus,
    ) -> DomainResult<Vec<Transaction>> {
        let models = transaction::Entity::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::Status.eq(status.as_str()))
            .order_by_desc(transaction::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        to_domain_list(models)
    }

    async fn list_for_booking(
        &self,
        user_id: &str,
        booking_id: &str,
    ) -> DomainResult<Vec<Transaction>> {
        let models = transaction::Entity::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::BookingId.eq(booking_id))
            .order_by_asc(transaction::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        to_domain_list(models)
    }

    async fn update_status(&self, t: &Transaction) -> DomainResult<()> {
        debug!("Transaction {} -> {}", t.id, t.status);

        let existing = transaction::Entity::find()
            .filter(transaction::Column::Id.eq(t.id.as_str()))
            .filter(transaction::Column::UserId.eq(t.user_id.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let Some(existing) = existing else {
            return Err(DomainError::not_found("Transaction", "id", &t.id));
        };

        let mut active: transaction::ActiveModel = existing.into();
        active.status = Set(t.status.as_str().to_string());
        active.provider_id = Set(t.provider_id.clone());
        active.updated_at = Set(t.updated_at);
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
