//! Subscription repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist subscriptions and their computed `price`/`comment` fields.
//! - Answer the fan-out queries used by change propagation
//!   (subscription ids per service and per plan).
//! - Provide the joined inputs that recalculation tasks need.
//!
//! # Invariants
//! - Create/update refuse references to missing clients, services or plans.
//! - Task write-backs (`set_subscription_price`, `set_subscription_comment`)
//!   touch only their own column.

use super::plan_repo::parse_plan_type;
use super::{ensure_exists, to_u32, EntityKind, RepoError, RepoResult, SqliteBillingRepository};
use crate::model::subscription::{
    PricingInputs, Subscription, SubscriptionDetail, COMMENT_MAX_CHARS,
};
use crate::model::{ClientId, ModelValidationError, PlanId, ServiceId, SubscriptionId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const SUBSCRIPTION_SELECT_SQL: &str = "SELECT
    id,
    client_id,
    service_id,
    plan_id,
    price,
    comment
FROM subscriptions";

/// Query options for listing subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionListQuery {
    pub client_id: Option<ClientId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for subscriptions.
pub trait SubscriptionRepository {
    /// Inserts the subscription and stores the assigned id on it.
    fn create_subscription(&self, subscription: &mut Subscription) -> RepoResult<SubscriptionId>;
    fn update_subscription(&self, subscription: &Subscription) -> RepoResult<()>;
    fn get_subscription(&self, id: SubscriptionId) -> RepoResult<Option<Subscription>>;
    /// Lists subscriptions ordered by id.
    fn list_subscriptions(&self, query: &SubscriptionListQuery) -> RepoResult<Vec<Subscription>>;
    /// Lists joined read models ordered by id.
    fn list_subscription_details(
        &self,
        query: &SubscriptionListQuery,
    ) -> RepoResult<Vec<SubscriptionDetail>>;
    fn subscription_ids_for_service(&self, service_id: ServiceId)
        -> RepoResult<Vec<SubscriptionId>>;
    fn subscription_ids_for_plan(&self, plan_id: PlanId) -> RepoResult<Vec<SubscriptionId>>;
    fn pricing_inputs(&self, id: SubscriptionId) -> RepoResult<Option<PricingInputs>>;
    fn set_subscription_price(&self, id: SubscriptionId, price: u32) -> RepoResult<()>;
    fn set_subscription_comment(&self, id: SubscriptionId, comment: &str) -> RepoResult<()>;
    /// Deletes one subscription and returns the removed record.
    fn delete_subscription(&self, id: SubscriptionId) -> RepoResult<Subscription>;
    /// Sum of `price` over all subscriptions.
    fn total_price_sum(&self) -> RepoResult<u64>;
}

impl SubscriptionRepository for SqliteBillingRepository<'_> {
    fn create_subscription(&self, subscription: &mut Subscription) -> RepoResult<SubscriptionId> {
        subscription.validate()?;
        ensure_references(self.conn(), subscription)?;

        self.conn().execute(
            "INSERT INTO subscriptions (
                client_id,
                service_id,
                plan_id,
                price,
                comment
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                subscription.client_id,
                subscription.service_id,
                subscription.plan_id,
                subscription.price,
                subscription.comment.as_str(),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        subscription.assign_id(id);
        Ok(id)
    }

    fn update_subscription(&self, subscription: &Subscription) -> RepoResult<()> {
        let id = subscription
            .id()
            .ok_or(RepoError::Unsaved(EntityKind::Subscription))?;
        subscription.validate()?;
        ensure_references(self.conn(), subscription)?;

        let changed = self.conn().execute(
            "UPDATE subscriptions
             SET
                client_id = ?2,
                service_id = ?3,
                plan_id = ?4,
                price = ?5,
                comment = ?6
             WHERE id = ?1;",
            params![
                id,
                subscription.client_id,
                subscription.service_id,
                subscription.plan_id,
                subscription.price,
                subscription.comment.as_str(),
            ],
        )?;
        ensure_changed(changed, id)
    }

    fn get_subscription(&self, id: SubscriptionId) -> RepoResult<Option<Subscription>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{SUBSCRIPTION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subscription_row(row)?));
        }
        Ok(None)
    }

    fn list_subscriptions(&self, query: &SubscriptionListQuery) -> RepoResult<Vec<Subscription>> {
        let (filter_sql, bind_values) = list_filter(query, "");
        let mut stmt = self
            .conn()
            .prepare(&format!("{SUBSCRIPTION_SELECT_SQL}{filter_sql}"))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut subscriptions = Vec::new();
        while let Some(row) = rows.next()? {
            subscriptions.push(parse_subscription_row(row)?);
        }
        Ok(subscriptions)
    }

    fn list_subscription_details(
        &self,
        query: &SubscriptionListQuery,
    ) -> RepoResult<Vec<SubscriptionDetail>> {
        let (filter_sql, bind_values) = list_filter(query, "s.");
        let mut stmt = self.conn().prepare(&format!(
            "SELECT
                s.id AS id,
                c.company_name AS client_name,
                sv.name AS service_name,
                p.plan_type AS plan_type,
                s.price AS price,
                s.comment AS comment
             FROM subscriptions s
             JOIN clients c ON c.id = s.client_id
             JOIN services sv ON sv.id = s.service_id
             JOIN plans p ON p.id = s.plan_id{filter_sql}"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut details = Vec::new();
        while let Some(row) = rows.next()? {
            let type_text: String = row.get("plan_type")?;
            details.push(SubscriptionDetail {
                id: row.get("id")?,
                client_name: row.get("client_name")?,
                service_name: row.get("service_name")?,
                plan_type: parse_plan_type(&type_text, "plans.plan_type")?,
                price: to_u32(row.get("price")?, "subscriptions.price")?,
                comment: row.get("comment")?,
            });
        }
        Ok(details)
    }

    fn subscription_ids_for_service(
        &self,
        service_id: ServiceId,
    ) -> RepoResult<Vec<SubscriptionId>> {
        ids_where(self.conn(), "service_id", service_id)
    }

    fn subscription_ids_for_plan(&self, plan_id: PlanId) -> RepoResult<Vec<SubscriptionId>> {
        ids_where(self.conn(), "plan_id", plan_id)
    }

    fn pricing_inputs(&self, id: SubscriptionId) -> RepoResult<Option<PricingInputs>> {
        let mut stmt = self.conn().prepare(
            "SELECT
                sv.full_price AS full_price,
                p.plan_type AS plan_type,
                p.discount_percent AS discount_percent
             FROM subscriptions s
             JOIN services sv ON sv.id = s.service_id
             JOIN plans p ON p.id = s.plan_id
             WHERE s.id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let type_text: String = row.get("plan_type")?;
        Ok(Some(PricingInputs {
            full_price: to_u32(row.get("full_price")?, "services.full_price")?,
            plan_type: parse_plan_type(&type_text, "plans.plan_type")?,
            discount_percent: to_u32(row.get("discount_percent")?, "plans.discount_percent")?,
        }))
    }

    fn set_subscription_price(&self, id: SubscriptionId, price: u32) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE subscriptions SET price = ?2 WHERE id = ?1;",
            params![id, price],
        )?;
        ensure_changed(changed, id)
    }

    fn set_subscription_comment(&self, id: SubscriptionId, comment: &str) -> RepoResult<()> {
        let actual_chars = comment.chars().count();
        if actual_chars > COMMENT_MAX_CHARS {
            return Err(RepoError::Validation(ModelValidationError::FieldTooLong {
                field: "comment",
                max_chars: COMMENT_MAX_CHARS,
                actual_chars,
            }));
        }

        let changed = self.conn().execute(
            "UPDATE subscriptions SET comment = ?2 WHERE id = ?1;",
            params![id, comment],
        )?;
        ensure_changed(changed, id)
    }

    fn delete_subscription(&self, id: SubscriptionId) -> RepoResult<Subscription> {
        let subscription = self
            .get_subscription(id)?
            .ok_or(RepoError::NotFound {
                entity: EntityKind::Subscription,
                id,
            })?;

        let changed = self
            .conn()
            .execute("DELETE FROM subscriptions WHERE id = ?1;", [id])?;
        ensure_changed(changed, id)?;
        Ok(subscription)
    }

    fn total_price_sum(&self) -> RepoResult<u64> {
        let total: i64 = self.conn().query_row(
            "SELECT COALESCE(SUM(price), 0) FROM subscriptions;",
            [],
            |row| row.get(0),
        )?;
        u64::try_from(total)
            .map_err(|_| RepoError::InvalidData(format!("negative price sum `{total}`")))
    }
}

fn ensure_references(conn: &Connection, subscription: &Subscription) -> RepoResult<()> {
    ensure_exists(conn, EntityKind::Client, "clients", subscription.client_id)?;
    ensure_exists(conn, EntityKind::Service, "services", subscription.service_id)?;
    ensure_exists(conn, EntityKind::Plan, "plans", subscription.plan_id)
}

fn ensure_changed(changed: usize, id: SubscriptionId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: EntityKind::Subscription,
            id,
        });
    }
    Ok(())
}

fn ids_where(conn: &Connection, column: &str, value: i64) -> RepoResult<Vec<SubscriptionId>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM subscriptions WHERE {column} = ?1 ORDER BY id ASC;"
    ))?;
    let ids = stmt
        .query_map([value], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn list_filter(query: &SubscriptionListQuery, alias: &str) -> (String, Vec<Value>) {
    let mut sql = String::from(" WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(client_id) = query.client_id {
        sql.push_str(&format!(" AND {alias}client_id = ?"));
        bind_values.push(Value::Integer(client_id));
    }

    sql.push_str(&format!(" ORDER BY {alias}id ASC"));

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }
    } else if query.offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.offset)));
    }

    (sql, bind_values)
}

fn parse_subscription_row(row: &Row<'_>) -> RepoResult<Subscription> {
    let subscription = Subscription::from_storage(
        row.get("id")?,
        row.get("client_id")?,
        row.get("service_id")?,
        row.get("plan_id")?,
        to_u32(row.get("price")?, "subscriptions.price")?,
        row.get("comment")?,
    );
    subscription.validate()?;
    Ok(subscription)
}
