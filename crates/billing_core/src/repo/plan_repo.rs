//! Plan repository contract and SQLite implementation.

use super::{
    delete_protected, to_u32, EntityKind, RepoError, RepoResult, SqliteBillingRepository,
};
use crate::model::catalog::{Plan, PlanType};
use crate::model::PlanId;
use rusqlite::{params, Row};

const PLAN_SELECT_SQL: &str = "SELECT id, plan_type, discount_percent FROM plans";

/// Repository interface for pricing plans.
pub trait PlanRepository {
    fn create_plan(&self, plan: &mut Plan) -> RepoResult<PlanId>;
    fn update_plan(&self, plan: &Plan) -> RepoResult<()>;
    fn get_plan(&self, id: PlanId) -> RepoResult<Option<Plan>>;
    fn list_plans(&self) -> RepoResult<Vec<Plan>>;
    fn delete_plan(&self, id: PlanId) -> RepoResult<()>;
}

impl PlanRepository for SqliteBillingRepository<'_> {
    fn create_plan(&self, plan: &mut Plan) -> RepoResult<PlanId> {
        plan.validate()?;

        self.conn().execute(
            "INSERT INTO plans (plan_type, discount_percent) VALUES (?1, ?2);",
            params![plan.plan_type.as_str(), plan.discount_percent],
        )?;
        let id = self.conn().last_insert_rowid();
        plan.assign_id(id);
        Ok(id)
    }

    fn update_plan(&self, plan: &Plan) -> RepoResult<()> {
        let id = plan.id().ok_or(RepoError::Unsaved(EntityKind::Plan))?;
        plan.validate()?;

        let changed = self.conn().execute(
            "UPDATE plans SET plan_type = ?2, discount_percent = ?3 WHERE id = ?1;",
            params![id, plan.plan_type.as_str(), plan.discount_percent],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Plan,
                id,
            });
        }
        Ok(())
    }

    fn get_plan(&self, id: PlanId) -> RepoResult<Option<Plan>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{PLAN_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_plan_row(row)?));
        }
        Ok(None)
    }

    fn list_plans(&self) -> RepoResult<Vec<Plan>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{PLAN_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut plans = Vec::new();
        while let Some(row) = rows.next()? {
            plans.push(parse_plan_row(row)?);
        }
        Ok(plans)
    }

    fn delete_plan(&self, id: PlanId) -> RepoResult<()> {
        delete_protected(self.conn(), EntityKind::Plan, "plans", "plan_id", id)
    }
}

pub(crate) fn parse_plan_type(value: &str, column: &str) -> RepoResult<PlanType> {
    PlanType::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid plan type `{value}` in {column}")))
}

fn parse_plan_row(row: &Row<'_>) -> RepoResult<Plan> {
    let type_text: String = row.get("plan_type")?;
    let plan_type = parse_plan_type(&type_text, "plans.plan_type")?;
    let discount_percent = to_u32(row.get("discount_percent")?, "plans.discount_percent")?;

    let plan = Plan::from_storage(row.get("id")?, plan_type, discount_percent);
    plan.validate()?;
    Ok(plan)
}
