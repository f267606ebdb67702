//! Service repository contract and SQLite implementation.

use super::{
    delete_protected, to_u32, EntityKind, RepoError, RepoResult, SqliteBillingRepository,
};
use crate::model::catalog::Service;
use crate::model::ServiceId;
use rusqlite::{params, Row};

const SERVICE_SELECT_SQL: &str = "SELECT id, name, full_price FROM services";

/// Repository interface for services.
///
/// Persistence only: change propagation lives in `CatalogService`.
pub trait ServiceRepository {
    fn create_service(&self, service: &mut Service) -> RepoResult<ServiceId>;
    fn update_service(&self, service: &Service) -> RepoResult<()>;
    fn get_service(&self, id: ServiceId) -> RepoResult<Option<Service>>;
    fn list_services(&self) -> RepoResult<Vec<Service>>;
    fn delete_service(&self, id: ServiceId) -> RepoResult<()>;
}

impl ServiceRepository for SqliteBillingRepository<'_> {
    fn create_service(&self, service: &mut Service) -> RepoResult<ServiceId> {
        service.validate()?;

        self.conn().execute(
            "INSERT INTO services (name, full_price) VALUES (?1, ?2);",
            params![service.name.as_str(), service.full_price],
        )?;
        let id = self.conn().last_insert_rowid();
        service.assign_id(id);
        Ok(id)
    }

    fn update_service(&self, service: &Service) -> RepoResult<()> {
        let id = service
            .id()
            .ok_or(RepoError::Unsaved(EntityKind::Service))?;
        service.validate()?;

        let changed = self.conn().execute(
            "UPDATE services SET name = ?2, full_price = ?3 WHERE id = ?1;",
            params![id, service.name.as_str(), service.full_price],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Service,
                id,
            });
        }
        Ok(())
    }

    fn get_service(&self, id: ServiceId) -> RepoResult<Option<Service>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{SERVICE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_service_row(row)?));
        }
        Ok(None)
    }

    fn list_services(&self) -> RepoResult<Vec<Service>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{SERVICE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut services = Vec::new();
        while let Some(row) = rows.next()? {
            services.push(parse_service_row(row)?);
        }
        Ok(services)
    }

    fn delete_service(&self, id: ServiceId) -> RepoResult<()> {
        delete_protected(self.conn(), EntityKind::Service, "services", "service_id", id)
    }
}

fn parse_service_row(row: &Row<'_>) -> RepoResult<Service> {
    let full_price = to_u32(row.get("full_price")?, "services.full_price")?;
    let service = Service::from_storage(row.get("id")?, row.get("name")?, full_price);
    service.validate()?;
    Ok(service)
}
