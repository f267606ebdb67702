//! Client repository contract and SQLite implementation.

use super::{delete_protected, EntityKind, RepoError, RepoResult, SqliteBillingRepository};
use crate::model::client::Client;
use crate::model::ClientId;
use rusqlite::{params, OptionalExtension, Row};

/// Repository interface for client records.
pub trait ClientRepository {
    /// Inserts the client and stores the assigned id on it.
    fn create_client(&self, client: &mut Client) -> RepoResult<ClientId>;
    fn update_client(&self, client: &Client) -> RepoResult<()>;
    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>>;
    /// Fails with `RepoError::Protected` while subscriptions exist.
    fn delete_client(&self, id: ClientId) -> RepoResult<()>;
}

impl ClientRepository for SqliteBillingRepository<'_> {
    fn create_client(&self, client: &mut Client) -> RepoResult<ClientId> {
        client.validate()?;

        self.conn().execute(
            "INSERT INTO clients (company_name, full_address) VALUES (?1, ?2);",
            params![client.company_name.as_str(), client.full_address.as_str()],
        )?;
        let id = self.conn().last_insert_rowid();
        client.assign_id(id);
        Ok(id)
    }

    fn update_client(&self, client: &Client) -> RepoResult<()> {
        let id = client.id().ok_or(RepoError::Unsaved(EntityKind::Client))?;
        client.validate()?;

        let changed = self.conn().execute(
            "UPDATE clients SET company_name = ?2, full_address = ?3 WHERE id = ?1;",
            params![id, client.company_name.as_str(), client.full_address.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Client,
                id,
            });
        }
        Ok(())
    }

    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        let client = self
            .conn()
            .query_row(
                "SELECT id, company_name, full_address FROM clients WHERE id = ?1;",
                [id],
                parse_client_row,
            )
            .optional()?;
        Ok(client)
    }

    fn delete_client(&self, id: ClientId) -> RepoResult<()> {
        delete_protected(self.conn(), EntityKind::Client, "clients", "client_id", id)
    }
}

fn parse_client_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client::from_storage(
        row.get("id")?,
        row.get("company_name")?,
        row.get("full_address")?,
    ))
}
