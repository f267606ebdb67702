//! Client record referenced by subscriptions.

use super::validation::{require_max_chars, require_non_empty};
use super::{ClientId, ModelValidationError};
use serde::{Deserialize, Serialize};

pub const COMPANY_NAME_MAX_CHARS: usize = 100;
pub const FULL_ADDRESS_MAX_CHARS: usize = 100;

/// Customer that owns subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    id: Option<ClientId>,
    pub company_name: String,
    pub full_address: String,
}

impl Client {
    pub fn new(company_name: impl Into<String>, full_address: impl Into<String>) -> Self {
        Self {
            id: None,
            company_name: company_name.into(),
            full_address: full_address.into(),
        }
    }

    pub(crate) fn from_storage(id: ClientId, company_name: String, full_address: String) -> Self {
        Self {
            id: Some(id),
            company_name,
            full_address,
        }
    }

    pub fn id(&self) -> Option<ClientId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: ClientId) {
        self.id = Some(id);
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty("company_name", &self.company_name)?;
        require_max_chars("company_name", &self.company_name, COMPANY_NAME_MAX_CHARS)?;
        require_max_chars("full_address", &self.full_address, FULL_ADDRESS_MAX_CHARS)
    }
}

impl std::fmt::Display for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.company_name)
    }
}
