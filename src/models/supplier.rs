use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{contains_ci, nullable, Draft, Entity};
use crate::backend::{Order, Select};
use crate::viewmodel::ValidationError;

const FIELDS_REQUIRED: &str = "All fields are required";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub company_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_person: String,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_email: String,
    /// Maintained by the backend
    #[serde(default, deserialize_with = "nullable")]
    pub num_orders: i64,
}

impl Entity for Supplier {
    type Key = Uuid;
    type Draft = SupplierDraft;

    const TABLE: &'static str = "suppliers";
    const KEY_COLUMN: &'static str = "id";
    const NOUN: &'static str = "supplier";

    fn select() -> Select {
        Select::from(Self::TABLE).order(Order::asc("company_name"))
    }

    fn key(&self) -> Uuid {
        self.id
    }

    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.company_name, needle)
            || contains_ci(&self.contact_person, needle)
            || contains_ci(&self.contact_email, needle)
    }

    fn to_draft(&self) -> SupplierDraft {
        SupplierDraft {
            id: Some(self.id),
            company_name: self.company_name.clone(),
            contact_person: self.contact_person.clone(),
            contact_email: self.contact_email.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierDraft {
    pub id: Option<Uuid>,
    pub company_name: String,
    pub contact_person: String,
    pub contact_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierPayload {
    pub company_name: String,
    pub contact_person: String,
    pub contact_email: String,
}

impl Draft for SupplierDraft {
    type Key = Uuid;
    type Lookup = ();
    type Payload = SupplierPayload;

    fn key(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self, _: &()) -> Result<SupplierPayload, ValidationError> {
        let company_name = self.company_name.trim();
        let contact_person = self.contact_person.trim();
        let contact_email = self.contact_email.trim();

        if company_name.is_empty() || contact_person.is_empty() || contact_email.is_empty() {
            return Err(ValidationError::new(FIELDS_REQUIRED));
        }

        Ok(SupplierPayload {
            company_name: company_name.to_string(),
            contact_person: contact_person.to_string(),
            contact_email: contact_email.to_string(),
        })
    }
}

/// `id,company_name` projection used to populate supplier pickers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierOption {
    pub id: Uuid,
    pub company_name: String,
}
