use super::Collection;
use crate::models::Supplier;

/// Suppliers screen, ordered by company name
pub type SuppliersPage = Collection<Supplier>;
