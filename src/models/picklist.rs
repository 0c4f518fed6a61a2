use serde::{Deserialize, Serialize};

pub const CATEGORY_APPARATUS: &str = "apparatus";
pub const CATEGORY_CALL_TYPE: &str = "call_type";
pub const CATEGORY_TOWN: &str = "town";
pub const CATEGORY_RESPONDER_ROLE: &str = "responder_role";

/// Dropdown value. Soft-deleted through `active`, since old calls keep
/// pointing at retired apparatus by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picklist {
    pub id: i64,
    pub category: String,
    pub value: String,
    pub sort_order: i64,
    pub active: bool,
}
