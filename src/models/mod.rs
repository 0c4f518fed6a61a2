pub mod audit;
pub mod call;
pub mod picklist;
pub mod user;
