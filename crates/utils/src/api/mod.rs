pub mod identity;
pub mod notes;
