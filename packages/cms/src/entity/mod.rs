pub mod audit_entry;
pub mod content_type;
pub mod node;
