//! Persistence gateway adapters.
//!
//! Repositories borrow a connection, so they work equally on the pool for
//! reads and on an open `DatabaseTransaction` inside a unit of work.

mod content_type;
mod node;

pub use content_type::ContentTypeRepository;
pub use node::NodeRepository;
