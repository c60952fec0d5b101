pub mod config;
pub mod event;
pub mod hook;
pub mod node_kind;

pub use node_kind::{
    NodeKind, PATH_SEPARATOR, RECYCLE_BIN_CONTENT_ID, RECYCLE_BIN_MEDIA_ID, ROOT_ID,
};
