#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Id of the virtual root every top-level node hangs off.
pub const ROOT_ID: i32 = -1;

/// Id of the content recycle bin container.
pub const RECYCLE_BIN_CONTENT_ID: i32 = -20;

/// Id of the media recycle bin container.
pub const RECYCLE_BIN_MEDIA_ID: i32 = -21;

/// Separator between ids in a materialized path.
pub const PATH_SEPARATOR: char = ',';

/// The kind of tree entity stored in a node row.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Media items (images, files, folders).
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "media"))]
    Media,
    /// Content documents.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "content"))]
    Content,
}

impl NodeKind {
    pub const ALL: &'static [NodeKind] = &[Self::Media, Self::Content];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Media => "media",
            Self::Content => "content",
        }
    }

    /// Human-readable name used in audit descriptions.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Media => "Media",
            Self::Content => "Content",
        }
    }

    /// Id of the recycle bin container for this kind.
    pub fn recycle_bin_id(&self) -> i32 {
        match self {
            Self::Media => RECYCLE_BIN_MEDIA_ID,
            Self::Content => RECYCLE_BIN_CONTENT_ID,
        }
    }

    /// Materialized path of the recycle bin container, e.g. `-1,-21`.
    pub fn recycle_bin_path(&self) -> String {
        format!("{ROOT_ID}{PATH_SEPARATOR}{}", self.recycle_bin_id())
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "media" => Ok(Self::Media),
            "content" => Ok(Self::Content),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}
