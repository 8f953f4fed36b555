//! Service Kinds
//!
//! The closed set of cloud-service icon types that populate the arena.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cloud-service type represented by an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Compute node
    Compute,
    /// Storage bucket
    Storage,
    /// Network boundary
    NetworkBoundary,
    /// Function runtime
    Function,
    /// Block volume
    BlockVolume,
    /// Relational database
    Database,
    /// Identity role
    IdentityRole,
    /// Key-value table
    KeyValueTable,
    /// Request router
    Router,
    /// Content-delivery edge
    EdgeCache,
    /// Scaling controller
    ScalingController,
}

impl ServiceKind {
    /// Every kind, in display order.
    pub const ALL: [ServiceKind; 11] = [
        ServiceKind::Compute,
        ServiceKind::Storage,
        ServiceKind::NetworkBoundary,
        ServiceKind::Function,
        ServiceKind::BlockVolume,
        ServiceKind::Database,
        ServiceKind::IdentityRole,
        ServiceKind::KeyValueTable,
        ServiceKind::Router,
        ServiceKind::EdgeCache,
        ServiceKind::ScalingController,
    ];

    /// Returns all kind variants.
    pub fn all() -> &'static [ServiceKind] {
        &Self::ALL
    }

    /// Stable snake_case key, identical to the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            ServiceKind::Compute => "compute",
            ServiceKind::Storage => "storage",
            ServiceKind::NetworkBoundary => "network_boundary",
            ServiceKind::Function => "function",
            ServiceKind::BlockVolume => "block_volume",
            ServiceKind::Database => "database",
            ServiceKind::IdentityRole => "identity_role",
            ServiceKind::KeyValueTable => "key_value_table",
            ServiceKind::Router => "router",
            ServiceKind::EdgeCache => "edge_cache",
            ServiceKind::ScalingController => "scaling_controller",
        }
    }

    /// Human-readable label used in milestone keys and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::Compute => "Compute",
            ServiceKind::Storage => "Storage",
            ServiceKind::NetworkBoundary => "NetworkBoundary",
            ServiceKind::Function => "Function",
            ServiceKind::BlockVolume => "BlockVolume",
            ServiceKind::Database => "Database",
            ServiceKind::IdentityRole => "IdentityRole",
            ServiceKind::KeyValueTable => "KeyValueTable",
            ServiceKind::Router => "Router",
            ServiceKind::EdgeCache => "EdgeCache",
            ServiceKind::ScalingController => "ScalingController",
        }
    }

    /// Fallback fill colour for renderers that have no sprite for this kind.
    pub fn display_color(&self) -> [u8; 3] {
        match self {
            ServiceKind::Compute => [255, 153, 0],
            ServiceKind::Storage => [227, 86, 0],
            ServiceKind::NetworkBoundary => [138, 180, 248],
            ServiceKind::Function => [250, 146, 3],
            ServiceKind::BlockVolume => [255, 153, 153],
            ServiceKind::Database => [0, 128, 128],
            ServiceKind::IdentityRole => [255, 215, 0],
            ServiceKind::KeyValueTable => [54, 150, 215],
            ServiceKind::Router => [150, 0, 150],
            ServiceKind::EdgeCache => [255, 99, 71],
            ServiceKind::ScalingController => [76, 175, 80],
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string names no known kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKindError(pub String);

impl fmt::Display for ParseKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown service kind: {}", self.0)
    }
}

impl std::error::Error for ParseKindError {}

impl FromStr for ServiceKind {
    type Err = ParseKindError;

    /// Accepts either the snake_case key or the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ServiceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.key() == trimmed || kind.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseKindError(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches_serde_name() {
        for kind in ServiceKind::all() {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.key()));
        }
    }

    #[test]
    fn test_parse_key_and_label() {
        assert_eq!("network_boundary".parse::<ServiceKind>(), Ok(ServiceKind::NetworkBoundary));
        assert_eq!("EdgeCache".parse::<ServiceKind>(), Ok(ServiceKind::EdgeCache));
        assert_eq!("router".parse::<ServiceKind>(), Ok(ServiceKind::Router));
        assert!("mainframe".parse::<ServiceKind>().is_err());
    }
}
