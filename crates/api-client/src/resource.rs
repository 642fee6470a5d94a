//! Backend collections reachable through the list endpoint contract

use std::fmt;
use std::str::FromStr;

/// Version prefix shared by all collection routes
pub const API_PREFIX: &str = "/api/v1";

/// A collection the backend exposes as a paged list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Assets,
    AssetTypes,
    Locations,
    Manufacturers,
    Statuses,
    Suppliers,
    Users,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Assets,
        Resource::AssetTypes,
        Resource::Locations,
        Resource::Manufacturers,
        Resource::Statuses,
        Resource::Suppliers,
        Resource::Users,
    ];

    /// Route segment, as used in the URL.
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Assets => "assets",
            Resource::AssetTypes => "asset-types",
            Resource::Locations => "locations",
            Resource::Manufacturers => "manufacturers",
            Resource::Statuses => "statuses",
            Resource::Suppliers => "suppliers",
            Resource::Users => "users",
        }
    }

    /// Collection path with trailing slash, e.g. `/api/v1/assets/`.
    pub fn path(&self) -> String {
        format!("{API_PREFIX}/{}/", self.name())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    /// Accepts the route name; `asset_types` is accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Resource::ALL.iter().map(|r| r.name()).collect();
                format!("unknown resource {s:?}, expected one of: {}", known.join(", "))
            })
    }
}
