use std::collections::BTreeMap;

use thiserror::Error;
use url::Url;

use crate::model::Record;

pub const PAGE_ROOT: &str = "pages/plants";
pub const DEFAULT_FALLBACK_ROUTE: &str = "herb/annual_herb.html";
pub const SCRIPT_SUFFIX: &str = "/assets/js/search.js";

pub const DEFAULT_ROUTES: [(&str, &str); 23] = [
    ("evergreen_trees", "tree/evergreen_tree.html"),
    ("deciduous_trees", "tree/deciduous_tree.html"),
    ("fruit_trees", "tree/fruit_tree.html"),
    ("ornamental_trees", "tree/ornamental_tree.html"),
    ("timber_trees", "tree/timber_tree.html"),
    ("annual_herbs", "herb/annual_herb.html"),
    ("biennial_herbs", "herb/biennial_herb.html"),
    ("culinary_herbs", "herb/culinary_herb.html"),
    ("medicinal_herbs", "herb/medicinal_herb.html"),
    ("perennial_herbs", "herb/perennial_herb.html"),
    ("deciduous_shrubs", "shrub/deciduous_shrub.html"),
    ("evergreen_shrubs", "shrub/evergreen_shrub.html"),
    ("flowering_shrubs", "shrub/flowering_shrub.html"),
    ("foliage_shrubs", "shrub/foliage_shrub.html"),
    ("medicinal_shrubs", "shrub/medicinal_shrub.html"),
    ("flowering_climbers", "climber/flowering_climber.html"),
    ("hook_climbers", "climber/hook_climber.html"),
    ("root_climbers", "climber/root_climber.html"),
    ("tendril_climbers", "climber/tendril_climber.html"),
    ("twining_climbers", "climber/twining_climber.html"),
    ("ground-cover_Creepers", "creeper/ground-cover_creeper.html"),
    ("medicinal_creepers", "creeper/medicinal_creeper.html"),
    ("vegetable_creepers", "creeper/vegetable_creeper.html"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no route for partitions: {}", .0.join(", "))]
    MissingRoutes(Vec<String>),
    #[error("invalid base location '{0}'")]
    InvalidBase(String),
    #[error("invalid destination url: {0}")]
    InvalidUrl(String),
}

/// Where the widget is installed; every destination is built under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseLocation(String);

impl BaseLocation {
    pub fn parse(base: &str) -> Result<Self, RoutingError> {
        let trimmed = base.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|_| RoutingError::InvalidBase(base.to_string()))?;
        Ok(Self(trimmed.to_string()))
    }

    /// Prefers the widget script's own URL, falling back to the host page.
    pub fn detect(script_src: Option<&str>, page_url: &str) -> Result<Self, RoutingError> {
        match script_src.filter(|src| !src.trim().is_empty()) {
            Some(src) => Self::from_script_src(src),
            None => Self::from_page_url(page_url),
        }
    }

    pub fn from_script_src(script_src: &str) -> Result<Self, RoutingError> {
        let lowered = script_src.to_ascii_lowercase();
        let base = match lowered.find(SCRIPT_SUFFIX) {
            Some(position) => &script_src[..position],
            None => script_src,
        };
        Self::parse(base)
    }

    pub fn from_page_url(page_url: &str) -> Result<Self, RoutingError> {
        let url = Url::parse(page_url).map_err(|_| RoutingError::InvalidBase(page_url.to_string()))?;
        let path = url.path();
        let directory = match path.rfind('/') {
            Some(position) => &path[..position],
            None => "",
        };
        Self::parse(&format!("{}{directory}", url.origin().ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Partition → detail page lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    routes: BTreeMap<String, String>,
    fallback: String,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::from_pairs(
            DEFAULT_ROUTES
                .iter()
                .map(|(partition, route)| (partition.to_string(), route.to_string())),
            DEFAULT_FALLBACK_ROUTE,
        )
    }
}

impl RoutingTable {
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, String)>,
        fallback: &str,
    ) -> Self {
        let routes = pairs
            .into_iter()
            .map(|(partition, route)| (route_key(&partition), route))
            .collect();
        Self {
            routes,
            fallback: fallback.to_string(),
        }
    }

    /// Fails when any configured partition has no route of its own.
    pub fn validate(&self, partitions: &[String]) -> Result<(), RoutingError> {
        let missing: Vec<String> = partitions
            .iter()
            .filter(|partition| !self.routes.contains_key(&route_key(partition)))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RoutingError::MissingRoutes(missing))
        }
    }

    pub fn route_for(&self, partition: &str) -> &str {
        self.routes
            .get(&route_key(partition))
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    pub fn resolve(&self, record: &Record, base: &BaseLocation) -> Result<Url, RoutingError> {
        let destination = format!(
            "{}/{PAGE_ROOT}/{}",
            base.as_str(),
            self.route_for(&record.partition)
        );
        let mut url =
            Url::parse(&destination).map_err(|error| RoutingError::InvalidUrl(error.to_string()))?;
        url.query_pairs_mut().append_pair("id", &record.id);
        Ok(url)
    }
}

fn route_key(partition: &str) -> String {
    partition.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{BaseLocation, RoutingTable, DEFAULT_ROUTES};

    #[test]
    fn default_table_covers_every_default_partition() {
        let partitions: Vec<String> = DEFAULT_ROUTES.iter().map(|(p, _)| p.to_string()).collect();
        assert!(RoutingTable::default().validate(&partitions).is_ok());
    }

    #[test]
    fn partition_lookup_ignores_case() {
        let table = RoutingTable::default();
        assert_eq!(
            table.route_for("ground-cover_creepers"),
            "creeper/ground-cover_creeper.html"
        );
    }

    #[test]
    fn script_suffix_is_stripped_case_insensitively() {
        let base =
            BaseLocation::from_script_src("https://example.org/garden/Assets/JS/search.js?v=3")
                .unwrap();
        assert_eq!(base.as_str(), "https://example.org/garden");
    }
}
