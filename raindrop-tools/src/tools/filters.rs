//! Filter summary tool.

use super::{cancellable, ToolDeps};
use raindrop_core::{AvailableFilters, FiltersQuery, RaindropResult, ValidationError};
use tokio_util::sync::CancellationToken;

/// Tag orderings the filter endpoint accepts.
pub const VALID_TAGS_SORT_OPTIONS: [&str; 2] = ["-count", "_id"];

pub struct FiltersTools {
    deps: ToolDeps,
}

impl FiltersTools {
    pub fn new(deps: ToolDeps) -> Self {
        Self { deps }
    }

    /// Filter counts for one collection, or for every bookmark when
    /// `collection_id` is `0`. Not cached.
    pub async fn get_available_filters(
        &self,
        collection_id: i64,
        tags_sort: Option<&str>,
        search: Option<&str>,
        cancel: &CancellationToken,
    ) -> RaindropResult<AvailableFilters> {
        validate_tags_sort(tags_sort)?;
        let query = FiltersQuery {
            tags_sort: tags_sort.map(str::to_string),
            search: search
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
        };
        cancellable(cancel, self.deps.api().get_filters(collection_id, &query)).await
    }
}

fn validate_tags_sort(tags_sort: Option<&str>) -> Result<(), ValidationError> {
    match tags_sort {
        Some(sort) if !VALID_TAGS_SORT_OPTIONS.contains(&sort) => {
            Err(ValidationError::InvalidValue {
                field: "tags_sort".to_string(),
                reason: format!("valid values are {}", VALID_TAGS_SORT_OPTIONS.join(", ")),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_sort_accepts_known_orders() {
        assert!(validate_tags_sort(None).is_ok());
        assert!(validate_tags_sort(Some("-count")).is_ok());
        assert!(validate_tags_sort(Some("_id")).is_ok());
    }

    #[test]
    fn test_tags_sort_rejects_unknown_order() {
        let err = validate_tags_sort(Some("count")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "tags_sort"));
    }
}
