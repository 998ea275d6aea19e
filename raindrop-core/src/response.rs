//! Response envelopes returned by the bookmark service.

use serde::{Deserialize, Serialize};

/// Marker trait for responses that may be stored in the response cache.
///
/// `is_cacheable` must only return true for responses that both report
/// success and carry a payload; anything else is handed back to the caller
/// without being stored.
pub trait CacheableResponse: Clone + Send + Sync + 'static {
    fn is_cacheable(&self) -> bool;
}

/// Response containing a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    pub result: bool,
    #[serde(default)]
    pub item: Option<T>,
}

impl<T> ItemResponse<T> {
    pub fn ok(item: T) -> Self {
        Self {
            result: true,
            item: Some(item),
        }
    }

    pub fn failed() -> Self {
        Self {
            result: false,
            item: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result
    }
}

impl<T: Clone + Send + Sync + 'static> CacheableResponse for ItemResponse<T> {
    fn is_cacheable(&self) -> bool {
        self.result && self.item.is_some()
    }
}

/// Response containing a list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsResponse<T> {
    pub result: bool,
    #[serde(default)]
    pub items: Option<Vec<T>>,
}

impl<T> ItemsResponse<T> {
    pub fn ok(items: Vec<T>) -> Self {
        Self {
            result: true,
            items: Some(items),
        }
    }

    /// A failed response, optionally carrying items written before the failure.
    pub fn failed(items: Vec<T>) -> Self {
        Self {
            result: false,
            items: Some(items),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result
    }

    /// The items, or an empty slice when the payload is absent.
    pub fn items(&self) -> &[T] {
        self.items.as_deref().unwrap_or_default()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items.unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

impl<T: Clone + Send + Sync + 'static> CacheableResponse for ItemsResponse<T> {
    fn is_cacheable(&self) -> bool {
        // An ok response with an empty list is a valid answer and is cached.
        self.result && self.items.is_some()
    }
}

/// Response representing success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub result: bool,
}

impl SuccessResponse {
    pub fn new(result: bool) -> Self {
        Self { result }
    }

    pub fn is_ok(&self) -> bool {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_items_response_cacheable_rules() {
        assert!(ItemsResponse::<u32>::ok(vec![]).is_cacheable());
        assert!(ItemsResponse::ok(vec![1u32]).is_cacheable());
        assert!(!ItemsResponse::<u32>::failed(vec![]).is_cacheable());

        let missing = ItemsResponse::<u32> {
            result: true,
            items: None,
        };
        assert!(!missing.is_cacheable());
    }

    #[test]
    fn test_item_response_cacheable_rules() {
        assert!(ItemResponse::ok("profile".to_string()).is_cacheable());
        assert!(!ItemResponse::<String>::failed().is_cacheable());

        let empty_ok = ItemResponse::<String> {
            result: true,
            item: None,
        };
        assert!(!empty_ok.is_cacheable());
    }

    #[test]
    fn test_items_response_null_items_deserializes() {
        let parsed: ItemsResponse<u32> =
            serde_json::from_value(json!({ "result": true, "items": null })).unwrap();
        assert!(parsed.items.is_none());
        assert!(parsed.is_empty());

        let parsed: ItemsResponse<u32> = serde_json::from_value(json!({ "result": false })).unwrap();
        assert!(!parsed.is_ok());
        assert_eq!(parsed.len(), 0);
    }
}
