//! Paginated list responses.

use serde::{Deserialize, Serialize};

use crate::users::pagination::page_window;

/// One page of a paginated listing, as returned by `/page/{n}` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Zero-indexed page number
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Page indices to render as navigation tabs around the current page
    pub fn window(&self) -> Vec<u32> {
        page_window(self.total_pages, self.number)
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        self.total_pages == 0 || self.number + 1 >= self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use serde_json::json;

    #[test]
    fn test_page_decodes_camel_case() {
        let page: Page<serde_json::Value> = serde_json::from_value(json!({
            "content": [{"id": 1}, {"id": 2}],
            "number": 3,
            "totalPages": 10,
            "size": 2,
            "totalElements": 20
        }))
        .unwrap();

        assert_eq!(page.content.len(), 2);
        assert_eq!(page.number, 3);
        assert_eq!(page.window(), vec![1, 2, 3, 4, 5]);
        assert!(!page.is_first());
        assert!(!page.is_last());
    }

    #[test]
    fn test_empty_page() {
        let page: Page<serde_json::Value> = serde_json::from_value(json!({})).unwrap();
        assert!(page.content.is_empty());
        assert!(page.window().is_empty());
        assert!(page.is_first());
        assert!(page.is_last());
    }

    #[test]
    fn test_user_page_decodes() {
        let page: Page<User> = serde_json::from_value(json!({
            "content": [
                {"id": 1, "username": "admin", "roles": ["ROLE_ADMIN"]},
                {"id": "2", "username": "clerk", "email": null}
            ],
            "number": 0,
            "totalPages": 1,
            "size": 10,
            "totalElements": 2
        }))
        .unwrap();

        assert_eq!(page.content.len(), 2);
        assert_eq!(page.content[1].id, Some(2));
        assert!(page.content[0].is_admin());
        assert!(page.is_first());
        assert!(page.is_last());
    }

    #[test]
    fn test_user_page_without_content() {
        let page: Page<User> =
            serde_json::from_value(json!({"number": 2, "totalPages": 3})).unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.window(), vec![0, 1, 2]);
    }
}
