use uuid::Uuid;

use super::ApiError;

/// Record ids are UUIDs; anything else is rejected before touching the store.
pub fn validate_id<'a>(kind: &str, id: &'a str) -> Result<&'a str, ApiError> {
    if Uuid::parse_str(id).is_err() {
        return Err(ApiError::validation(format!(
            "Invalid {kind} ID: {id}. ID must be a UUID"
        )));
    }
    Ok(id)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::validation("Page numbers start at 1"));
    }
    Ok(page)
}

pub fn validate_page_size(size: u64) -> Result<u64, ApiError> {
    const MAX_PAGE_SIZE: u64 = 500;
    const MIN_PAGE_SIZE: u64 = 1;

    if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&size) {
        return Err(ApiError::validation(format!(
            "Invalid page size: {size}. Page size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(validate_id("computer", &id).ok(), Some(id.as_str()));
        assert!(validate_id("computer", "").is_err());
        assert!(validate_id("computer", "42").is_err());
        assert!(validate_id("computer", "../etc/passwd").is_err());
    }

    #[test]
    fn test_validate_page_size() {
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(500).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(501).is_err());
    }

    #[test]
    fn test_validate_page() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(0).is_err());
    }
}
