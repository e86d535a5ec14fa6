use magjob_core::{Page, PageRequest, Sort};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// `?page=0&size=10&sort=field,desc`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl PageParams {
    pub fn to_request(&self) -> Result<PageRequest, AppError> {
        let defaults = PageRequest::default();
        let mut request = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.size.unwrap_or(defaults.size),
        )?;
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            request = request.sorted_by(parse_sort(sort)?);
        }
        Ok(request)
    }
}

fn parse_sort(raw: &str) -> Result<Sort, AppError> {
    let mut parts = raw.split(',').map(str::trim);
    let field = parts.next().unwrap_or_default();
    let ascending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => true,
        Some("desc") => false,
        Some(other) => {
            return Err(AppError::BadRequest(format!("Unknown sort direction '{}'", other)));
        }
    };
    Ok(Sort::new(field, ascending))
}

/// A page of items plus the size of the whole result set.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub count: usize,
}

impl<T> ListResponse<T> {
    pub fn from_page<U>(page: Page<U>, f: impl FnMut(U) -> T) -> Self {
        let page = page.map(f);
        Self {
            items: page.items,
            count: page.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = PageParams::default().to_request().unwrap();
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn test_sort_parsing() {
        let params = PageParams {
            page: Some(2),
            size: Some(5),
            sort: Some("startTime,desc".to_string()),
        };
        let request = params.to_request().unwrap();
        assert_eq!(request.offset(), 10);
        assert_eq!(request.sort, Some(Sort::new("startTime", false)));
    }

    #[test]
    fn test_invalid_params() {
        let zero = PageParams {
            size: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero.to_request(), Err(AppError::BadRequest(_))));

        let sideways = PageParams {
            sort: Some("id,sideways".to_string()),
            ..Default::default()
        };
        assert!(matches!(sideways.to_request(), Err(AppError::BadRequest(_))));
    }
}
