// src/api/pagination.rs
//! Cursor pagination: keep asking until `has_more` goes false.

use super::types::PaginatedResponse;
use crate::error::AppError;

/// Fetches every page of a cursor-paginated endpoint, in order.
///
/// `fetch_page` receives the cursor for the next page (`None` for the first
/// one). Iteration stops when a page reports `has_more == false` or comes
/// back without a cursor.
pub async fn collect_all_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, AppError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        let response = fetch_page(cursor).await?;
        pages_fetched += 1;

        let has_more = response.has_more;
        cursor = response.next_cursor;
        all_items.extend(response.results);

        if !has_more || cursor.is_none() {
            break;
        }
    }

    log::debug!(
        "Collected {} items across {} page(s)",
        all_items.len(),
        pages_fetched
    );
    Ok(all_items)
}
