//! Paged reads of ledger data sets.

use acme_client::{DataEntry, LedgerClient, LedgerClientError};

/// Read every entry of the data set at `url`, oldest first, `page_size`
/// entries per request.
///
/// Stops once the reported total is reached or a page comes back empty. Any
/// page failure fails the whole read; a partial feed is never reconciled.
pub async fn fetch_all_entries<C: LedgerClient>(
    client: &C,
    url: &str,
    page_size: u64,
) -> Result<Vec<DataEntry>, LedgerClientError> {
    let page_size = page_size.max(1);
    let mut entries = Vec::new();
    let mut start = 0u64;

    loop {
        let page = client.fetch_entry_set(url, start, page_size, true).await?;
        let received = page.entries.len() as u64;
        tracing::trace!(%url, start, received, total = page.total, "fetched data set page");
        entries.extend(page.entries);
        start += received;
        if received == 0 || start >= page.total {
            break;
        }
    }

    Ok(entries)
}
