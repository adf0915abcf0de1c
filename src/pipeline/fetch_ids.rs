use crate::mail::api::MailApi;

pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Walk the listing endpoint cursor-by-cursor and collect matching message
/// IDs, in the order the service returns them.
///
/// Stops when `max_results` is reached (truncated exactly) or when a page
/// carries no further cursor. A listing error is not retried: it ends the
/// walk and whatever accumulated so far is returned, since a partial mailbox
/// scan is still actionable.
pub fn fetch_message_ids(
    api: &dyn MailApi,
    query: &str,
    max_results: Option<usize>,
) -> Vec<String> {
    let page_size = max_results
        .map(|m| m.min(DEFAULT_PAGE_SIZE as usize) as u32)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let mut ids: Vec<String> = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = match api.list_messages(query, page_size, page_token.as_deref()) {
            Ok(page) => page,
            Err(e) => {
                log::warn!("listing failed after {} ids, keeping partial result: {e}", ids.len());
                break;
            }
        };

        ids.extend(page.ids);

        if let Some(max) = max_results
            && ids.len() >= max
        {
            ids.truncate(max);
            break;
        }

        match page.next_page_token {
            Some(token) => {
                println!("Found {} emails so far...", ids.len());
                page_token = Some(token);
            }
            None => break,
        }
    }

    ids
}
