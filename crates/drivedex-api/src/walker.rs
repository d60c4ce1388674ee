//! Change-feed cursor walker.
//!
//! Drive paginates its feeds behind opaque tokens: each page either names the
//! next token or, on the terminal page, a `newStartPageToken` to resume from
//! on the next polling run. The walker follows that chain sequentially and
//! reports where it stopped as an explicit tri-state instead of a nullable
//! token, so callers can tell "drained" from "budget hit" from "died".

use tracing::{debug, warn};

use drivedex_types::{ChangeEntry, FileMeta, PageToken, ResumePolicy, parse_rfc3339};

use crate::client::DriveApi;
use crate::error::{Error, Result};
use crate::wire::WireChange;

/// One fetched page, already converted to domain items
pub struct FeedPage<T> {
    pub items: Vec<T>,
    pub next_token: Option<PageToken>,
    /// Present only on the terminal page
    pub new_start_token: Option<PageToken>,
}

/// Outcome of a feed walk
#[derive(Debug)]
pub enum Walk<T> {
    /// Feed exhausted; `new_start_token` is the resume point for the next run
    Drained {
        items: Vec<T>,
        new_start_token: Option<PageToken>,
    },

    /// Page budget hit before the feed was exhausted
    Partial { items: Vec<T>, next_token: PageToken },

    /// A request failed mid-walk; items fetched before the failure are kept
    Failed {
        items: Vec<T>,
        /// Token of the last page that was served successfully
        last_served: Option<PageToken>,
        error: Error,
    },
}

impl<T> Walk<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Walk::Drained { items, .. } | Walk::Partial { items, .. } | Walk::Failed { items, .. } => {
                items
            }
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Walk::Drained { items, .. } | Walk::Partial { items, .. } | Walk::Failed { items, .. } => {
                items
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Walk::Failed { .. })
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Walk::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The cursor to persist for the next run, or `None` to clear it.
    ///
    /// Drained walks resume from the terminal `newStartPageToken`, partial
    /// walks from the first unfetched page. For failed walks the policy
    /// decides: `Discard` clears the cursor (operator restarts by hand),
    /// `KeepLastSeen` re-serves the last good page and reprocesses.
    pub fn resume_token(&self, policy: ResumePolicy) -> Option<PageToken> {
        match self {
            Walk::Drained { new_start_token, .. } => new_start_token.clone(),
            Walk::Partial { next_token, .. } => Some(next_token.clone()),
            Walk::Failed { last_served, .. } => match policy {
                ResumePolicy::Discard => None,
                ResumePolicy::KeepLastSeen => last_served.clone(),
            },
        }
    }
}

/// Follow a paginated feed from `start` until it drains, the page budget is
/// exhausted, or a request fails — whichever comes first.
pub fn walk_feed<T, F>(start: PageToken, max_pages: Option<usize>, mut fetch_page: F) -> Walk<T>
where
    F: FnMut(&PageToken) -> Result<FeedPage<T>>,
{
    let mut items = Vec::new();
    let mut token = start;
    let mut last_served: Option<PageToken> = None;
    let mut pages = 0usize;

    loop {
        if let Some(max) = max_pages
            && pages >= max
        {
            debug!(pages, "page budget exhausted");
            return Walk::Partial {
                items,
                next_token: token,
            };
        }

        let page = match fetch_page(&token) {
            Ok(page) => page,
            Err(error) => {
                warn!(%token, %error, "feed walk aborted");
                return Walk::Failed {
                    items,
                    last_served,
                    error,
                };
            }
        };

        pages += 1;
        debug!(%token, items = page.items.len(), "fetched page");
        items.extend(page.items);
        last_served = Some(token);

        match page.next_token {
            Some(next) => token = next,
            None => {
                return Walk::Drained {
                    items,
                    new_start_token: page.new_start_token,
                };
            }
        }
    }
}

/// Walk the change feed, tagging every entry with the token of the page that
/// carried it.
pub fn walk_changes<A: DriveApi + ?Sized>(
    api: &A,
    start: PageToken,
    max_pages: Option<usize>,
) -> Walk<ChangeEntry> {
    walk_feed(start, max_pages, |token| {
        let list = api.list_changes(token)?;
        let items = list
            .changes
            .into_iter()
            .filter_map(|change| convert_change(change, token))
            .collect();

        Ok(FeedPage {
            items,
            next_token: list.next_page_token.map(PageToken::from),
            new_start_token: list.new_start_page_token.map(PageToken::from),
        })
    })
}

/// Walk the file listing. The files feed has no terminal resume token.
pub fn walk_files<A: DriveApi + ?Sized>(
    api: &A,
    start: PageToken,
    max_pages: Option<usize>,
) -> Walk<FileMeta> {
    walk_feed(start, max_pages, |token| {
        let list = api.list_files(Some(token))?;
        let items = list
            .files
            .into_iter()
            .map(|file| FileMeta::new(file.id, file.name, file.mime_type))
            .collect();

        Ok(FeedPage {
            items,
            next_token: list.next_page_token.map(PageToken::from),
            new_start_token: None,
        })
    })
}

/// Entries without a file payload (removals, lost access) carry nothing to
/// persist and are dropped, mirroring the dropna step of the original
/// pipeline.
fn convert_change(change: WireChange, page_token: &PageToken) -> Option<ChangeEntry> {
    let Some(file) = change.file else {
        debug!(file_id = ?change.file_id, "skipping change without file payload");
        return None;
    };

    let Some(time) = change.time.as_deref().and_then(parse_rfc3339) else {
        warn!(file_id = %file.id, time = ?change.time, "skipping change with unparseable time");
        return None;
    };

    Some(ChangeEntry::new(
        file.id,
        file.name,
        file.mime_type,
        time,
        change.change_type.unwrap_or_else(|| "file".to_string()),
        change.removed,
        page_token.clone(),
    ))
}
