//! Lazy, restartable inventory stream over the paginated listing.

use futures::stream::{self, Stream, TryStreamExt};

use super::{InventoryEntry, ObjectStore, StorageError};

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Stream every object in the bucket, page by page.
///
/// Each call starts again from the first page. Errors are yielded as-is and
/// end the stream for the caller; nothing is retried here.
pub fn list_all<S: ObjectStore>(
    store: &S,
) -> impl Stream<Item = Result<InventoryEntry, StorageError>> + Send + '_ {
    stream::try_unfold(Cursor::Start, move |cursor| async move {
        let token = match cursor {
            Cursor::Done => return Ok::<_, StorageError>(None),
            Cursor::Start => None,
            Cursor::Next(t) => Some(t),
        };
        let page = store.list_page(token).await?;
        tracing::debug!(
            entries = page.entries.len(),
            more = page.next.is_some(),
            "listing page"
        );
        let next = match page.next {
            Some(t) => Cursor::Next(t),
            None => Cursor::Done,
        };
        let entries = stream::iter(page.entries.into_iter().map(Ok::<_, StorageError>));
        Ok::<_, StorageError>(Some((entries, next)))
    })
    .try_flatten()
}
