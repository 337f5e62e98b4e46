use crate::{Collection, Cursor, Page, Record, Upsert};

/// Counts from one incremental merge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
}

impl MergeStats {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.updated == 0
    }
}

/// Full reload: the page becomes the whole collection and the cursor resets
/// to whatever the server returned (possibly empty).
pub fn replace_with_page<R: Record>(page: Page<R>) -> (Collection<R>, Cursor) {
    let cursor = Cursor::from_server(page.next_cursor);
    (Collection::from_records(page.items), cursor)
}

/// Incremental refresh over borrowed state, returning the merged copy.
///
/// An empty page returns the inputs unchanged. See [`merge_into`].
pub fn merge_incremental<R: Record>(
    collection: &Collection<R>,
    cursor: &Cursor,
    page: Page<R>,
) -> (Collection<R>, Cursor) {
    let mut next = collection.clone();
    let mut next_cursor = cursor.clone();
    merge_into(&mut next, &mut next_cursor, page);
    (next, next_cursor)
}

/// Upsert every record of `page` by id, re-sort newest first, and advance the
/// cursor to the page's next-cursor when the server sent one.
///
/// - Empty page: nothing changes, cursor included.
/// - Records are never removed here.
pub fn merge_into<R: Record>(
    collection: &mut Collection<R>,
    cursor: &mut Cursor,
    page: Page<R>,
) -> MergeStats {
    let mut stats = MergeStats::default();
    if page.items.is_empty() {
        return stats;
    }

    for record in page.items {
        match collection.upsert(record) {
            Upsert::Inserted => stats.inserted += 1,
            Upsert::Replaced => stats.updated += 1,
        }
    }
    collection.sort_newest_first();

    *cursor = cursor.advanced_to(page.next_cursor.as_deref());
    stats
}
