/// Span IDs for performance-logging events.  Each ID must be unique;
/// simply increment when adding a new span.
pub const COLLECT: u64 = 1;
pub const ARCHIVE_PAGE: u64 = 2;
pub const EXTENDED_ENTRY: u64 = 3;
pub const COMMENT_PAGE: u64 = 4;
pub const NORMALIZE_BODY: u64 = 5;
pub const MEDIA_DOWNLOAD: u64 = 6;
pub const REPLAY: u64 = 7;
pub const REPLAY_TAXONOMY: u64 = 8;
pub const REPLAY_POST: u64 = 9;

pub fn name(span_id: u64) -> &'static str {
    match span_id {
        COLLECT => "COLLECT",
        ARCHIVE_PAGE => "ARCHIVE_PAGE",
        EXTENDED_ENTRY => "EXTENDED_ENTRY",
        COMMENT_PAGE => "COMMENT_PAGE",
        NORMALIZE_BODY => "NORMALIZE_BODY",
        MEDIA_DOWNLOAD => "MEDIA_DOWNLOAD",
        REPLAY => "REPLAY",
        REPLAY_TAXONOMY => "REPLAY_TAXONOMY",
        REPLAY_POST => "REPLAY_POST",
        _ => panic!(
            "Calling logging::logging_defs::name with unknown span_id: {}",
            span_id
        ),
    }
}
