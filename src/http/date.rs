//! Date header values.

use std::time::{SystemTime, UNIX_EPOCH};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

/// `Sunday, 06 Nov 1994 08:49:37 GMT`
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Formats `time` in UTC for the `Date` and `Last-Modified` headers.
///
/// Returns `None` for instants outside the years `time` can represent.
pub fn fmt_http_date(time: SystemTime) -> Option<String> {
    let datetime = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => OffsetDateTime::UNIX_EPOCH.checked_add(Duration::try_from(after).ok()?)?,
        Err(before) => {
            OffsetDateTime::UNIX_EPOCH.checked_sub(Duration::try_from(before.duration()).ok()?)?
        }
    };

    datetime.format(DATE_FORMAT).ok()
}

/// The current time as a header value.
pub fn now() -> String {
    let datetime = OffsetDateTime::now_utc();

    // the description only uses components every OffsetDateTime has
    datetime
        .format(DATE_FORMAT)
        .unwrap_or_else(|_| datetime.to_string())
}
