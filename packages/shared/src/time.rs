//! Clock helpers.
//!
//! Timestamps travel as Unix milliseconds; these helpers produce them and
//! render them for humans.

use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Current Unix timestamp in milliseconds (UTC).
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a Unix millisecond timestamp as RFC 3339 (UTC).
///
/// Out-of-range values fall back to the Unix epoch.
pub fn millis_to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a Unix millisecond timestamp as local `HH:MM`.
pub fn format_clock(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_to_rfc3339() {
        // テスト項目: ミリ秒タイムスタンプを RFC 3339 (UTC) に変換できる
        // given (前提条件):
        let millis = 1_672_531_200_123;

        // when (操作):
        let rendered = millis_to_rfc3339(millis);

        // then (期待する結果):
        assert_eq!(rendered, "2023-01-01T00:00:00.123Z");
    }

    #[test]
    fn test_format_clock_shape() {
        // テスト項目: HH:MM 形式で表示される
        // when (操作):
        let rendered = format_clock(now_millis());

        // then (期待する結果):
        assert_eq!(rendered.len(), 5);
        assert_eq!(rendered.as_bytes()[2], b':');
    }
}
