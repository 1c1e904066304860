//! 表示用フォーマッタ
//!
//! 結果表示と履歴一覧で同じ表記になるよう共通化している。

use chrono::{DateTime, NaiveDateTime};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// バイト数を人が読める表記に変換（例: 1536 → "1.5 KB"）
///
/// 1024進で小数第2位まで丸め、末尾の0は落とす。GBより上の単位は使わない。
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// アップロード日時を "1/15/2024, 10:30:00 AM" 形式に変換
///
/// タイムゾーン付きの場合はその時刻のまま表示する（ローカル時刻へは変換しない）。
/// パースできない値はそのまま返す。
pub fn format_date(raw: &str) -> String {
    match parse_timestamp(raw.trim()) {
        Some(dt) => dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        None => raw.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
