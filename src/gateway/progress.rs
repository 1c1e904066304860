//! アップロード進捗の計測
//!
//! 送信ボディをチャンクに分けたストリームとして渡し、
//! チャンクが送信側に引き渡されるたびに送信済みバイト数から進捗率を計算する。

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::sync::atomic::{AtomicI16, Ordering};
use std::sync::Arc;

/// 進捗率（0〜100）を受け取るコールバック
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// 送信済みバイト数を進捗率に変換（四捨五入）
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = sent.min(total) as f64 * 100.0 / total as f64;
    ratio.round() as u8
}

/// 単調非減少な進捗通知
///
/// 同じ値・小さい値はコールバックに流さない。
pub struct ProgressTracker {
    total: u64,
    last: AtomicI16,
    callback: ProgressCallback,
}

impl ProgressTracker {
    pub fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            total,
            last: AtomicI16::new(-1),
            callback,
        }
    }

    pub fn advance(&self, sent: u64) {
        if self.total == 0 {
            return;
        }
        let percent = percent_of(sent, self.total);
        let prev = self.last.fetch_max(percent as i16, Ordering::SeqCst);
        if percent as i16 > prev {
            (self.callback)(percent);
        }
    }
}

/// データをチャンク単位のストリームにする
pub fn chunked_body(
    data: Bytes,
    tracker: Option<Arc<ProgressTracker>>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = data.len();
    stream::iter((0..total).step_by(UPLOAD_CHUNK_SIZE)).map(move |start| {
        let end = (start + UPLOAD_CHUNK_SIZE).min(total);
        if let Some(tracker) = &tracker {
            tracker.advance(end as u64);
        }
        Ok(data.slice(start..end))
    })
}
