use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use pin_project_lite::pin_project;
use upload_core::UploadProgress;

/// Callback receiving byte counts as the request body is sent.
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

pin_project! {
    /// Body stream that reports how many bytes have been handed to the transport.
    pub struct ProgressStream<S> {
        #[pin]
        inner: S,
        sent: u64,
        total: u64,
        on_progress: ProgressFn,
    }
}

impl<S> ProgressStream<S> {
    pub fn new(inner: S, total: u64, on_progress: ProgressFn) -> Self {
        Self {
            inner,
            sent: 0,
            total,
            on_progress,
        }
    }
}

impl<S> Stream for ProgressStream<S>
where
    S: Stream<Item = std::io::Result<Bytes>>,
{
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if !chunk.is_empty() {
                    *this.sent += chunk.len() as u64;
                    (this.on_progress)(UploadProgress::new(*this.sent, *this.total));
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}

/// Split a buffer into cheap `Bytes` slices for streaming.
pub(crate) fn chunked(bytes: Bytes, chunk_size: usize) -> Vec<std::io::Result<Bytes>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(bytes.len().div_ceil(chunk_size));
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + chunk_size).min(bytes.len());
        chunks.push(Ok(bytes.slice(offset..end)));
        offset = end;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, stream};
    use std::sync::Mutex;

    #[test]
    fn chunked_covers_whole_buffer() {
        let chunks = chunked(Bytes::from_static(b"0123456789"), 4);
        let lens: Vec<usize> = chunks
            .iter()
            .map(|c| c.as_ref().map(Bytes::len).unwrap_or(0))
            .collect();
        assert_eq!(lens, vec![4, 4, 2]);
        assert!(chunked(Bytes::new(), 4).is_empty());
    }

    #[tokio::test]
    async fn reports_running_totals() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let on_progress: ProgressFn = Arc::new(move |p: UploadProgress| {
            sink.lock().unwrap().push(p.percent());
        });

        let body = stream::iter(chunked(Bytes::from(vec![7u8; 100]), 25));
        let collected: Vec<_> = ProgressStream::new(body, 100, on_progress)
            .collect()
            .await;

        assert_eq!(collected.len(), 4);
        assert_eq!(*seen.lock().unwrap(), vec![25, 50, 75, 100]);
    }
}
