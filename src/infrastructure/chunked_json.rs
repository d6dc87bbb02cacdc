// Chunked JSON streaming utilities
use async_compression::tokio::bufread::BrotliEncoder;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;

/// Create a chunked streaming response, one length-prefixed JSON document per item
pub async fn chunked_json_stream<S, T>(
    stream: S,
    compress: bool,
) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + Sync + 'static,
{
    let byte_stream = stream.then(move |msg| async move { serialize_chunk(&msg, compress).await });

    let body = Body::from_stream(byte_stream);

    // Chunks are compressed individually, so no Content-Encoding on the response
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson-framed")
        .header(header::TRANSFER_ENCODING, "chunked");

    response
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single message to a chunk: 4-byte big-endian length, then payload
pub async fn serialize_chunk<T: Serialize>(msg: &T, compress: bool) -> Result<Bytes, std::io::Error> {
    let buffer = serde_json::to_vec(msg).map_err(std::io::Error::other)?;

    let payload = if compress {
        let cursor = std::io::Cursor::new(buffer);
        let mut encoder = BrotliEncoder::new(cursor);
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed).await?;
        compressed
    } else {
        buffer
    };

    let length = payload.len() as u32;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Stream every published value of a watch channel, starting with the current one
/// Frames published faster than the client reads are coalesced to the latest.
pub async fn stream_from_watch<T>(mut rx: watch::Receiver<Arc<T>>, compress: bool) -> impl IntoResponse
where
    T: Serialize + Send + Sync + 'static,
{
    let stream = async_stream::stream! {
        loop {
            let current = rx.borrow_and_update().clone();
            yield current;
            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    match chunked_json_stream(stream, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_chunk_is_length_prefixed() {
        let chunk = serialize_chunk(&json!({ "rpm": 1 }), false).await.unwrap();
        let length = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        assert_eq!(length, chunk.len() - 4);
        assert_eq!(&chunk[4..], br#"{"rpm":1}"#);
    }

    #[tokio::test]
    async fn test_compressed_chunk_differs_from_plain() {
        let msg = json!({ "samples": vec![1234.5; 200] });
        let plain = serialize_chunk(&msg, false).await.unwrap();
        let compressed = serialize_chunk(&msg, true).await.unwrap();
        assert!(compressed.len() < plain.len());
        let length = u32::from_be_bytes([compressed[0], compressed[1], compressed[2], compressed[3]]);
        assert_eq!(length as usize, compressed.len() - 4);
    }
}
