//! Response body types
//!
//! Every response shares one boxed body type so in-memory JSON and streamed
//! file slices can flow through the same service.

use futures_util::TryStreamExt;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Body type of every response produced by the server
pub type ResponseBody = http_body_util::combinators::BoxBody<Bytes, std::io::Error>;

/// Body holding bytes already in memory
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Body with no bytes (HEAD, 204, 304-like responses)
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// Body streaming a reader in `chunk_size` pieces
pub fn stream<R>(reader: R, chunk_size: usize) -> ResponseBody
where
    R: AsyncRead + Send + Sync + 'static,
{
    let frames = ReaderStream::with_capacity(reader, chunk_size.max(1)).map_ok(Frame::data);
    BodyExt::boxed(StreamBody::new(frames))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_body() {
        let bytes = full("hello").collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let bytes = empty().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_stream_body_small_chunks() {
        let reader = std::io::Cursor::new(b"0123456789".to_vec());
        let bytes = stream(reader, 3).collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"0123456789");
    }
}
