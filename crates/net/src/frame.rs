//! Length-prefixed frame encoding/decoding
//!
//! Wire format: [4-byte big-endian length][UTF-8 JSON payload]
//! Maximum frame size: 1MB (sanity limit)

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Maximum allowed frame size (1MB)
pub const MAX_FRAME_SIZE: u32 = 1024 * 1024;

fn closed_on_eof(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        Error::Io(e)
    }
}

/// Read one frame body. Partial deliveries are buffered until the declared
/// length is satisfied.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(closed_on_eof)?;

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge {
            len: len as usize,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await.map_err(closed_on_eof)?;
    Ok(payload)
}

/// Write one frame and flush it
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_FRAME_SIZE as usize {
        return Err(Error::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    let len = payload.len() as u32;

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    #[tokio::test]
    async fn test_frame_roundtrip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"{\"type\":\"JOIN_ACK\"}").await.unwrap();
        assert_eq!(&buf[..4], &[0, 0, 0, 19]);

        let mut cursor = Cursor::new(buf);
        let body = read_frame(&mut cursor).await.unwrap();
        assert_eq!(body, b"{\"type\":\"JOIN_ACK\"}");
    }

    #[tokio::test]
    async fn test_empty_frame_has_empty_body() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 0]);
        assert!(read_frame(&mut cursor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let len = (MAX_FRAME_SIZE + 1).to_be_bytes();
        let mut cursor = Cursor::new(len.to_vec());
        let result = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(Error::FrameTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_truncated_prefix_is_closed() {
        let mut cursor = Cursor::new(vec![0, 0]);
        assert!(matches!(
            read_frame(&mut cursor).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_truncated_body_is_closed() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 10, b'{', b'}']);
        assert!(matches!(
            read_frame(&mut cursor).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_body_split_across_deliveries() {
        let body: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut wire = (body.len() as u32).to_be_bytes().to_vec();
        wire.extend_from_slice(&body);

        let (mut tx, mut rx) = tokio::io::duplex(64 * 1024);
        let chunks: Vec<Vec<u8>> = vec![
            wire[..3].to_vec(),
            wire[3..5_000].to_vec(),
            wire[5_000..].to_vec(),
        ];
        let writer = tokio::spawn(async move {
            for chunk in chunks {
                tx.write_all(&chunk).await.unwrap();
                tx.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let received = read_frame(&mut rx).await.unwrap();
        assert_eq!(received, body);
        writer.await.unwrap();
    }
}
