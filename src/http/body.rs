//! Streaming bodies for disk-backed resources.

use std::fs::File;
use std::io::{self, Read};

use axum::body::{Body, Bytes};
use flate2::{read::GzEncoder, Compression};
use futures_util::{stream, TryStreamExt};

/// Read size per chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// Compression level for on-the-fly gzip.
const STREAM_GZIP_LEVEL: u32 = 6;

type BoxReader = Box<dyn Read + Send>;

/// Stream `file` as a response body, gzip-compressing on the fly when
/// `gzip` is set. Reads happen on the blocking pool, one chunk at a time.
pub fn stream_file(file: File, gzip: bool, path: String) -> Body {
    let reader: BoxReader = if gzip {
        Box::new(GzEncoder::new(file, Compression::new(STREAM_GZIP_LEVEL)))
    } else {
        Box::new(file)
    };

    let chunks = stream::try_unfold(reader, |reader| async move {
        let (reader, chunk) = tokio::task::spawn_blocking(move || read_chunk(reader))
            .await
            .map_err(io::Error::other)??;

        let next = (!chunk.is_empty()).then(|| (Bytes::from(chunk), reader));
        Ok::<_, io::Error>(next)
    })
    .inspect_err(move |e| {
        tracing::warn!(path = %path, error = %e, "Error streaming response body");
    });

    Body::from_stream(chunks)
}

fn read_chunk(mut reader: BoxReader) -> io::Result<(BoxReader, Vec<u8>)> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let n = loop {
        match reader.read(&mut buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    };
    buf.truncate(n);
    Ok((reader, buf))
}
