//! Bridge socket: server (during `finch run`) and clients (`finch record`,
//! `finch retrieve`, `finch cancel`).
//!
//! One request per connection. The client writes an opcode byte, then for
//! `r` one delimited frame, and shuts down its write half:
//! - `r`: record the frame. No response.
//! - `d`: drain. Response is a varint frame count followed by the delimited frames.
//! - `c`: stop the running fetch job. Response is one byte, 1 if a job was stopped.

use anyhow::{bail, Context as _, Result};
use finch_core::bridge::frame::{decode_varint, delimited_len, encode_delimited, encode_varint};
use finch_core::bridge::{read_delimited, MetricsBridge};
use finch_core::fetcher::SEED_FETCH_JOB_ID;
use finch_core::platform::JobControl;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

const OP_RECORD: u8 = b'r';
const OP_DRAIN: u8 = b'd';
const OP_STOP: u8 = b'c';

/// Upper bound on one request; records are small.
const MAX_REQUEST_BYTES: u64 = 1 << 20;

/// Binds `path` and spawns the accept loop.
pub fn spawn_bridge_listener(
    bridge: MetricsBridge,
    control: Arc<JobControl>,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(&path);
    let listener =
        UnixListener::bind(&path).with_context(|| format!("bind {}", path.display()))?;
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let bridge = bridge.clone();
                    let control = Arc::clone(&control);
                    tokio::spawn(async move {
                        if let Err(e) = serve(stream, &bridge, &control).await {
                            tracing::debug!("bridge socket request: {:#}", e);
                        }
                    });
                }
                Err(e) => tracing::debug!("bridge socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

async fn serve(mut stream: UnixStream, bridge: &MetricsBridge, control: &JobControl) -> Result<()> {
    let mut request = Vec::new();
    (&mut stream)
        .take(MAX_REQUEST_BYTES)
        .read_to_end(&mut request)
        .await?;
    let Some((&op, body)) = request.split_first() else {
        bail!("empty request");
    };
    match op {
        OP_RECORD => {
            let frame = read_delimited(&mut Cursor::new(body))?
                .ok_or_else(|| anyhow::anyhow!("record request without a frame"))?;
            bridge.record(frame);
        }
        OP_DRAIN => {
            let frames = bridge.retrieve().await;
            stream.write_all(&encode_drain_response(&frames)).await?;
        }
        OP_STOP => {
            let stopped = control.request_stop(SEED_FETCH_JOB_ID);
            stream.write_all(&[u8::from(stopped)]).await?;
        }
        other => bail!("unknown opcode {:#04x}", other),
    }
    stream.shutdown().await?;
    Ok(())
}

fn encode_drain_response(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    encode_varint(frames.len() as u64, &mut out);
    for f in frames {
        out.extend_from_slice(&encode_delimited(f));
    }
    out
}

fn decode_drain_response(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let (count, n) = decode_varint(data)?;
    let mut cursor = Cursor::new(&data[n..]);
    let mut frames = Vec::new();
    for _ in 0..count {
        let frame = read_delimited(&mut cursor)?.context("drain response ended early")?;
        frames.push(frame);
    }
    Ok(frames)
}

async fn request(socket_path: &Path, payload: &[u8]) -> Result<Vec<u8>> {
    let mut stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("connect {}", socket_path.display()))?;
    stream.write_all(payload).await?;
    stream.shutdown().await?;
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    Ok(response)
}

/// Fails if a record request for `frame` would exceed what the server reads.
pub fn ensure_record_fits(frame: &[u8]) -> Result<()> {
    let size = 1 + delimited_len(frame) as u64;
    if size > MAX_REQUEST_BYTES {
        bail!(
            "record of {} bytes exceeds the {} byte request limit",
            frame.len(),
            MAX_REQUEST_BYTES
        );
    }
    Ok(())
}

pub async fn send_record(socket_path: &Path, frame: &[u8]) -> Result<()> {
    ensure_record_fits(frame)?;
    let mut payload = vec![OP_RECORD];
    payload.extend_from_slice(&encode_delimited(frame));
    request(socket_path, &payload).await?;
    Ok(())
}

pub async fn send_drain(socket_path: &Path) -> Result<Vec<Vec<u8>>> {
    decode_drain_response(&request(socket_path, &[OP_DRAIN]).await?)
}

/// Ask a running `finch run` to stop its activation. Ok(false) if no server is listening.
pub async fn send_stop(socket_path: &Path) -> Result<bool> {
    if !socket_path.exists() {
        return Ok(false);
    }
    let response = request(socket_path, &[OP_STOP]).await?;
    Ok(response.first() == Some(&1))
}
