//! Accepts connections on the harness's Unix-domain socket and drives
//! [`jam_stf::Stf::apply`] from the framed messages decoded in
//! [`crate::protocol`].

use crate::protocol::{Message, Reply};
use jam_stf::codec::{deserialize, serialize};
use jam_stf::config::{Config, ConfigError};
use jam_stf::state::State;
use jam_stf::types::ValidatorKeys;
use jam_stf::Stf;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] jam_stf::error::CodecError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Deterministic ed25519 validator keys derived from `seed`, for reproducible
/// fuzz/trace sessions. With no seed, `Initialize` keeps the all-zero keys a
/// plain genesis state used before this flag existed.
fn seeded_validators(seed: u64, count: usize) -> Vec<ValidatorKeys> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let signing_key = ed25519_dalek::SigningKey::generate(&mut rng);
            ValidatorKeys {
                ed25519: signing_key.verifying_key().to_bytes(),
                ..ValidatorKeys::default()
            }
        })
        .collect()
}

pub async fn serve(socket_path: &Path, cfg: Config, seed: Option<u64>) -> Result<(), HarnessError> {
    if socket_path.exists() {
        std::fs::remove_file(socket_path)?;
    }
    let listener = UnixListener::bind(socket_path)?;
    tracing::info!(path = %socket_path.display(), "listening");

    loop {
        let (stream, _addr) = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, cfg, seed).await {
                tracing::warn!(%err, "connection terminated");
            }
        });
    }
}

async fn read_frame(stream: &mut UnixStream) -> Result<Option<Vec<u8>>, HarnessError> {
    let mut len_bytes = [0u8; 4];
    match stream.read_exact(&mut len_bytes).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_le_bytes(len_bytes) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;
    Ok(Some(body))
}

async fn write_reply(stream: &mut UnixStream, reply: &Reply) -> Result<(), HarnessError> {
    let body = serialize(reply);
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&body);
    stream.write_all(&frame).await?;
    Ok(())
}

async fn handle_connection(mut stream: UnixStream, cfg: Config, seed: Option<u64>) -> Result<(), HarnessError> {
    let mut state: Option<State> = None;

    while let Some(body) = read_frame(&mut stream).await? {
        let message: Message = deserialize(&body)?;
        match message {
            Message::PeerInfo { name, app_version } => {
                tracing::info!(%name, ?app_version, "peer connected");
                write_reply(&mut stream, &Reply::Ack).await?;
            }
            Message::Initialize { header: _, keyvals: _, ancestry: _ } => {
                // A fresh genesis state. The harness's keyvals/ancestry seed
                // only matters to an implementation that stores state
                // generically by key, which this workspace's typed `State`
                // does not; `seed` instead drives the validator keyset, for
                // reproducible fuzz/trace sessions that exercise real
                // signature verification rather than all-zero keys.
                let validators = match seed {
                    Some(seed) => seeded_validators(seed, cfg.validator_count as usize),
                    None => vec![ValidatorKeys::default(); cfg.validator_count as usize],
                };
                state = Some(State::genesis(&cfg, validators));
                write_reply(&mut stream, &Reply::Ack).await?;
            }
            Message::ImportBlock { block } => {
                let Some(current) = state.as_ref() else {
                    write_reply(&mut stream, &Reply::Rejected("not initialized".to_string())).await?;
                    continue;
                };
                let entropy_contribution = jam_stf::merkle::blake2b_256(&serialize(&block.header.entropy_source));
                match Stf::apply(current, &cfg, &block, entropy_contribution) {
                    Ok(applied) => {
                        write_reply(&mut stream, &Reply::StateRoot(applied.state_root)).await?;
                        state = Some(applied.state);
                    }
                    Err(err) => {
                        write_reply(&mut stream, &Reply::Rejected(err.to_string())).await?;
                    }
                }
            }
            Message::Kill => {
                tracing::info!("session killed by peer");
                break;
            }
        }
    }
    Ok(())
}
