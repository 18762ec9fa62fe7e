//! Wire messages for the length-prefixed fuzz/trace framing (§6): a
//! `u32` little-endian length prefix followed by that many message bytes,
//! encoded with the same [`Codec`] the core STF uses for everything else.

use jam_stf::block::{Block, Header};
use jam_stf::codec::{deserialize, serialize, Codec, Reader, Writer};
use jam_stf::error::CodecError;
use jam_stf::types::{Hash, StateKey};

/// A single `(key, value)` pair used to seed a fresh state in `Initialize`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyVal {
    pub key: StateKey,
    pub value: Vec<u8>,
}

impl Codec for KeyVal {
    fn encode(&self, w: &mut Writer) {
        self.key.encode(w);
        self.value.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            key: Codec::decode(r)?,
            value: Codec::decode(r)?,
        })
    }
}

/// One message of the fuzz/trace protocol (§6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Peer identification handshake; payload is opaque to the core.
    PeerInfo { name: String, app_version: [u32; 3] },
    /// Seed a fresh state from a raw key/value dump plus the genesis
    /// header and its ancestry hashes.
    Initialize {
        header: Header,
        keyvals: Vec<KeyVal>,
        ancestry: Vec<Hash>,
    },
    /// Apply one block against the current state.
    ImportBlock { block: Block },
    /// Tear down the session.
    Kill,
}

impl Codec for Message {
    fn encode(&self, w: &mut Writer) {
        match self {
            Message::PeerInfo { name, app_version } => {
                w.byte(0);
                name.as_bytes().to_vec().encode(w);
                for v in app_version {
                    v.encode(w);
                }
            }
            Message::Initialize { header, keyvals, ancestry } => {
                w.byte(1);
                header.encode(w);
                keyvals.encode(w);
                ancestry.encode(w);
            }
            Message::ImportBlock { block } => {
                w.byte(2);
                block.encode(w);
            }
            Message::Kill => w.byte(3),
        }
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        match r.byte()? {
            0 => {
                let name_bytes: Vec<u8> = Codec::decode(r)?;
                let name = String::from_utf8(name_bytes).map_err(|_| CodecError::InvalidEncoding)?;
                let app_version = [u32::decode(r)?, u32::decode(r)?, u32::decode(r)?];
                Ok(Message::PeerInfo { name, app_version })
            }
            1 => Ok(Message::Initialize {
                header: Codec::decode(r)?,
                keyvals: Codec::decode(r)?,
                ancestry: Codec::decode(r)?,
            }),
            2 => Ok(Message::ImportBlock { block: Codec::decode(r)? }),
            3 => Ok(Message::Kill),
            _ => Err(CodecError::InvalidEncoding),
        }
    }
}

/// The core's reply to an `ImportBlock`: either the new state root or the
/// error that rejected it (§7, "a single error categorizing the
/// rejection").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    StateRoot(Hash),
    Rejected(String),
    Ack,
}

impl Codec for Reply {
    fn encode(&self, w: &mut Writer) {
        match self {
            Reply::StateRoot(root) => {
                w.byte(0);
                root.encode(w);
            }
            Reply::Rejected(msg) => {
                w.byte(1);
                msg.as_bytes().to_vec().encode(w);
            }
            Reply::Ack => w.byte(2),
        }
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        match r.byte()? {
            0 => Ok(Reply::StateRoot(Codec::decode(r)?)),
            1 => {
                let bytes: Vec<u8> = Codec::decode(r)?;
                Ok(Reply::Rejected(String::from_utf8(bytes).map_err(|_| CodecError::InvalidEncoding)?))
            }
            2 => Ok(Reply::Ack),
            _ => Err(CodecError::InvalidEncoding),
        }
    }
}

pub fn encode_frame<T: Codec>(value: &T) -> Vec<u8> {
    let body = serialize(value);
    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_le_bytes());
    framed.extend_from_slice(&body);
    framed
}

pub fn decode_frame<T: Codec>(body: &[u8]) -> Result<T, CodecError> {
    deserialize(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_roundtrips() {
        let bytes = serialize(&Message::Kill);
        assert_eq!(deserialize::<Message>(&bytes).unwrap(), Message::Kill);
    }

    #[test]
    fn peer_info_roundtrips() {
        let msg = Message::PeerInfo {
            name: "fuzzer".to_string(),
            app_version: [0, 1, 2],
        };
        let bytes = serialize(&msg);
        assert_eq!(deserialize::<Message>(&bytes).unwrap(), msg);
    }

    #[test]
    fn state_root_reply_roundtrips() {
        let reply = Reply::StateRoot([7u8; 32]);
        let bytes = serialize(&reply);
        assert_eq!(deserialize::<Reply>(&bytes).unwrap(), reply);
    }
}
