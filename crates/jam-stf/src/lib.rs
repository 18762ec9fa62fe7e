//! A JAM-protocol node's block-level state transition function: given a
//! prior state and an incoming block, produce the next state or a typed
//! rejection, byte-exact across independent implementations.
//!
//! The crate is organized leaves-first: codec and crypto oracles at the
//! bottom, the sixteen named state components and their copy-on-write
//! overlay above that, then one module per consensus sub-step (Safrole,
//! header validation, disputes, reports, preimages, assurances,
//! accumulation, authorizations), and finally [`stf::Stf`] orchestrating
//! them in a fixed order.

pub mod accumulation;
pub mod assurances;
pub mod authorizations;
pub mod block;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod delta;
pub mod disputes;
pub mod error;
pub mod header;
pub mod merkle;
pub mod preimages;
pub mod reports;
pub mod safrole;
pub mod state;
pub mod stf;
pub mod time;
pub mod types;

pub use block::{Block, Extrinsic, Header};
pub use config::Config;
pub use error::StfError;
pub use state::State;
pub use stf::{Applied, Stf};
