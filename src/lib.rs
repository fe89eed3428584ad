//! Bidirectional codec for compressed, chunked game save containers.
//!
//! The crate is layered bottom-up:
//!
//! - [`cursor`]: bounds-checked little-endian reads/writes over byte
//!   buffers, including the signed-prefix string convention.
//! - [`types`]: object references, reference lists and spatial grids.
//! - [`header`]: the plain-text save header and its version gate.
//! - [`chunk`]: zlib chunk framing between disk bytes and the body.
//! - [`object`]: actor and component headers.
//! - [`property`]: the typed property stream (scalars, structs, arrays,
//!   sets, maps) with declared-size cross-checks.
//! - [`trailing`]: per-type binary data following the property stream.
//! - [`entity`] / [`level`] / [`save`]: entity bodies, level sections and
//!   the [`SaveFile`] top level.
//!
//! Decoding is strict: every declared size on the wire is compared against
//! the bytes actually consumed, and any disagreement is a fatal
//! [`Error`]. Encoding an unmodified [`SaveFile`] reproduces the original
//! decompressed body byte for byte.
//!
//! ```no_run
//! # fn main() -> factsave::Result<()> {
//! let data = std::fs::read("session.sav").map_err(|e| factsave::Error::Parse {
//!     context: "io",
//!     message: e.to_string(),
//! })?;
//! let (mut save, diagnostics) = factsave::SaveFile::parse(&data)?;
//! for type_path in &diagnostics.unmodeled_trailing {
//!     eprintln!("unmodeled trailing data on {type_path}");
//! }
//! save.header.session_name = "Renamed".into();
//! std::fs::write("session.sav", save.write_verified()?).ok();
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod cursor;
pub mod entity;
pub mod error;
pub mod header;
pub mod level;
pub mod object;
pub mod property;
pub mod save;
pub mod trailing;
pub mod types;

pub use error::{Error, Result};
pub use save::{Diagnostics, SaveFile};
