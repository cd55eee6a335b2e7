//! Core types shared by the governance engine: token amounts, account
//! addresses, chain identifiers, block heights and time.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::arithmetic_side_effects,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]

pub mod address;
pub mod chain;
pub mod time;
pub mod token;
pub mod uint;

pub use address::Address;
pub use chain::{BlockHeight, ChainId};
pub use time::{Clock, DateTimeUtc, DurationSecs};
pub use token::Amount;
