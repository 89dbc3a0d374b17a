//! Command adapter: turns chat interactions into `Ledger` calls and ledger
//! results into structured replies.
//!
//! Rendering replies into platform embeds and talking to the platform API are
//! left to the transport; this crate stops at [`Reply`].

pub mod audit;
pub mod config;
pub mod handler;
pub mod interaction;
pub mod reply;

pub use config::{BotConfig, ReplyConfig};
pub use handler::CommandHandler;
pub use interaction::{Command, Interaction, InteractionKind, ParseError};
pub use reply::{Field, Reply, ReplyButton, Tone};
