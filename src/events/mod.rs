//! # Events Module
//!
//! Progress reporting decoupled from the engine.
//!
//! ## Design
//! The indexer, finder and resolver push events into a channel; the
//! CLI (or a test) drains it on its own thread. Nothing in the engine
//! waits on the consumer.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Index(IndexEvent::Progress(p)) = event {
//!             println!("Indexed {}/{}", p.indexed, p.discovered);
//!         }
//!     }
//! });
//!
//! indexer.create_with_events(&root, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
