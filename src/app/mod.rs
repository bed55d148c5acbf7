//! Application-Layer: History, Gesten-Kompression und Dokument-Orchestrierung.

pub mod compressor;
pub mod data_sync;
pub mod history;

pub use compressor::{CompressionMode, StateCompressor};
pub use data_sync::{DataSync, FollowerId};
pub use history::ActionHistory;
