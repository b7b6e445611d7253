//! Interactive derivation graph explorer.
//!
//! The explorer owns one [`crate::Engine`] and acts as its host:
//! - sends the engine's request tickets over HTTP and feeds the answers back,
//! - drives `tick` from `requestAnimationFrame` and forwards window resizes,
//! - measures rendered nodes when the engine asks for it,
//! - paints a plain structural DOM (rows, rule headers, nodes, symbols).
//!
//! # Example
//!
//! ```ignore
//! use trace_graph::{EngineConfig, GraphExplorer};
//!
//! view! { <GraphExplorer config=EngineConfig::default() /> }
//! ```

mod component;
mod driver;
mod measure;
mod snapshot;

pub use component::GraphExplorer;
