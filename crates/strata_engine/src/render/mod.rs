//! # Rendering Contract
//!
//! The engine core does not own a graphics backend. Component and entity
//! `draw` hooks submit [`DrawCall`]s to an externally supplied [`DrawBatch`];
//! the backend decides how to batch, sort within a layer, and submit to the GPU.
//!
//! ## Submission Order
//!
//! ```text
//! Scene (visible)
//!   └─ Layer (visible, descending priority)
//!        begin_layer(LayerPass)
//!        └─ Entity (visible, descending depth: lowest depth last, on top)
//!             └─ Component (visible, attach order) → draw(DrawCall) × N
//!        end_layer()
//! ```
//!
//! Call order is meaningful: backends that paint in submission order get the
//! correct layering for free.

mod batch;

pub use batch::{DrawBatch, DrawCall, LayerPass, RecordingBatch, RecordedPass};
