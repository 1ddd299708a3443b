//! juspub — legal publication intake bot.
//!
//! Ingests court-publication notices from a mailbox, splits bundled
//! publications apart, extracts structured metadata with an AI backend
//! (deterministic regex fallback when the model misbehaves), computes the
//! Prazo Fatal under business-day rules and files each publication as a
//! board card.

pub mod cards;
pub mod channels;
pub mod config;
pub mod deadline;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod segmenter;
pub mod special_list;
pub mod text;
