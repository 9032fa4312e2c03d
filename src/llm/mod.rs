//! Language model integration: the Groq client, offline selection and the
//! select-then-execute bridge.

pub mod bridge;
pub mod groq;
pub mod simulate;
