//! Property-based tests for IR documents.
//!
//! These check the content hash contract: it is a pure function of the
//! document body, it changes with the body, and it survives serialization.
