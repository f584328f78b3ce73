//! Tests for the StochML document module.
//!
//! `writing` pins the element contract of the writer; `reading` covers the
//! reconstruction rules and malformed-input handling of the reader.
