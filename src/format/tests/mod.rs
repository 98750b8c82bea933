//! Unit tests for the annotation file format.
//!
//! These tests verify the written tag tree, the reader's extraction pass and
//! write-then-read fidelity.

mod roundtrip_tests;
