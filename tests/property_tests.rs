// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify properties that must hold for
//! every valid stack input: derived names, variant shape, declaration order
//! and deterministic synthesis.

mod fixtures;
mod property;
