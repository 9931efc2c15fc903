// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Properties of stack composition and synthesis over generated groups,
//! network modes and zone counts.

mod composition;
