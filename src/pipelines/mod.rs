// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing pipelines
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────────┐     ┌──────────────┐
//! │ Track Frame  │ ──▶ │   Beauty Pipeline     │ ──▶ │ Same Frame   │
//! │   (I420)     │     │  - duplicate planes   │     │ (I420, in    │
//! │              │     │  - I420→RGBA (raw)    │     │  place)      │
//! │              │     │  - filter graph       │     │              │
//! │              │     │  - RGBA→I420, copy    │     │              │
//! └──────────────┘     └───────────────────────┘     └──────────────┘
//! ```
//!
//! # Design Principles
//!
//! 1. **Synchronous**: a frame is finished when `process` returns
//! 2. **Never drop a frame**: any failure leaves the frame as it arrived
//! 3. **GPU when available**: falls back to CPU kernels in `auto` mode
//!
//! # Modules
//!
//! - [`beauty`]: the per-track beauty pipeline and its parameter surface

pub mod beauty;
