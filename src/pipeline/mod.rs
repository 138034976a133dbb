//! Pipeline stages for PDF → PNG preview conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the rendering engine can be swapped without touching
//! the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ package
//! (bytes)   (pdfium)   (PNG)      (name + MIME)
//! ```
//!
//! 1. [`input`]: read a local file or download a URL into memory
//! 2. [`render`]: environment check, decode, page 1 at 4×; blocking, run
//!    under `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]: PNG-encode the raster; base64-wrap stored images for the
//!    vision model
//! 4. [`package`]: `resume.pdf` → `resume.png`, `image/png`

pub mod encode;
pub mod input;
pub mod package;
pub mod render;
