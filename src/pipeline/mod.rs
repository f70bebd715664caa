//! Pipeline stages for image-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step and is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ select ──▶ decode ──▶ assemble ──▶ write
//! (dir/upload)  (filter,   (image)    (lopdf)      (atomic
//!                sort)                              rename)
//! ```
//!
//! 1. [`discover`]: list directory entries or wrap uploads as `SourceItem`s
//! 2. [`select`]: keep the effective format set, order by name/mtime
//! 3. [`decode`]: decode each image and normalise it to RGB
//! 4. [`assemble`]: append one page per image to a single PDF
//! 5. [`write`]: persist the PDF when the destination is a file

pub mod assemble;
pub mod decode;
pub mod discover;
pub mod select;
pub mod write;
