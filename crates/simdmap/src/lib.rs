//! # simdmap — Go amd64 vector assembly to `archsimd` intrinsics
//!
//! `simdmap` takes one Go assembler instruction line, such as
//! `VPADDD (BX), X9, X2`, and renders the equivalent call(s) against Go's
//! `simd/archsimd` package, each gated on the CPU feature it needs.
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "toml")] {
//! use simdmap::map_instruction;
//!
//! let out = map_instruction("VPADDD (BX), X9, X2");
//! assert!(out.starts_with("if archsimd.X86.AVX() {"));
//! assert!(out.contains("X2 = X9.Add(archsimd.LoadInt32x4(*BX))"));
//! # }
//! ```
//!
//! ## Pipeline
//!
//! - **Lexer**: splits the line into a mnemonic and typed operands.
//! - **Registry**: mnemonic → ordered candidate [`Signature`]s.
//! - **Binder**: binds operands to argument slots using a shape layout.
//! - **Emitter**: renders each bound candidate as feature-gated code.
//! - **Mapper**: joins surviving candidates, or returns a fixed message.
//!
//! ## Features
//!
//! - `std` (default): `std::error::Error` for [`MapError`].
//! - `serde`: `Serialize`/`Deserialize` on the public data types.
//! - `toml` (default): TOML datasets and the bundled [`Registry::builtin`].

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::return_self_not_must_use
)]

extern crate alloc;

/// Shape binder: operands → argument slots, with a three-way outcome.
pub mod binder;
/// Candidate emitter: feature-gated code for one bound candidate.
pub mod emitter;
/// Error types and source-span diagnostics.
pub mod error;
/// Intermediate representation: operands and instructions.
pub mod ir;
/// Tokenizer with span tracking and operand parsing.
pub mod lexer;
/// Output aggregator and configuration.
pub mod mapper;
/// Rule registry and dataset loading.
pub mod registry;
/// Declarative operand-shape catalog.
pub mod shape;
/// Element types and register width classes.
pub mod types;

// Re-exports
pub use binder::{bind, Arg, Binding, Outcome, SkipReason};
pub use error::{MapError, Span};
pub use ir::{Immediate, Instruction, MemoryOperand, Operand, OperandKind};
pub use lexer::parse_instruction;
pub use mapper::{
    CandidateReport, Mapper, MapperOptions, Translation, CANDIDATE_SEPARATOR,
    DEFAULT_MAX_INPUT_BYTES, DEFAULT_PACKAGE, ILLEGAL_INPUT, NO_MAPPING,
};
pub use registry::{Registry, RegistryBuilder, Signature};
pub use shape::{ShapeLayout, ShapeTag, SlotKind};
pub use types::{ApiType, ElemKind, ScalarType, VectorType};

use alloc::string::String;

/// Map one instruction line using the bundled dataset.
///
/// # Examples
///
/// ```rust
/// use simdmap::{map_instruction, ILLEGAL_INPUT};
///
/// assert_eq!(map_instruction(""), ILLEGAL_INPUT);
/// ```
#[cfg(feature = "toml")]
pub fn map_instruction(text: &str) -> String {
    Mapper::new(Registry::builtin()).map(text)
}

/// Map one instruction line against `registry` with default options.
///
/// # Examples
///
/// ```rust
/// use simdmap::{map_with_registry, Registry, NO_MAPPING};
///
/// let empty = Registry::default();
/// assert_eq!(map_with_registry("VPADDD X1, X2, X3", &empty), NO_MAPPING);
/// ```
pub fn map_with_registry(text: &str, registry: &Registry) -> String {
    Mapper::new(registry).map(text)
}
