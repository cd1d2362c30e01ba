//! Output aggregator and the public mapping entry point.
//!
//! A [`Mapper`] borrows an immutable [`Registry`] and turns one instruction
//! line into text: every candidate is bound and rendered in registry order,
//! empty renderings are dropped, and the survivors are joined with
//! [`CANDIDATE_SEPARATOR`]. Tokenizer failures become [`ILLEGAL_INPUT`];
//! no survivors becomes [`NO_MAPPING`].

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::binder::{bind, Outcome};
use crate::emitter;
use crate::error::MapError;
use crate::ir::Instruction;
use crate::lexer::parse_instruction;
use crate::registry::{Registry, Signature};

/// Response for input that does not tokenize.
pub const ILLEGAL_INPUT: &str = "Illegal input";

/// Response when no candidate renders. The documentation link is fixed
/// and does not follow [`MapperOptions::package`].
pub const NO_MAPPING: &str = "Missing a direct translation for this instruction, but similar instructions might be available. Please check the documentation at: https://pkg.go.dev/simd/archsimd";

/// Separator between alternative renderings.
pub const CANDIDATE_SEPARATOR: &str = "\n// Or\n";

/// Default API package prefix.
pub const DEFAULT_PACKAGE: &str = "archsimd";

/// Default input size limit in bytes.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 4096;

/// Mapper configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MapperOptions {
    /// Package prefix of the rendered API (`archsimd`). Only rendered code
    /// uses it; [`NO_MAPPING`] keeps its fixed link.
    pub package: String,
    /// Inputs longer than this are rejected as illegal.
    pub max_input_bytes: usize,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// Outcome of one candidate, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateReport {
    /// The candidate rule.
    pub signature: Signature,
    /// How binding went.
    pub outcome: Outcome,
    /// The rendered code, if the candidate survived.
    pub rendering: Option<String>,
}

/// Structured mapping result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Translation {
    /// The parsed instruction.
    pub instruction: Instruction,
    /// Surviving renderings, in registry order.
    pub candidates: Vec<String>,
}

impl Translation {
    /// Whether no candidate survived.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Joined candidates, or [`NO_MAPPING`] when there are none.
impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.candidates.is_empty() {
            return f.write_str(NO_MAPPING);
        }
        for (i, candidate) in self.candidates.iter().enumerate() {
            if i > 0 {
                f.write_str(CANDIDATE_SEPARATOR)?;
            }
            f.write_str(candidate)?;
        }
        Ok(())
    }
}

/// Maps instruction lines against a registry.
///
/// # Examples
///
/// ```
/// use simdmap::{Mapper, Registry, Signature};
///
/// let mut builder = Registry::builder();
/// builder.rule("VPADDD", Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX"));
/// let registry = builder.build();
///
/// let mapper = Mapper::new(&registry);
/// assert_eq!(
///     mapper.map("VPADDD X1, X9, X2"),
///     "if archsimd.X86.AVX() {\n\tX2 = X9.Add(X1) // X9 is of type Int32x4, X1 is of type Int32x4, X2 is of type Int32x4\n}"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Mapper<'r> {
    registry: &'r Registry,
    options: MapperOptions,
}

impl<'r> Mapper<'r> {
    /// Create a mapper with default options.
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, MapperOptions::default())
    }

    /// Create a mapper with the given options.
    pub fn with_options(registry: &'r Registry, options: MapperOptions) -> Self {
        Self { registry, options }
    }

    /// Set the API package prefix.
    pub fn package(&mut self, package: &str) -> &mut Self {
        self.options.package = package.to_string();
        self
    }

    /// Set the input size limit.
    pub fn max_input_bytes(&mut self, limit: usize) -> &mut Self {
        self.options.max_input_bytes = limit;
        self
    }

    /// Current options.
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// The registry this mapper consults.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Parse `text` after checking the size limit.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InputTooLarge`] or any tokenizer error.
    pub fn parse(&self, text: &str) -> Result<Instruction, MapError> {
        let limit = self.options.max_input_bytes;
        if text.len() > limit {
            return Err(MapError::InputTooLarge {
                len: text.len(),
                limit,
            });
        }
        parse_instruction(text)
    }

    /// Bind and render every candidate for `text`, keeping all outcomes.
    ///
    /// # Errors
    ///
    /// Returns the tokenizer error if `text` does not parse.
    pub fn explain(&self, text: &str) -> Result<Vec<CandidateReport>, MapError> {
        let insn = self.parse(text)?;
        Ok(self.reports(&insn))
    }

    /// Map `text` to its surviving renderings.
    ///
    /// # Errors
    ///
    /// Returns the tokenizer error if `text` does not parse.
    pub fn translate(&self, text: &str) -> Result<Translation, MapError> {
        let instruction = self.parse(text)?;
        let candidates = self
            .reports(&instruction)
            .into_iter()
            .filter_map(|r| r.rendering)
            .collect();
        Ok(Translation {
            instruction,
            candidates,
        })
    }

    /// Map `text` to plain output: the joined candidates, [`NO_MAPPING`],
    /// or [`ILLEGAL_INPUT`]. Never fails.
    pub fn map(&self, text: &str) -> String {
        match self.translate(text) {
            Ok(translation) => translation.to_string(),
            Err(e) => {
                log::debug!("illegal input {:?}: {}", text, e);
                ILLEGAL_INPUT.to_string()
            }
        }
    }

    fn reports(&self, insn: &Instruction) -> Vec<CandidateReport> {
        let candidates = self.registry.lookup(&insn.mnemonic);
        if candidates.is_empty() {
            log::debug!("{}: not in registry", insn.mnemonic);
        }
        candidates
            .iter()
            .enumerate()
            .map(|(index, sig)| {
                let outcome = bind(insn, sig);
                let rendering = match &outcome {
                    Outcome::Bound(binding) => {
                        let out = emitter::render(binding, &self.options.package);
                        match &out {
                            Some(_) => log::trace!("{}[{}]: bound {}", insn.mnemonic, index, sig),
                            None => log::debug!(
                                "{}[{}]: {} has no feature gate",
                                insn.mnemonic,
                                index,
                                sig.name
                            ),
                        }
                        out
                    }
                    Outcome::Inapplicable(reason) => {
                        log::debug!("{}[{}]: skipped {}: {}", insn.mnemonic, index, sig.name, reason);
                        None
                    }
                    Outcome::Malformed(reason) => {
                        log::debug!("{}[{}]: malformed rule: {}", insn.mnemonic, index, reason);
                        None
                    }
                };
                CandidateReport {
                    signature: sig.clone(),
                    outcome,
                    rendering,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let mut b = Registry::builder();
        b.rule(
            "VPADDD",
            Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX"),
        )
        .rule(
            "VPADDD",
            Signature::new("Add", "op2", &["Uint32x4", "Uint32x4", "Uint32x4"], "AVX"),
        )
        .rule(
            "VPADDD",
            Signature::new("Add", "op2", &["Int32x8", "Int32x8", "Int32x8"], "AVX2"),
        )
        .rule(
            "VBROKEN",
            Signature::new("Add", "op99", &["Int32x4", "Int32x4", "Int32x4"], "AVX"),
        );
        b.build()
    }

    #[test]
    fn illegal_input() {
        let reg = registry();
        let mapper = Mapper::new(&reg);
        assert_eq!(mapper.map(""), ILLEGAL_INPUT);
        assert_eq!(mapper.map("VPADDD (BX, X9, X2"), ILLEGAL_INPUT);
    }

    #[test]
    fn unknown_mnemonic() {
        let reg = registry();
        assert_eq!(Mapper::new(&reg).map("VFOO X1, X2"), NO_MAPPING);
    }

    #[test]
    fn package_does_not_touch_fallback() {
        let reg = registry();
        let mut mapper = Mapper::new(&reg);
        mapper.package("simd");
        assert!(mapper.map("VPADDD X1, X9, X2").starts_with("if simd.X86.AVX() {"));
        let out = mapper.map("VFOO X1, X2");
        assert_eq!(out, NO_MAPPING);
        assert!(out.ends_with("https://pkg.go.dev/simd/archsimd"));
    }

    #[test]
    fn candidates_joined_in_order() {
        let reg = registry();
        let out = Mapper::new(&reg).map("VPADDD X1, X9, X2");
        let parts: Vec<&str> = out.split(CANDIDATE_SEPARATOR).collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].contains("X9 is of type Int32x4"));
        assert!(parts[1].contains("X9 is of type Uint32x4"));
    }

    #[test]
    fn ymm_selects_wider_rule() {
        let reg = registry();
        let out = Mapper::new(&reg).map("VPADDD Y1, Y9, Y2");
        assert_eq!(
            out,
            "if archsimd.X86.AVX2() {\n\tY2 = Y9.Add(Y1) // Y9 is of type Int32x8, Y1 is of type Int32x8, Y2 is of type Int32x8\n}"
        );
    }

    #[test]
    fn malformed_rule_falls_back() {
        let reg = registry();
        let mapper = Mapper::new(&reg);
        assert_eq!(mapper.map("VBROKEN X1, X2, X3"), NO_MAPPING);
        let reports = mapper.explain("VBROKEN X1, X2, X3").unwrap();
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0].outcome, Outcome::Malformed(_)));
    }

    #[test]
    fn explain_lists_every_candidate() {
        let reg = registry();
        let reports = Mapper::new(&reg).explain("VPADDD X1, X9, X2").unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].rendering.is_some());
        assert!(reports[1].rendering.is_some());
        assert!(reports[2].rendering.is_none());
        assert!(matches!(reports[2].outcome, Outcome::Inapplicable(_)));
    }

    #[test]
    fn translate_structured() {
        let reg = registry();
        let t = Mapper::new(&reg).translate("VPADDD X1, X9, X2").unwrap();
        assert_eq!(t.instruction.mnemonic, "VPADDD");
        assert_eq!(t.candidates.len(), 2);
        let t = Mapper::new(&reg).translate("VFOO").unwrap();
        assert!(t.is_empty());
        assert_eq!(t.to_string(), NO_MAPPING);
        assert_eq!(
            Mapper::new(&reg).translate("   "),
            Err(MapError::EmptyInput)
        );
    }

    #[test]
    fn input_limit() {
        let reg = registry();
        let mut mapper = Mapper::new(&reg);
        mapper.max_input_bytes(8);
        assert_eq!(
            mapper.translate("VPADDD X1, X9, X2"),
            Err(MapError::InputTooLarge { len: 17, limit: 8 })
        );
        assert_eq!(mapper.map("VPADDD X1, X9, X2"), ILLEGAL_INPUT);
    }

    #[test]
    fn package_option() {
        let reg = registry();
        let mut mapper = Mapper::new(&reg);
        mapper.package("simd");
        assert!(mapper.map("VPADDD (BX), X9, X2").contains("simd.LoadInt32x4(*BX)"));
        assert_eq!(mapper.options().package, "simd");
    }

    #[test]
    fn deterministic() {
        let reg = registry();
        let mapper = Mapper::new(&reg);
        let first = mapper.map("VPADDD (BX), X9, X2");
        for _ in 0..4 {
            assert_eq!(mapper.map("VPADDD (BX), X9, X2"), first);
        }
    }

    #[test]
    fn default_options() {
        let opts = MapperOptions::default();
        assert_eq!(opts.package, "archsimd");
        assert_eq!(opts.max_input_bytes, 4096);
    }
}
