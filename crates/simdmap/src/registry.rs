//! Rule registry: mnemonic → ordered candidate signatures.
//!
//! A [`Registry`] is built once, either programmatically through
//! [`RegistryBuilder`] or from a TOML dataset, and never mutated afterward.
//! Candidate order within a mnemonic is ranking priority.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::binder::SkipReason;
use crate::error::MapError;
use crate::shape::{ShapeLayout, ShapeTag};
use crate::types::ApiType;

/// One rewrite rule: an API call and how an instruction's operands bind
/// to it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    /// API method name, e.g. `Add`.
    pub name: String,
    /// Shape tag name, e.g. `op2`. Resolved by [`Signature::layout`].
    pub shape: String,
    /// Argument type names in slot order; the last entry is the result type.
    pub args: Vec<String>,
    /// CPU feature gate, e.g. `AVX2`. Empty means the rule never renders.
    pub feature: String,
    /// Required value of a leading immediate operand, which is then consumed.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub const_imm: Option<u64>,
    /// The destination is the receiver operand instead of the last operand.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "is_false"))]
    pub dest_is_arg0: bool,
}

#[cfg(feature = "serde")]
fn is_false(b: &bool) -> bool {
    !*b
}

impl Signature {
    /// Create a signature with no constant-immediate gate.
    ///
    /// # Examples
    ///
    /// ```
    /// use simdmap::Signature;
    ///
    /// let sig = Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX");
    /// assert_eq!(sig.result_type(), Some("Int32x4"));
    /// ```
    pub fn new(name: &str, shape: &str, args: &[&str], feature: &str) -> Self {
        Self {
            name: name.to_string(),
            shape: shape.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            feature: feature.to_string(),
            const_imm: None,
            dest_is_arg0: false,
        }
    }

    /// Require a leading immediate equal to `value`.
    #[must_use]
    pub fn with_const_imm(mut self, value: u64) -> Self {
        self.const_imm = Some(value);
        self
    }

    /// Write the result to the receiver operand.
    #[must_use]
    pub fn with_dest_is_arg0(mut self) -> Self {
        self.dest_is_arg0 = true;
        self
    }

    /// The result type name (last argument type).
    pub fn result_type(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    /// Resolve the shape tag and check the record against it.
    ///
    /// # Errors
    ///
    /// Returns the defect when the shape tag is unknown or the record lists
    /// fewer argument types than the shape consumes plus the result.
    pub fn layout(&self) -> Result<ShapeLayout, SkipReason> {
        let tag = ShapeTag::from_name(&self.shape)
            .ok_or_else(|| SkipReason::UnknownShape(self.shape.clone()))?;
        let layout = tag.layout();
        let expected = layout.arg_type_count() + 1;
        if self.args.len() < expected {
            return Err(SkipReason::TypeCountMismatch {
                expected,
                found: self.args.len(),
            });
        }
        Ok(layout)
    }

    /// Oddities that do not stop the record from binding: type names
    /// outside the vector and scalar model (bound as opaque scalars) and
    /// surplus types between the last slot and the result.
    pub fn warnings(&self) -> Vec<SkipReason> {
        let mut warnings = Vec::new();
        if let Ok(layout) = self.layout() {
            let expected = layout.arg_type_count() + 1;
            if self.args.len() > expected {
                warnings.push(SkipReason::TypeCountMismatch {
                    expected,
                    found: self.args.len(),
                });
            }
        }
        warnings.extend(
            self.args
                .iter()
                .filter(|a| ApiType::parse(a).is_none())
                .map(|a| SkipReason::UnknownType(a.clone())),
        );
        warnings
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs = self.args.len().saturating_sub(1);
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args[..inputs].iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(arg)?;
        }
        write!(f, ")")?;
        if let Some(result) = self.result_type() {
            write!(f, " -> {}", result)?;
        }
        write!(f, " [{}", self.shape)?;
        if let Some(imm) = self.const_imm {
            write!(f, ", ${}", imm)?;
        }
        if self.dest_is_arg0 {
            f.write_str(", dest=arg0")?;
        }
        write!(f, "] {}", self.feature)
    }
}

/// Immutable mapping from mnemonic to ordered candidate signatures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Registry {
    rules: BTreeMap<String, Vec<Signature>>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Candidates for `mnemonic`, in ranking order. Lookup is exact and
    /// case-sensitive; unknown mnemonics yield an empty slice.
    pub fn lookup(&self, mnemonic: &str) -> &[Signature] {
        self.rules.get(mnemonic).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All mnemonics, in sorted order.
    pub fn mnemonics(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.keys().map(String::as_str)
    }

    /// Number of mnemonics.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry has no mnemonics.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Total number of signatures across all mnemonics.
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Check every record and return all defects.
    ///
    /// Defective records are kept in the registry; the binder reports them
    /// as malformed and moves on to the next candidate.
    pub fn validate(&self) -> Vec<MapError> {
        let mut defects = Vec::new();
        for (mnemonic, sigs) in &self.rules {
            for (index, sig) in sigs.iter().enumerate() {
                if let Err(reason) = sig.layout() {
                    defects.push(MapError::InvalidSignature {
                        mnemonic: mnemonic.clone(),
                        index,
                        detail: reason.to_string(),
                    });
                }
            }
        }
        defects
    }

    /// Every record warning, see [`Signature::warnings`].
    pub fn warnings(&self) -> Vec<MapError> {
        let mut found = Vec::new();
        for (mnemonic, sigs) in &self.rules {
            for (index, sig) in sigs.iter().enumerate() {
                found.extend(sig.warnings().into_iter().map(|reason| {
                    MapError::InvalidSignature {
                        mnemonic: mnemonic.clone(),
                        index,
                        detail: reason.to_string(),
                    }
                }));
            }
        }
        found
    }

    /// Parse a TOML dataset.
    ///
    /// Each mnemonic is an array of tables with keys `name`, `shape`,
    /// `args`, `feature` and optionally `const_imm` and `dest_is_arg0`.
    /// Defective records are logged and kept.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Registry`] if the text is not valid TOML or does
    /// not follow the schema.
    ///
    /// # Examples
    ///
    /// ```
    /// use simdmap::Registry;
    ///
    /// let registry = Registry::from_toml_str(r#"
    ///     [[VPADDD]]
    ///     name = "Add"
    ///     shape = "op2"
    ///     args = ["Int32x4", "Int32x4", "Int32x4"]
    ///     feature = "AVX"
    /// "#)?;
    /// assert_eq!(registry.lookup("VPADDD").len(), 1);
    /// # Ok::<(), simdmap::MapError>(())
    /// ```
    #[cfg(feature = "toml")]
    pub fn from_toml_str(text: &str) -> Result<Self, MapError> {
        let registry: Registry = toml::from_str(text).map_err(|e| MapError::Registry {
            msg: e.to_string(),
        })?;
        for defect in registry.validate() {
            log::warn!("defective rule {}", defect);
        }
        for warning in registry.warnings() {
            log::info!("unusual rule {}", warning);
        }
        log::debug!(
            "loaded {} rules for {} mnemonics",
            registry.rule_count(),
            registry.len()
        );
        Ok(registry)
    }

    /// The bundled amd64 dataset, parsed once per process.
    #[cfg(feature = "toml")]
    pub fn builtin() -> &'static Registry {
        static BUILTIN: std::sync::OnceLock<Registry> = std::sync::OnceLock::new();
        BUILTIN.get_or_init(|| match Registry::from_toml_str(BUILTIN_DATASET) {
            Ok(registry) => registry,
            Err(e) => {
                log::error!("bundled dataset failed to load: {}", e);
                Registry::default()
            }
        })
    }
}

/// Source text of the bundled dataset.
#[cfg(feature = "toml")]
pub const BUILTIN_DATASET: &str = include_str!("../data/amd64.toml");

/// Incremental [`Registry`] construction.
///
/// # Examples
///
/// ```
/// use simdmap::{Registry, Signature};
///
/// let mut builder = Registry::builder();
/// builder
///     .rule("VPADDD", Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX"))
///     .rule("VPADDD", Signature::new("Add", "op2", &["Uint32x4", "Uint32x4", "Uint32x4"], "AVX"));
/// let registry = builder.build();
/// assert_eq!(registry.lookup("VPADDD").len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    rules: BTreeMap<String, Vec<Signature>>,
}

impl RegistryBuilder {
    /// Append a candidate for `mnemonic` after any already added.
    pub fn rule(&mut self, mnemonic: &str, sig: Signature) -> &mut Self {
        self.rules.entry(mnemonic.to_string()).or_default().push(sig);
        self
    }

    /// Append several candidates for `mnemonic`, in order.
    pub fn rules<I>(&mut self, mnemonic: &str, sigs: I) -> &mut Self
    where
        I: IntoIterator<Item = Signature>,
    {
        self.rules
            .entry(mnemonic.to_string())
            .or_default()
            .extend(sigs);
        self
    }

    /// Freeze the accumulated rules into a registry, leaving the builder empty.
    pub fn build(&mut self) -> Registry {
        Registry {
            rules: core::mem::take(&mut self.rules),
        }
    }
}
