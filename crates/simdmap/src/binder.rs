//! Shape binder: binds an instruction's operands to one signature.
//!
//! [`bind`] runs the constant-immediate gate, detects a predicate mask,
//! checks arity and then walks the shape's slot layout, resolving each
//! operand according to its [`SlotKind`]. The result is a three-way
//! [`Outcome`].

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::ir::{Instruction, Operand};
use crate::registry::Signature;
use crate::shape::{Destination, ShapeLayout, SlotKind};
use crate::types::{self, ApiType};

/// One rendered call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arg {
    /// A register, verbatim.
    Register(String),
    /// A typed vector load: `<pkg>.Load<ty>(*<addr>)`.
    Load {
        /// Vector type name.
        ty: String,
        /// Address expression.
        addr: String,
    },
    /// A scalar pointer dereference: `*<addr>`.
    Deref(String),
    /// Lane 0 of a register viewed as a 128-bit vector:
    /// `<reg>.As<view>().GetElem(0)`.
    Lane {
        /// Register name.
        reg: String,
        /// 128-bit vector type name.
        view: String,
    },
    /// An immediate, verbatim.
    Imm(String),
    /// Low 2-bit selector of a split immediate: `<v>&0b11`.
    ImmLow(String),
    /// High 2-bit selector of a split immediate: `<v>>>4&0b11`.
    ImmHigh(String),
}

impl Arg {
    /// Render the argument, qualifying loads with `package`.
    pub fn render(&self, package: &str) -> String {
        match self {
            Arg::Register(reg) => reg.clone(),
            Arg::Load { ty, addr } => format!("{}.Load{}(*{})", package, ty, addr),
            Arg::Deref(addr) => format!("*{}", addr),
            Arg::Lane { reg, view } => format!("{}.As{}().GetElem(0)", reg, view),
            Arg::Imm(v) => v.clone(),
            Arg::ImmLow(v) => format!("{}&0b11", v),
            Arg::ImmHigh(v) => format!("{}>>4&0b11", v),
        }
    }
}

/// A signature fully bound to an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Binding {
    /// API method name.
    pub method: String,
    /// Arguments in slot order; `args[0]` is the receiver.
    pub args: Vec<Arg>,
    /// Destination register.
    pub dest: String,
    /// Captured predicate-mask register.
    pub mask: Option<String>,
    /// Result type name.
    pub result_type: String,
    /// Type and width notes, in binding order.
    pub notes: Vec<String>,
    /// CPU feature gate, after any mask upgrade.
    pub feature: String,
}

/// Why a candidate did not bind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkipReason {
    /// The shape tag is not in the catalog.
    UnknownShape(String),
    /// The number of argument types does not fit the shape.
    TypeCountMismatch {
        /// Types the shape consumes, plus the result type.
        expected: usize,
        /// Types the record lists.
        found: usize,
    },
    /// An argument type name is not a known vector or scalar type.
    UnknownType(String),
    /// The leading operand is not the required constant immediate.
    ConstImmMismatch {
        /// The required value.
        expected: u64,
    },
    /// More than one mask register in the operand list.
    MultipleMasks(usize),
    /// Operand count differs from the shape arity.
    ArityMismatch {
        /// Operands the shape needs.
        expected: usize,
        /// Operands left after gate and mask removal.
        found: usize,
    },
    /// An operand cannot fill its argument slot.
    OperandRejected {
        /// Argument slot index.
        slot: usize,
        /// The operand, as written.
        operand: String,
        /// What the slot wanted.
        wanted: String,
    },
    /// The destination is not a register of the result type.
    BadDestination {
        /// The operand, as written.
        operand: String,
        /// The result type.
        wanted: String,
    },
}

impl SkipReason {
    /// Whether the reason is a defect of the rule record itself rather than
    /// a mismatch with this instruction.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            SkipReason::UnknownShape(_)
                | SkipReason::TypeCountMismatch { .. }
                | SkipReason::UnknownType(_)
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownShape(tag) => write!(f, "unknown shape tag '{}'", tag),
            SkipReason::TypeCountMismatch { expected, found } => {
                write!(f, "expected {} argument types, found {}", expected, found)
            }
            SkipReason::UnknownType(name) => write!(f, "unknown argument type '{}'", name),
            SkipReason::ConstImmMismatch { expected } => {
                write!(f, "first operand is not the immediate {}", expected)
            }
            SkipReason::MultipleMasks(n) => write!(f, "{} mask registers", n),
            SkipReason::ArityMismatch { expected, found } => {
                write!(f, "expected {} operands, found {}", expected, found)
            }
            SkipReason::OperandRejected {
                slot,
                operand,
                wanted,
            } => write!(f, "argument {}: {} cannot bind {}", slot, operand, wanted),
            SkipReason::BadDestination { operand, wanted } => {
                write!(f, "destination {} cannot hold {}", operand, wanted)
            }
        }
    }
}

/// Result of binding one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    /// Every slot resolved.
    Bound(Binding),
    /// The rule does not fit this instruction.
    Inapplicable(SkipReason),
    /// The rule record cannot be interpreted.
    Malformed(SkipReason),
}

impl Outcome {
    /// The binding, if bound.
    pub fn binding(&self) -> Option<&Binding> {
        match self {
            Outcome::Bound(b) => Some(b),
            _ => None,
        }
    }
}

/// Bind `insn` to `sig`.
///
/// # Examples
///
/// ```
/// use simdmap::{bind, parse_instruction, Outcome, Signature};
///
/// let insn = parse_instruction("VPADDD X1, X9, X2")?;
/// let sig = Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX");
/// match bind(&insn, &sig) {
///     Outcome::Bound(b) => assert_eq!(b.dest, "X2"),
///     other => panic!("{other:?}"),
/// }
/// # Ok::<(), simdmap::MapError>(())
/// ```
pub fn bind(insn: &Instruction, sig: &Signature) -> Outcome {
    let layout = match sig.layout() {
        Ok(layout) => layout,
        Err(reason) => return Outcome::Malformed(reason),
    };
    let types: Vec<SlotType<'_>> = sig.args.iter().map(|a| SlotType::new(a)).collect();

    match bind_operands(insn, sig, layout, &types) {
        Ok(binding) => Outcome::Bound(binding),
        Err(reason) => Outcome::Inapplicable(reason),
    }
}

fn bind_operands(
    insn: &Instruction,
    sig: &Signature,
    layout: ShapeLayout,
    types: &[SlotType<'_>],
) -> Result<Binding, SkipReason> {
    let mut operands: Vec<&Operand> = insn.operands.iter().collect();

    if let Some(expected) = sig.const_imm {
        match operands.first() {
            Some(Operand::Immediate(imm)) if imm.as_u64() == Some(expected) => {
                operands.remove(0);
            }
            _ => return Err(SkipReason::ConstImmMismatch { expected }),
        }
    }

    let mut mask = None;
    let n = operands.len();
    if n > 1 && operands[n - 2].is_mask_register() {
        let count = operands.iter().filter(|op| op.is_mask_register()).count();
        if count != 1 {
            return Err(SkipReason::MultipleMasks(count));
        }
        mask = Some(operands.remove(n - 2).to_string());
    }

    let expected = layout.arity(sig.dest_is_arg0);
    if operands.len() != expected {
        return Err(SkipReason::ArityMismatch {
            expected,
            found: operands.len(),
        });
    }

    let mut state = State::default();
    let mut cursor = 0;
    for (index, slot) in layout.slots.iter().enumerate() {
        let op = operands[slot.operand];
        let ty = &types[cursor];
        let bound = match slot.kind {
            SlotKind::Value => state.value(op, ty),
            SlotKind::ScalarLane => state.lane(op, ty),
            SlotKind::Imm8 => state.imm(op, ty),
            SlotKind::SplitImm8 => state.split(op, ty, &types[cursor + 1]),
        };
        if !bound {
            return Err(SkipReason::OperandRejected {
                slot: index,
                operand: op.to_string(),
                wanted: wanted(slot.kind, ty),
            });
        }
        cursor += slot.kind.type_count();
    }

    let dest_op = match Destination::for_signature(sig.dest_is_arg0) {
        Destination::Receiver => operands[layout.slots[0].operand],
        Destination::LastOperand => operands[operands.len() - 1],
    };
    let result = &types[types.len() - 1];
    let dest = match dest_op {
        Operand::Register(reg) if register_fits(dest_op, result) => reg.clone(),
        _ => {
            return Err(SkipReason::BadDestination {
                operand: dest_op.to_string(),
                wanted: result.to_string(),
            })
        }
    };
    state.notes.push(format!("{} is of type {}", dest, result));

    let mut feature = sig.feature.clone();
    if let Some(k) = &mask {
        if !feature.is_empty() && !feature.starts_with("AVX512") {
            feature = "AVX512".to_string();
        }
        let mask_ty = types::mask_type_name(result.name).unwrap_or_else(|| result.name.to_string());
        state.notes.push(format!("{} is of type {}", k, mask_ty));
    }

    Ok(Binding {
        method: sig.name.clone(),
        args: state.args,
        dest,
        mask,
        result_type: result.to_string(),
        notes: state.notes,
        feature,
    })
}

/// One argument type as named by the rule. Names outside the vector and
/// scalar model are kept verbatim: they have no width class and load
/// through a plain dereference.
#[derive(Debug, Clone, Copy)]
struct SlotType<'a> {
    name: &'a str,
    api: Option<ApiType>,
}

impl<'a> SlotType<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            api: ApiType::parse(name),
        }
    }

    fn width_class(&self) -> Option<char> {
        self.api.and_then(|t| t.width_class())
    }

    fn is_vector_data(&self) -> bool {
        self.api.is_some_and(|t| t.is_vector_data())
    }

    fn is_uint8(&self) -> bool {
        self.api == Some(ApiType::Scalar(types::ScalarType::UINT8))
    }

    /// 128-bit view for a lane read; `Uint8x16` unless the element type is
    /// a known non-mask type.
    fn lane_view(&self) -> String {
        match self.api {
            Some(t) if !t.is_mask() => t.lane_view().to_string(),
            _ => "Uint8x16".to_string(),
        }
    }
}

impl fmt::Display for SlotType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Whether a register operand can carry a value of `ty` without a load.
/// Registers without a width-class prefix (`K1`, `AX`) fit any type;
/// `X`/`Y`/`Z` registers fit only a vector of the same class.
fn register_fits(op: &Operand, ty: &SlotType<'_>) -> bool {
    match op.width_class() {
        None => true,
        Some(class) => ty.width_class() == Some(class),
    }
}

fn wanted(kind: SlotKind, ty: &SlotType<'_>) -> String {
    match kind {
        SlotKind::Value => ty.to_string(),
        SlotKind::ScalarLane => format!("lane of {}", ty),
        SlotKind::Imm8 | SlotKind::SplitImm8 => format!("{} immediate", ty),
    }
}

#[derive(Default)]
struct State {
    args: Vec<Arg>,
    notes: Vec<String>,
}

impl State {
    fn value(&mut self, op: &Operand, ty: &SlotType<'_>) -> bool {
        match op {
            Operand::Register(reg) if register_fits(op, ty) => {
                self.notes.push(format!("{} is of type {}", reg, ty));
                self.args.push(Arg::Register(reg.clone()));
                true
            }
            _ => self.load(op, ty),
        }
    }

    /// Any register is read as lane 0 of a 128-bit vector typed after the
    /// element (`X1.AsUint64x2()` for `uint64`), rather than always
    /// through `AsUint8x16`, so the lane has the argument's own type.
    fn lane(&mut self, op: &Operand, ty: &SlotType<'_>) -> bool {
        match op {
            Operand::Register(reg) => {
                self.notes.push(format!("{} must be a 128-bit vector", reg));
                self.args.push(Arg::Lane {
                    reg: reg.clone(),
                    view: ty.lane_view(),
                });
                true
            }
            _ => self.load(op, ty),
        }
    }

    fn load(&mut self, op: &Operand, ty: &SlotType<'_>) -> bool {
        let Operand::Memory(mem) = op else {
            return false;
        };
        let addr = mem.to_string();
        if ty.is_vector_data() {
            self.args.push(Arg::Load {
                ty: ty.name.to_string(),
                addr,
            });
        } else {
            self.args.push(Arg::Deref(addr));
        }
        true
    }

    fn imm(&mut self, op: &Operand, ty: &SlotType<'_>) -> bool {
        match imm8_text(op, ty) {
            Some(text) => {
                self.args.push(Arg::Imm(text));
                true
            }
            None => false,
        }
    }

    fn split(&mut self, op: &Operand, lo: &SlotType<'_>, hi: &SlotType<'_>) -> bool {
        match (imm8_text(op, lo), imm8_text(op, hi)) {
            (Some(text), Some(_)) => {
                self.args.push(Arg::ImmLow(text.clone()));
                self.args.push(Arg::ImmHigh(text));
                true
            }
            _ => false,
        }
    }
}

/// Text of an immediate operand bindable to `ty`, which must be `uint8`.
/// Symbolic immediates are accepted; numeric ones must fit in a byte.
fn imm8_text(op: &Operand, ty: &SlotType<'_>) -> Option<String> {
    let Operand::Immediate(imm) = op else {
        return None;
    };
    if !ty.is_uint8() {
        return None;
    }
    match imm.value {
        Some(v) if !(0..=255).contains(&v) => None,
        _ => Some(imm.text.clone()),
    }
}
