//! Operand-shape catalog.
//!
//! Each shape tag names a fixed permutation from instruction operand
//! positions to API argument slots. The binder interprets these layouts
//! generically; adding a shape is a new table row, not new binding code.

use core::fmt;

/// How one argument slot is resolved from its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// A register of the target's width class, or a memory load.
    Value,
    /// A register read as lane 0 of a 128-bit vector, or a memory load.
    ScalarLane,
    /// An immediate bound to a `uint8` argument.
    Imm8,
    /// An immediate split into two 2-bit `uint8` selectors.
    SplitImm8,
}

impl SlotKind {
    /// Number of argument types the slot consumes.
    pub const fn type_count(self) -> usize {
        match self {
            SlotKind::SplitImm8 => 2,
            _ => 1,
        }
    }
}

/// One argument slot: which operand feeds it and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    /// Operand position (after gate and mask operands are removed).
    pub operand: usize,
    /// Resolution rule.
    pub kind: SlotKind,
}

const fn v(operand: usize) -> Slot {
    Slot {
        operand,
        kind: SlotKind::Value,
    }
}

const fn lane(operand: usize) -> Slot {
    Slot {
        operand,
        kind: SlotKind::ScalarLane,
    }
}

const fn imm(operand: usize) -> Slot {
    Slot {
        operand,
        kind: SlotKind::Imm8,
    }
}

const fn split(operand: usize) -> Slot {
    Slot {
        operand,
        kind: SlotKind::SplitImm8,
    }
}

/// A shape's slots in argument order, plus whether its last positional
/// operand doubles as the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeLayout {
    /// Slots in API argument order; slot 0 is the receiver.
    pub slots: &'static [Slot],
    /// The destination is also the textually-last positional operand.
    pub in_place: bool,
}

impl ShapeLayout {
    /// Number of argument types the slots consume (the result type excluded).
    pub fn arg_type_count(&self) -> usize {
        self.slots.iter().map(|s| s.kind.type_count()).sum()
    }

    /// Number of operands an instruction must have to bind this shape.
    pub fn arity(&self, dest_is_arg0: bool) -> usize {
        if self.in_place || dest_is_arg0 {
            self.slots.len()
        } else {
            self.slots.len() + 1
        }
    }
}

/// Where the bound call's result is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The last remaining operand.
    LastOperand,
    /// The operand bound to argument slot 0.
    Receiver,
}

impl Destination {
    /// Destination rule for a signature.
    pub fn for_signature(dest_is_arg0: bool) -> Self {
        if dest_is_arg0 {
            Destination::Receiver
        } else {
            Destination::LastOperand
        }
    }
}

macro_rules! shape_tags {
    ($($variant:ident => $name:literal, [$($slot:expr),*], $in_place:literal;)*) => {
        /// Operand-shape tags understood by the binder.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(non_camel_case_types)]
        pub enum ShapeTag {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )*
        }

        impl ShapeTag {
            /// Every tag, in catalog order.
            pub const ALL: &'static [ShapeTag] = &[$(ShapeTag::$variant),*];

            /// Resolve a registry shape name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(ShapeTag::$variant),)*
                    _ => None,
                }
            }

            /// The registry name of this tag.
            pub const fn name(self) -> &'static str {
                match self {
                    $(ShapeTag::$variant => $name,)*
                }
            }

            /// Slot layout of this tag.
            pub const fn layout(self) -> ShapeLayout {
                match self {
                    $(ShapeTag::$variant => {
                        const SLOTS: &[Slot] = &[$($slot),*];
                        ShapeLayout {
                            slots: SLOTS,
                            in_place: $in_place,
                        }
                    })*
                }
            }
        }
    };
}

shape_tags! {
    Op1 => "op1", [v(0)], false;
    Op2 => "op2", [v(1), v(0)], false;
    Op2_21 => "op2_21", [v(0), v(1)], false;
    Op2_21Type1 => "op2_21Type1", [v(0), v(1)], true;
    Op3 => "op3", [v(2), v(1), v(0)], false;
    Op3_21 => "op3_21", [v(1), v(2), v(0)], false;
    Op3_21Type1 => "op3_21Type1", [v(1), v(2), v(0)], true;
    Op3_231Type1 => "op3_231Type1", [v(1), v(0), v(2)], true;
    Op2VecAsScalar => "op2VecAsScalar", [v(1), lane(0)], false;
    Op3VecAsScalar => "op3VecAsScalar", [v(2), lane(1), v(0)], false;
    Op4 => "op4", [v(3), v(2), v(1), v(0)], false;
    Op4_231Type1 => "op4_231Type1", [v(2), v(1), v(3), v(0)], true;
    Op4_31 => "op4_31", [v(1), v(2), v(3), v(0)], false;
    Op1Imm8 => "op1Imm8", [v(1), imm(0)], false;
    Op2Imm8 => "op2Imm8", [v(2), imm(0), v(1)], false;
    Op2Imm8_SHA1RNDS4 => "op2Imm8_SHA1RNDS4", [v(2), imm(0), v(1)], true;
    Op2Imm8_2I => "op2Imm8_2I", [v(2), v(1), imm(0)], false;
    Op2Imm8_II => "op2Imm8_II", [v(2), split(0), v(1)], false;
    Op3Imm8 => "op3Imm8", [v(3), imm(0), v(2), v(1)], false;
    Op3Imm8_2I => "op3Imm8_2I", [v(3), v(2), imm(0), v(1)], false;
    Op4Imm8 => "op4Imm8", [v(4), imm(0), v(3), v(2), v(1)], false;
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
