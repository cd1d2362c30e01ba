//! Intermediate representation for one parsed instruction line.
//!
//! The tokenizer produces an [`Instruction`]; the binder consumes its
//! operands slot by slot.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Leading character of predicate-mask registers (`K1`–`K7`).
pub const MASK_PREFIX: char = 'K';

/// Register-name prefixes that encode a vector width class.
pub const WIDTH_CLASSES: [char; 3] = ['X', 'Y', 'Z'];

/// Coarse operand classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperandKind {
    /// A register name.
    Register,
    /// A memory reference.
    Memory,
    /// A `$`-prefixed immediate.
    Immediate,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandKind::Register => write!(f, "register"),
            OperandKind::Memory => write!(f, "memory"),
            OperandKind::Immediate => write!(f, "immediate"),
        }
    }
}

/// A memory operand: `disp(base)(index*scale)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryOperand {
    /// Base register (e.g., `BX` in `8(BX)`).
    pub base: String,
    /// Index register (e.g., `CX` in `(BX)(CX*4)`).
    pub index: Option<String>,
    /// Index scale factor: 1, 2, 4, or 8.
    pub scale: u8,
    /// Signed displacement in bytes.
    pub disp: i64,
}

impl MemoryOperand {
    /// A plain `(base)` reference.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            index: None,
            scale: 1,
            disp: 0,
        }
    }
}

/// Renders the combined address expression, `base[+index[*scale]][±disp]`.
impl fmt::Display for MemoryOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let Some(index) = &self.index {
            write!(f, "+{}", index)?;
            if self.scale != 1 {
                write!(f, "*{}", self.scale)?;
            }
        }
        if self.disp > 0 {
            write!(f, "+{}", self.disp)?;
        } else if self.disp < 0 {
            write!(f, "{}", self.disp)?;
        }
        Ok(())
    }
}

/// An immediate as written (`$0x01` is kept as `0x01`) plus its value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Immediate {
    /// Source text without the `$`.
    pub text: String,
    /// Numeric value, or `None` for symbolic constants.
    pub value: Option<i128>,
}

impl Immediate {
    /// The value as an unsigned 64-bit integer, if it is numeric and fits.
    pub fn as_u64(&self) -> Option<u64> {
        self.value.and_then(|v| u64::try_from(v).ok())
    }
}

/// A typed instruction operand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// A register, taken verbatim (`X9`, `Z21`, `K3`, `R11`).
    Register(String),
    /// A memory reference.
    Memory(MemoryOperand),
    /// A `$` immediate.
    Immediate(Immediate),
}

impl Operand {
    /// The operand's kind.
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Register(_) => OperandKind::Register,
            Operand::Memory(_) => OperandKind::Memory,
            Operand::Immediate(_) => OperandKind::Immediate,
        }
    }

    /// Whether this is a predicate-mask register.
    pub fn is_mask_register(&self) -> bool {
        matches!(self, Operand::Register(name) if name.starts_with(MASK_PREFIX))
    }

    /// The `X`/`Y`/`Z` width class of a vector register operand.
    pub fn width_class(&self) -> Option<char> {
        match self {
            Operand::Register(name) => name.chars().next().filter(|c| WIDTH_CLASSES.contains(c)),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(name) => write!(f, "{}", name),
            Operand::Memory(mem) => write!(f, "{}", mem),
            Operand::Immediate(imm) => write!(f, "{}", imm.text),
        }
    }
}

/// One parsed instruction line: mnemonic plus operands in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// Operation mnemonic, e.g. `VPADDD`.
    pub mnemonic: String,
    /// Operands in Go assembler order (sources first, destination last).
    pub operands: Vec<Operand>,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        for (i, op) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            match op {
                Operand::Immediate(imm) => write!(f, "{}${}", sep, imm.text)?,
                Operand::Memory(mem) => write!(f, "{}({})", sep, mem)?,
                Operand::Register(_) => write!(f, "{}{}", sep, op)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec;

    #[test]
    fn memory_display_base_only() {
        assert_eq!(format!("{}", MemoryOperand::new("BX")), "BX");
    }

    #[test]
    fn memory_display_full() {
        let mem = MemoryOperand {
            base: "AX".into(),
            index: Some("CX".into()),
            scale: 4,
            disp: -16,
        };
        assert_eq!(format!("{}", mem), "AX+CX*4-16");
    }

    #[test]
    fn memory_display_positive_disp() {
        let mem = MemoryOperand {
            disp: 8,
            ..MemoryOperand::new("SI")
        };
        assert_eq!(format!("{}", mem), "SI+8");
    }

    #[test]
    fn mask_register_detection() {
        assert!(Operand::Register("K3".into()).is_mask_register());
        assert!(!Operand::Register("X3".into()).is_mask_register());
        assert!(!Operand::Memory(MemoryOperand::new("K1")).is_mask_register());
    }

    #[test]
    fn width_class_of_operands() {
        assert_eq!(Operand::Register("Z21".into()).width_class(), Some('Z'));
        assert_eq!(Operand::Register("Y0".into()).width_class(), Some('Y'));
        assert_eq!(Operand::Register("R11".into()).width_class(), None);
        assert_eq!(Operand::Register("K1".into()).width_class(), None);
    }

    #[test]
    fn immediate_as_u64() {
        let imm = Immediate {
            text: "-1".into(),
            value: Some(-1),
        };
        assert_eq!(imm.as_u64(), None);
        let imm = Immediate {
            text: "0x10".into(),
            value: Some(16),
        };
        assert_eq!(imm.as_u64(), Some(16));
    }

    #[test]
    fn instruction_display() {
        let insn = Instruction {
            mnemonic: "VPINSRD".into(),
            operands: vec![
                Operand::Immediate(Immediate {
                    text: "7".into(),
                    value: Some(7),
                }),
                Operand::Memory(MemoryOperand::new("R11")),
                Operand::Register("X9".into()),
                Operand::Register("X11".into()),
            ],
        };
        assert_eq!(format!("{}", insn), "VPINSRD $7, (R11), X9, X11");
    }
}
