//! Element types of the target intrinsics API.
//!
//! Argument type names in the registry are either vector types
//! (`Int32x4`, `Float64x8`, `Mask32x16`) or scalar types (`uint8`,
//! `int32`, `float64`). Vector data types carry a width class: the leading
//! character (`X`, `Y`, `Z`) a register must have to hold a value of the
//! type.

use alloc::string::String;
#[allow(unused_imports)]
use alloc::format;
use core::fmt;

/// Element kind of a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemKind {
    /// Signed integer lanes.
    Int,
    /// Unsigned integer lanes.
    Uint,
    /// IEEE floating-point lanes (32 or 64 bits).
    Float,
    /// Predicate mask lanes.
    Mask,
}

impl ElemKind {
    fn vector_prefix(self) -> &'static str {
        match self {
            ElemKind::Int => "Int",
            ElemKind::Uint => "Uint",
            ElemKind::Float => "Float",
            ElemKind::Mask => "Mask",
        }
    }

    fn scalar_prefix(self) -> Option<&'static str> {
        match self {
            ElemKind::Int => Some("int"),
            ElemKind::Uint => Some("uint"),
            ElemKind::Float => Some("float"),
            ElemKind::Mask => None,
        }
    }

    fn allows_bits(self, bits: u16) -> bool {
        match self {
            ElemKind::Float => matches!(bits, 32 | 64),
            _ => matches!(bits, 8 | 16 | 32 | 64),
        }
    }
}

/// A vector type: `<Kind><bits>x<lanes>`, 128, 256 or 512 bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorType {
    /// Lane element kind.
    pub kind: ElemKind,
    /// Bits per lane.
    pub bits: u16,
    /// Number of lanes.
    pub lanes: u16,
}

impl VectorType {
    /// Parse a vector type name such as `Float32x8`.
    pub fn parse(name: &str) -> Option<Self> {
        let (kind, rest) = [ElemKind::Uint, ElemKind::Int, ElemKind::Float, ElemKind::Mask]
            .into_iter()
            .find_map(|k| name.strip_prefix(k.vector_prefix()).map(|rest| (k, rest)))?;
        let (bits, lanes) = rest.split_once('x')?;
        let bits = parse_decimal(bits)?;
        let lanes = parse_decimal(lanes)?;
        if !kind.allows_bits(bits) {
            return None;
        }
        let ty = Self { kind, bits, lanes };
        if !matches!(ty.width_bits(), 128 | 256 | 512) {
            return None;
        }
        Some(ty)
    }

    /// Total vector width in bits.
    pub fn width_bits(&self) -> u32 {
        u32::from(self.bits) * u32::from(self.lanes)
    }

    /// Register width class: `X` (128), `Y` (256) or `Z` (512).
    ///
    /// Mask types have no width class: they live in vector registers under
    /// AVX2 and in `K` registers under AVX-512.
    pub fn width_class(&self) -> Option<char> {
        if self.kind == ElemKind::Mask {
            return None;
        }
        match self.width_bits() {
            128 => Some('X'),
            256 => Some('Y'),
            512 => Some('Z'),
            _ => None,
        }
    }

    /// The mask type with the same lane layout.
    pub fn mask(&self) -> Self {
        Self {
            kind: ElemKind::Mask,
            ..*self
        }
    }

    /// The 128-bit vector with this type's element kind.
    pub fn lane_view(&self) -> Self {
        Self {
            lanes: 128 / self.bits,
            ..*self
        }
    }
}

impl fmt::Display for VectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}x{}", self.kind.vector_prefix(), self.bits, self.lanes)
    }
}

/// A scalar type: `int8`…`int64`, `uint8`…`uint64`, `float32`, `float64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScalarType {
    /// Element kind (never [`ElemKind::Mask`]).
    pub kind: ElemKind,
    /// Width in bits.
    pub bits: u16,
}

impl ScalarType {
    /// The single-byte unsigned type immediates bind to.
    pub const UINT8: ScalarType = ScalarType {
        kind: ElemKind::Uint,
        bits: 8,
    };

    /// Parse a scalar type name such as `uint8`.
    pub fn parse(name: &str) -> Option<Self> {
        let (kind, rest) = [ElemKind::Uint, ElemKind::Int, ElemKind::Float]
            .into_iter()
            .find_map(|k| {
                k.scalar_prefix()
                    .and_then(|p| name.strip_prefix(p))
                    .map(|rest| (k, rest))
            })?;
        let bits = parse_decimal(rest)?;
        kind.allows_bits(bits).then_some(Self { kind, bits })
    }

    /// The 128-bit vector holding this scalar in lane 0.
    pub fn lane_view(&self) -> VectorType {
        VectorType {
            kind: self.kind,
            bits: self.bits,
            lanes: 128 / self.bits,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.kind.scalar_prefix().unwrap_or("mask");
        write!(f, "{}{}", prefix, self.bits)
    }
}

/// Any argument or result type of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiType {
    /// A vector type.
    Vector(VectorType),
    /// A scalar type.
    Scalar(ScalarType),
}

impl ApiType {
    /// Parse a registry type name.
    pub fn parse(name: &str) -> Option<Self> {
        VectorType::parse(name)
            .map(ApiType::Vector)
            .or_else(|| ScalarType::parse(name).map(ApiType::Scalar))
    }

    /// Register width class, for vector data types.
    pub fn width_class(&self) -> Option<char> {
        match self {
            ApiType::Vector(v) => v.width_class(),
            ApiType::Scalar(_) => None,
        }
    }

    /// Whether a value of this type is loaded through a typed vector load
    /// rather than a plain pointer dereference.
    pub fn is_vector_data(&self) -> bool {
        matches!(self, ApiType::Vector(v) if v.kind != ElemKind::Mask)
    }

    /// Whether this is a mask type.
    pub fn is_mask(&self) -> bool {
        matches!(self, ApiType::Vector(v) if v.kind == ElemKind::Mask)
    }

    /// The 128-bit vector view whose lane 0 holds an element of this type.
    pub fn lane_view(&self) -> VectorType {
        match self {
            ApiType::Vector(v) => v.lane_view(),
            ApiType::Scalar(s) => s.lane_view(),
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiType::Vector(v) => write!(f, "{}", v),
            ApiType::Scalar(s) => write!(f, "{}", s),
        }
    }
}

/// Width class of a type name: `X`, `Y`, `Z`, or `None` for scalars,
/// masks and unknown names.
pub fn width_class(type_name: &str) -> Option<char> {
    ApiType::parse(type_name).and_then(|t| t.width_class())
}

/// The mask type name matching a vector result type (`Float64x8` →
/// `Mask64x8`).
pub fn mask_type_name(type_name: &str) -> Option<String> {
    VectorType::parse(type_name).map(|v| format!("{}", v.mask()))
}

fn parse_decimal(text: &str) -> Option<u16> {
    if text.is_empty() || text.starts_with('0') || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
