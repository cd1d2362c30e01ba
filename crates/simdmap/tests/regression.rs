//! Regression tests for binding edge cases.
//!
//! Each test documents a specific behavior that is easy to break while
//! touching the binder or the tokenizer, ensuring it is never accidentally
//! reverted.

use simdmap::{bind, parse_instruction, Mapper, Outcome, Registry, Signature, SkipReason, NO_MAPPING};

fn registry(rules: &[(&str, Signature)]) -> Registry {
    let mut b = Registry::builder();
    for (mnemonic, sig) in rules {
        b.rule(mnemonic, sig.clone());
    }
    b.build()
}

/// Regression: a trailing comma glued to a register must not become part of
/// the register name, or the width-class check sees `X2,` and the note
/// renders `X2, is of type`.
#[test]
fn trailing_comma_is_not_part_of_register() {
    let reg = registry(&[(
        "VPADDD",
        Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX"),
    )]);
    let out = Mapper::new(&reg).map("VPADDD X1,X9,X2,");
    assert!(out.contains("X2 = X9.Add(X1) // X9 is of type Int32x4, X1 is of type Int32x4, X2 is of type Int32x4"));
}

/// Regression: the mask upgrade must keep AVX-512 sub-features such as
/// `AVX512VPOPCNTDQ` rather than collapsing them to `AVX512`.
#[test]
fn mask_upgrade_keeps_avx512_subfeature() {
    let reg = registry(&[(
        "VPOPCNTD",
        Signature::new("OnesCount", "op1", &["Uint32x16", "Uint32x16"], "AVX512VPOPCNTDQ"),
    )]);
    let out = Mapper::new(&reg).map("VPOPCNTD Z1, K2, Z3");
    assert!(out.starts_with("if archsimd.X86.AVX512VPOPCNTDQ() {\n\tZ3 = Z1.OnesCount().Masked(K2)"));
}

/// Regression: a mask-typed destination or argument has no width class, so
/// an `X`/`Y`/`Z` register must not bind to it; only `K` registers do.
#[test]
fn vector_register_never_binds_mask_type() {
    let reg = registry(&[(
        "VPCMPEQD",
        Signature::new("Equal", "op2", &["Int32x16", "Int32x16", "Mask32x16"], "AVX512"),
    )]);
    let mapper = Mapper::new(&reg);
    assert_eq!(mapper.map("VPCMPEQD Z1, Z2, Z3"), NO_MAPPING);
    assert_eq!(mapper.map("VPCMPEQD Z1, Z2, X3"), NO_MAPPING);
    assert!(mapper.map("VPCMPEQD Z1, Z2, K3").contains("K3 = Z2.Equal(Z1)"));
}

/// Regression: a type name outside the vector and scalar model is registry
/// data, not a defect; it binds as a dereferenced scalar.
#[test]
fn opaque_argument_type_still_binds() {
    let sig = Signature::new("SetElem", "op2Imm8", &["Int64x2", "uint8", "int", "Int64x2"], "AVX");
    let insn = parse_instruction("VPINSRQ $1, (AX), X1, X2").unwrap();
    let Outcome::Bound(b) = bind(&insn, &sig) else {
        panic!("expected binding");
    };
    assert_eq!(b.dest, "X2");
    let reg = registry(&[("VPINSRQ", sig)]);
    let out = Mapper::new(&reg).map("VPINSRQ $1, (AX), X1, X2");
    assert!(out.contains("X2 = X1.SetElem(1, *AX)"), "{out}");
}

/// Regression: a captured mask must not make an ungated rule render.
#[test]
fn masked_rule_without_feature_stays_silent() {
    let reg = registry(&[(
        "VPADDD",
        Signature::new("Add", "op2", &["Int32x16", "Int32x16", "Int32x16"], ""),
    )]);
    assert_eq!(Mapper::new(&reg).map("VPADDD Z1, Z2, K1, Z3"), NO_MAPPING);
}

/// Regression: a negative immediate never satisfies a constant gate, even
/// when its two's-complement bit pattern would.
#[test]
fn negative_immediate_fails_const_gate() {
    let sig = Signature::new("GetHi", "op1", &["Float32x8", "Float32x4"], "AVX")
        .with_const_imm(u64::MAX);
    let insn = parse_instruction("VEXTRACTF128 $-1, Y0, X1").unwrap();
    assert_eq!(
        bind(&insn, &sig),
        Outcome::Inapplicable(SkipReason::ConstImmMismatch { expected: u64::MAX })
    );
}

/// Regression: a register of the wrong width must not be rendered as a
/// dereference; it falls to the load path, which only accepts memory.
#[test]
fn mismatched_register_is_never_dereferenced() {
    let reg = registry(&[(
        "VPADDD",
        Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX"),
    )]);
    let out = Mapper::new(&reg).map("VPADDD Z1, X9, X2");
    assert_eq!(out, NO_MAPPING);
    assert!(!out.contains("*Z1"));
}

/// Regression: an extra operand must exclude a rule instead of being
/// silently ignored.
#[test]
fn surplus_operand_excludes_rule() {
    let reg = registry(&[(
        "VPADDD",
        Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX"),
    )]);
    assert_eq!(Mapper::new(&reg).map("VPADDD X1, X9, X2, X3"), NO_MAPPING);
}

/// Regression: a missing operand must exclude a rule instead of panicking
/// on an out-of-range operand index.
#[test]
fn missing_operand_excludes_rule() {
    let reg = registry(&[(
        "VPERM2F128",
        Signature::new(
            "Select128FromPair",
            "op2Imm8_II",
            &["Float32x8", "uint8", "uint8", "Float32x8", "Float32x8"],
            "AVX",
        ),
    )]);
    let mapper = Mapper::new(&reg);
    for text in ["VPERM2F128", "VPERM2F128 $1", "VPERM2F128 $1, Y1", "VPERM2F128 $1, Y1, Y2"] {
        assert_eq!(mapper.map(text), NO_MAPPING, "{text}");
    }
}

/// Regression: a defective rule must not hide the valid rules after it.
#[test]
fn defective_rule_does_not_stop_aggregation() {
    let reg = registry(&[
        ("VPADDD", Signature::new("Add", "opX", &["Int32x4"], "AVX")),
        (
            "VPADDD",
            Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX"),
        ),
    ]);
    let out = Mapper::new(&reg).map("VPADDD X1, X9, X2");
    assert!(out.starts_with("if archsimd.X86.AVX() {"));
}

/// Regression: symbolic immediates bind to `uint8` slots verbatim.
#[test]
fn symbolic_immediate_binds() {
    let reg = registry(&[(
        "VPROLD",
        Signature::new("RotateAllLeft", "op1Imm8", &["Int32x4", "uint8", "Int32x4"], "AVX512"),
    )]);
    let out = Mapper::new(&reg).map("VPROLD $ROT, X1, X2");
    assert!(out.contains("X2 = X1.RotateAllLeft(ROT)"));
}

/// Regression: any Unicode whitespace separates operands, not only ASCII
/// space and tab, or the whole line is read as one mnemonic.
#[test]
fn unicode_whitespace_separates_operands() {
    let reg = registry(&[(
        "VPADDD",
        Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX"),
    )]);
    let mapper = Mapper::new(&reg);
    let expected = mapper.map("VPADDD X1, X9, X2");
    assert!(expected.starts_with("if archsimd.X86.AVX() {"));
    assert_eq!(mapper.map("VPADDD\x0bX1, X9, X2"), expected);
    assert_eq!(mapper.map("VPADDD\u{a0}X1,\u{a0}X9,\u{a0}X2"), expected);
}
