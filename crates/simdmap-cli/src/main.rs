//! `simdmap` command-line front end.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use simdmap::{
    Mapper, MapperOptions, Outcome, Registry, DEFAULT_MAX_INPUT_BYTES, DEFAULT_PACKAGE,
    ILLEGAL_INPUT, NO_MAPPING,
};

const LONG_ABOUT: &str = "Map a Go amd64 vector assembly instruction to archsimd intrinsics.

Instruction words given as arguments are joined with spaces and mapped as one line.
Quote immediates so the shell does not expand them: simdmap 'VEXTRACTF128 $1, Y0, X1'.
With no words, each non-blank line of stdin is mapped and results are separated by a blank line.";

#[derive(Parser, Debug)]
#[command(
    name = "simdmap",
    version,
    about = "Map Go amd64 vector assembly to archsimd intrinsics",
    long_about = LONG_ABOUT
)]
struct Cli {
    #[arg(
        value_name = "INSTRUCTION",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        long_help = "Instruction words, joined with spaces. Reads stdin when omitted."
    )]
    words: Vec<String>,
    #[arg(
        long = "registry",
        value_name = "FILE",
        long_help = "Load rules from a TOML dataset instead of the bundled one."
    )]
    registry: Option<PathBuf>,
    #[arg(
        long = "check",
        action = ArgAction::SetTrue,
        long_help = "Validate the registry, print defective rules and warnings, exit non-zero on any defect."
    )]
    check: bool,
    #[arg(
        long = "explain",
        action = ArgAction::SetTrue,
        long_help = "Print the outcome of every candidate rule instead of the plain result."
    )]
    explain: bool,
    #[arg(
        long = "package",
        value_name = "NAME",
        default_value = DEFAULT_PACKAGE,
        long_help = "Package prefix of the rendered API."
    )]
    package: String,
    #[arg(
        long = "max-input",
        value_name = "BYTES",
        default_value_t = DEFAULT_MAX_INPUT_BYTES,
        long_help = "Reject instruction lines longer than BYTES as illegal input."
    )]
    max_input: usize,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        long_help = "Raise log verbosity (-v debug, -vv trace). RUST_LOG overrides."
    )]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let loaded;
    let registry = match &cli.registry {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read registry {}", path.display()))?;
            loaded = Registry::from_toml_str(&text)
                .with_context(|| format!("failed to load registry {}", path.display()))?;
            &loaded
        }
        None => Registry::builtin(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.check {
        let clean = check(registry, &mut out)?;
        return Ok(if clean {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let mapper = Mapper::with_options(
        registry,
        MapperOptions {
            package: cli.package.clone(),
            max_input_bytes: cli.max_input,
        },
    );

    if !cli.words.is_empty() {
        respond(&mapper, &cli.words.join(" "), cli.explain, &mut out)?;
        return Ok(ExitCode::SUCCESS);
    }

    let stdin = io::stdin();
    let mut first = true;
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        if !first {
            writeln!(out)?;
        }
        first = false;
        respond(&mapper, &line, cli.explain, &mut out)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Print every defective rule, every warning and a summary; returns whether
/// the registry is free of defects.
fn check(registry: &Registry, out: &mut impl Write) -> Result<bool> {
    let defects = registry.validate();
    for defect in &defects {
        writeln!(out, "{defect}")?;
    }
    for warning in registry.warnings() {
        writeln!(out, "warning: {warning}")?;
    }
    writeln!(
        out,
        "{} rules for {} mnemonics, {} defective",
        registry.rule_count(),
        registry.len(),
        defects.len()
    )?;
    Ok(defects.is_empty())
}

fn respond(mapper: &Mapper<'_>, line: &str, explain: bool, out: &mut impl Write) -> Result<()> {
    if !explain {
        writeln!(out, "{}", mapper.map(line))?;
        return Ok(());
    }

    let reports = match mapper.explain(line) {
        Ok(reports) => reports,
        Err(err) => {
            writeln!(out, "{ILLEGAL_INPUT}: {err}")?;
            return Ok(());
        }
    };
    if reports.is_empty() {
        writeln!(out, "{NO_MAPPING}")?;
    }
    for (index, report) in reports.iter().enumerate() {
        let status = match &report.outcome {
            Outcome::Bound(_) if report.rendering.is_some() => "bound".to_string(),
            Outcome::Bound(_) => "bound, no feature gate".to_string(),
            Outcome::Inapplicable(reason) => format!("skipped: {reason}"),
            Outcome::Malformed(reason) => format!("malformed: {reason}"),
        };
        writeln!(out, "[{index}] {}: {status}", report.signature)?;
        if let Some(code) = &report.rendering {
            for code_line in code.lines() {
                writeln!(out, "    {code_line}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use simdmap::Signature;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn words_keep_hyphens() {
        let cli = Cli::try_parse_from(["simdmap", "VPADDD", "-8(BX),", "X9,", "X2"]).unwrap();
        assert_eq!(cli.words.join(" "), "VPADDD -8(BX), X9, X2");
        assert_eq!(cli.package, "archsimd");
        assert_eq!(cli.max_input, 4096);
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["simdmap", "-vv", "--check"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.check);
        assert!(cli.words.is_empty());
    }

    fn registry() -> Registry {
        let mut b = Registry::builder();
        b.rule(
            "VPADDD",
            Signature::new("Add", "op2", &["Int32x4", "Int32x4", "Int32x4"], "AVX"),
        )
        .rule(
            "VPADDD",
            Signature::new("Add", "op2", &["Int32x8", "Int32x8", "Int32x8"], "AVX2"),
        );
        b.build()
    }

    #[test]
    fn explain_output() {
        let reg = registry();
        let mapper = Mapper::new(&reg);
        let mut out = Vec::new();
        respond(&mapper, "VPADDD X1, X9, X2", true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[0] Add(Int32x4, Int32x4) -> Int32x4 [op2] AVX: bound");
        assert_eq!(lines[1], "    if archsimd.X86.AVX() {");
        assert!(lines[4].starts_with("[1] Add(Int32x8, Int32x8) -> Int32x8 [op2] AVX2: skipped: "));
    }

    #[test]
    fn explain_illegal_input() {
        let reg = registry();
        let mut out = Vec::new();
        respond(&Mapper::new(&reg), "VPADDD (BX", true, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("Illegal input: "));
    }

    #[test]
    fn check_reports_defects() {
        let mut b = Registry::builder();
        b.rule("VPADDD", Signature::new("Add", "op2", &["Int32x4"], "AVX"));
        let mut out = Vec::new();
        assert!(!check(&b.build(), &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("VPADDD[0]: expected 3 argument types, found 1"));
        assert!(text.ends_with("1 rules for 1 mnemonics, 1 defective\n"));
    }

    #[test]
    fn check_warnings_do_not_fail() {
        let mut b = Registry::builder();
        b.rule(
            "VPINSRQ",
            Signature::new("SetElem", "op2Imm8", &["Int64x2", "uint8", "int", "Int64x2"], "AVX"),
        );
        let mut out = Vec::new();
        assert!(check(&b.build(), &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("warning: VPINSRQ[0]: unknown argument type 'int'\n"));
        assert!(text.ends_with("1 rules for 1 mnemonics, 0 defective\n"));
    }
}
