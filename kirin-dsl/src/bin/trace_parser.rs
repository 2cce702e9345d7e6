/// Kirin DSL Tracer - Shows the flow through Lexer → Parser → Validator → Writer
///
/// Usage: cargo run --bin trace_parser <dsl-file> [constraints-file]
///
/// Set KIRIN_CONFIG to a TOML file to override the engine configuration and
/// RUST_LOG to see the engine's own tracing output.

use kirin_dsl::kirin_core::{ConstraintSource, KirinConfig, KirinError, KirinResult};
use kirin_dsl::{
    constraints_to_json, extract_constraints_with, generate_fix_message, merge_constraints_with,
    parse, render, suggest_fix, ConstraintValidator, Lexer, Validator,
};
use std::fs;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kirin_dsl=info,warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin trace_parser <dsl-file> [constraints-file]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin trace_parser queries/instanceof.kirin");
        std::process::exit(1);
    }

    match run(&args[1], args.get(2).map(String::as_str)) {
        Ok(()) => println!("✅ Trace complete!"),
        Err(KirinError::Parse(errors)) => {
            eprintln!("❌ Parse failed:");
            for error in errors.iter() {
                eprintln!("  {}", error);
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config() -> KirinResult<KirinConfig> {
    match std::env::var("KIRIN_CONFIG") {
        Ok(path) => Ok(KirinConfig::from_file(&path)?),
        Err(_) => Ok(KirinConfig::default()),
    }
}

fn run(dsl_path: &str, constraints_path: Option<&str>) -> KirinResult<()> {
    let config = load_config()?;
    let source = fs::read_to_string(dsl_path).map_err(|e| KirinError::io(dsl_path, e))?;

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ KIRIN DSL TRACER");
    println!("╚═══════════════════════════════════════════════════════════════\n");

    println!("📝 INPUT DSL:");
    println!("{}", source.trim_end());
    println!();

    println!("🔤 TOKENS:");
    println!("─────────────────────────────────────────────────────────────");
    for token in Lexer::new(&source).tokenize() {
        println!("  {:>4}:{:<4} {:?}", token.span.line, token.span.column, token.kind);
    }
    println!();

    let parsed = parse(&source)?;

    println!("🌳 AST:");
    println!("─────────────────────────────────────────────────────────────");
    match serde_json::to_string_pretty(&parsed.query) {
        Ok(json) => println!("{}", json),
        Err(_) => println!("{:#?}", parsed.query),
    }
    println!();

    println!("🔎 VALIDATION:");
    println!("─────────────────────────────────────────────────────────────");
    let result = Validator::with_config(&config).validate(&parsed.query);
    if result.is_valid {
        println!("✅ valid");
    } else {
        print!("{}", generate_fix_message(&result.errors));
        for error in &result.errors {
            if let Some(fix) = suggest_fix(error, &parsed.query) {
                println!("🔧 {} → {}", error.error_type.as_str(), fix);
            }
        }
    }
    for warning in &result.warnings {
        println!("⚠️  {}", warning);
    }
    println!();

    println!("🔄 CANONICAL DSL:");
    println!("─────────────────────────────────────────────────────────────");
    let canonical = render(&parsed.query, false);
    println!("{}", canonical);
    println!();

    if let Some(constraints_path) = constraints_path {
        let text = fs::read_to_string(constraints_path)
            .map_err(|e| KirinError::io(constraints_path, e))?;

        println!("📋 CONSTRAINTS:");
        println!("─────────────────────────────────────────────────────────────");
        let constraints = extract_constraints_with(&text, ConstraintSource::Unknown, &config);
        match constraints_to_json(&constraints) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("❌ Failed to serialize constraints: {}", e),
        }
        println!();

        let report = ConstraintValidator::with_config(&config).validate_all(&constraints, &source);
        for rejected in &report.rejected {
            println!("❌ {}", rejected.message);
            if let Some(fix) = &rejected.fix {
                println!("   Fix: {}", fix);
            }
        }
        let accepted = report.retain_valid(&constraints);

        println!("🧩 MERGED DSL ({} of {} constraints):", accepted.len(), constraints.len());
        println!("─────────────────────────────────────────────────────────────");
        println!("{}", merge_constraints_with(&source, &accepted, &config));
        println!();
    }

    Ok(())
}
