//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `extensible_core` wiring.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `extensible_cli [printer-name] [option=value ...]`

use extensible_core::{
    global, ExtensionError, Extensible, Extension, Implementation, OptionResult, OptionSpec,
    OptionValue, OptionValues, RawOptions,
};
use std::process::ExitCode;

trait Printer {
    fn print(&self, text: &str) -> String;
}

impl Extensible for dyn Printer {
    const EXTENSION_TYPE: &'static str = "printer";
}

struct PlainPrinter;

impl Printer for PlainPrinter {
    fn print(&self, text: &str) -> String {
        text.to_string()
    }
}

struct PrettyPrinter {
    indent: usize,
    bullet: String,
}

impl Printer for PrettyPrinter {
    fn print(&self, text: &str) -> String {
        format!("{}{} {text}", " ".repeat(self.indent), self.bullet)
    }
}

impl Extension for PrettyPrinter {
    type Point = dyn Printer;
    const EXTENSION_NAME: &'static str = "pretty";

    fn options() -> Vec<OptionSpec> {
        vec![
            OptionSpec::int("indent").with_default(4),
            OptionSpec::string("bullet").with_default("-"),
        ]
    }

    fn description() -> Option<&'static str> {
        Some("Indented, bulleted output.")
    }

    fn from_options(options: &OptionValues) -> OptionResult<Box<dyn Printer>> {
        Ok(Box::new(PrettyPrinter {
            indent: options.int("indent")?.clamp(0, 80) as usize,
            bullet: options.string("bullet")?,
        }))
    }
}

fn register_builtin_printers() -> Result<(), ExtensionError> {
    global::register(
        <dyn Printer as Extensible>::EXTENSION_TYPE,
        Implementation::<dyn Printer>::new("plain", |_| {
            Ok(Box::new(PlainPrinter) as Box<dyn Printer>)
        })
        .with_description("Text as-is."),
    )?;
    global::register_extension::<PrettyPrinter>()
}

fn parse_raw_options(args: &[String]) -> Result<RawOptions, String> {
    let mut raw = RawOptions::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("expected option=value, got `{arg}`"))?;
        raw.insert(key.to_string(), OptionValue::from(value));
    }
    Ok(raw)
}

fn run(args: &[String]) -> Result<(), String> {
    register_builtin_printers().map_err(|err| err.to_string())?;

    println!(
        "extensible_core version={}",
        extensible_core::core_version()
    );
    for extension_type in global::extension_types() {
        let names = global::list_names(&extension_type).map_err(|err| err.to_string())?;
        println!("extension_type={extension_type} names={}", names.join(","));
    }

    let name = args.first().map(String::as_str).unwrap_or("pretty");
    let raw = parse_raw_options(args.get(1..).unwrap_or_default())?;
    let printer =
        global::create_extension::<dyn Printer>(name, &raw).map_err(|err| err.to_string())?;
    println!("{}", printer.print("hello"));
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
