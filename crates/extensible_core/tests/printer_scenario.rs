use extensible_core::{
    global, ExtensionError, Extensible, Extension, OptionError, OptionResult, OptionSpec,
    OptionType, OptionValue, OptionValues, RawOptions,
};
use std::fmt::Debug;
use std::sync::Once;

trait Printer: Debug {
    fn indent(&self) -> i64;
}

impl Extensible for dyn Printer {
    const EXTENSION_TYPE: &'static str = "printer";
}

#[derive(Debug)]
struct PrettyPrinter {
    indent: i64,
}

impl Printer for PrettyPrinter {
    fn indent(&self) -> i64 {
        self.indent
    }
}

impl Extension for PrettyPrinter {
    type Point = dyn Printer;
    const EXTENSION_NAME: &'static str = "pretty";

    fn options() -> Vec<OptionSpec> {
        vec![OptionSpec::int("indent").with_default(4)]
    }

    fn from_options(options: &OptionValues) -> OptionResult<Box<dyn Printer>> {
        Ok(Box::new(PrettyPrinter {
            indent: options.int("indent")?,
        }))
    }
}

static REGISTER: Once = Once::new();

fn register_printers() {
    REGISTER.call_once(|| {
        global::register_extension::<PrettyPrinter>().expect("pretty printer registration");
    });
}

fn raw(pairs: &[(&str, OptionValue)]) -> RawOptions {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[test]
fn pretty_printer_uses_default_indent() {
    register_printers();
    let printer = global::create::<dyn Printer>("printer", "pretty", &RawOptions::new())
        .expect("default options should build");
    assert_eq!(printer.indent(), 4);
}

#[test]
fn pretty_printer_coerces_textual_indent() {
    register_printers();
    let options = raw(&[("indent", "10".into())]);
    let printer = global::create::<dyn Printer>("printer", "pretty", &options)
        .expect("textual indent should build");
    assert_eq!(printer.indent(), 10);

    let options = raw(&[("indent", OptionValue::Int(8))]);
    let printer = global::create_extension::<dyn Printer>("pretty", &options)
        .expect("typed indent should build");
    assert_eq!(printer.indent(), 8);
}

#[test]
fn pretty_printer_rejects_non_numeric_indent() {
    register_printers();
    let options = raw(&[("indent", "abc".into())]);
    let err = global::create::<dyn Printer>("printer", "pretty", &options)
        .expect_err("non-numeric indent must fail");
    assert_eq!(
        err,
        ExtensionError::InvalidOptions(OptionError::TypeCoercion {
            option: "indent".to_string(),
            expected: OptionType::Int,
            value: OptionValue::from("abc"),
        })
    );
}

#[test]
fn missing_printer_lists_available_names() {
    register_printers();
    let err = global::create::<dyn Printer>("printer", "missing", &RawOptions::new())
        .expect_err("unknown printer must fail");
    match err {
        ExtensionError::UnknownExtension { available, .. } => {
            assert_eq!(available, vec!["pretty".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unregistered_type_is_unknown() {
    register_printers();
    let err = global::lookup::<dyn Printer>("unregistered_type", "x")
        .expect_err("unknown type must fail");
    assert_eq!(
        err,
        ExtensionError::UnknownExtensionType("unregistered_type".to_string())
    );
}

#[test]
fn registering_pretty_twice_fails() {
    register_printers();
    let err = global::register_extension::<PrettyPrinter>()
        .expect_err("duplicate registration must fail");
    assert!(matches!(err, ExtensionError::DuplicateExtension { .. }));
    assert_eq!(
        global::list_names("printer").unwrap(),
        vec!["pretty".to_string()]
    );
}

#[test]
fn catalog_enumerates_printer_type() {
    register_printers();
    assert!(global::extension_types().contains(&"printer".to_string()));
    let description = global::describe("printer", "pretty").expect("describe");
    assert_eq!(description.options[0].default, Some(OptionValue::Int(4)));
}
