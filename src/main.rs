//! Purpose: `autojson` CLI entry point.
//! Role: Binary crate root; parses args, runs one façade operation, emits JSON on stdout.
//! Invariants: Successful commands print exactly one JSON value on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `autojson::to_exit_code`.
//! Invariants: All file access goes through the library façade.
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use autojson::notice::{Notice, notice_json, skipped_file_notice};
use autojson::{
    AutoOptions, Collection, CreateOptions, Encoding, Error, ErrorKind, ErrorPolicy, KeyStyle,
    UpdateOptions, WriteOptions, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `autojson --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command, color_mode)
        .map_err(add_file_hint)
        .map_err(|err| (err, color_mode))
}

// Quiet by default: skipped files surface as notices, RUST_LOG opts into traces.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "autojson",
    version,
    about = "Read, write, update, and bulk-load JSON files",
    long_about = None,
    after_help = r#"EXAMPLES
  $ autojson create conf/app.json '{"port": 8080}'
  $ autojson update conf/app.json '{"debug": true}'
  $ autojson read conf/app.json
  $ autojson auto conf --key stem
  $ autojson exists conf/app.json && echo ok

NOTES
  - Writes replace the whole file via temp file + rename
  - No locking: concurrent writers to one path race, last writer wins
  - Set RUST_LOG=debug for per-operation traces on stderr"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum ErrorPolicyCli {
    Stop,
    Skip,
}

impl From<ErrorPolicyCli> for ErrorPolicy {
    fn from(value: ErrorPolicyCli) -> Self {
        match value {
            ErrorPolicyCli::Stop => ErrorPolicy::Stop,
            ErrorPolicyCli::Skip => ErrorPolicy::Skip,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum KeyStyleCli {
    Path,
    Stem,
}

impl From<KeyStyleCli> for KeyStyle {
    fn from(value: KeyStyleCli) -> Self {
        match value {
            KeyStyleCli::Path => KeyStyle::RelativePath,
            KeyStyleCli::Stem => KeyStyle::Stem,
        }
    }
}

#[derive(clap::Args, Clone, Copy, Debug)]
struct FormatArgs {
    #[arg(long, default_value_t = 4, help = "Spaces per indent level (0 = compact)")]
    indent: usize,
    #[arg(long = "ensure-ascii", help = "Escape non-ASCII characters as \\uXXXX")]
    ensure_ascii: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(arg_required_else_help = true, about = "Print a JSON file")]
    Read {
        #[arg(help = "JSON file path", value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },
    #[command(
        arg_required_else_help = true,
        about = "Write a JSON value to a file, replacing it",
        after_help = r#"EXAMPLES
  $ autojson write out.json '{"hello": "world"}'
  $ autojson write out.json -f input.json --indent 2
  $ curl -s https://example.com/data | autojson write out.json"#
    )]
    Write {
        #[arg(help = "JSON file path", value_hint = ValueHint::FilePath)]
        path: PathBuf,
        #[arg(help = "Inline JSON value")]
        data: Option<String>,
        #[arg(
            short = 'f',
            long = "file",
            help = "Read the value from a file (use - for stdin)",
            conflicts_with = "data",
            value_hint = ValueHint::FilePath
        )]
        file: Option<String>,
        #[command(flatten)]
        format: FormatArgs,
        #[arg(long = "no-create-dirs", help = "Fail instead of creating missing parent directories")]
        no_create_dirs: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Create a JSON file (fails if it exists unless --overwrite)"
    )]
    Create {
        #[arg(help = "JSON file path", value_hint = ValueHint::FilePath)]
        path: PathBuf,
        #[arg(help = "Initial JSON value (default: {})")]
        data: Option<String>,
        #[arg(long, help = "Replace an existing file")]
        overwrite: bool,
        #[command(flatten)]
        format: FormatArgs,
    },
    #[command(
        arg_required_else_help = true,
        about = "Shallow-merge a JSON object into a file and print the result"
    )]
    Update {
        #[arg(help = "JSON file path", value_hint = ValueHint::FilePath)]
        path: PathBuf,
        #[arg(help = "JSON object whose top-level keys replace the file's keys")]
        updates: String,
        #[arg(long, help = "Start from {} when the file is missing")]
        create: bool,
        #[command(flatten)]
        format: FormatArgs,
    },
    #[command(arg_required_else_help = true, about = "Delete JSON files")]
    Delete {
        #[arg(required = true, help = "JSON file paths", value_hint = ValueHint::FilePath)]
        paths: Vec<PathBuf>,
        #[arg(long = "if-exists", help = "Ignore files that are already gone")]
        if_exists: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Check that a path is a file holding valid JSON (exit 0 or 1)"
    )]
    Exists {
        #[arg(help = "JSON file path", value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },
    #[command(
        about = "Load every .json file under a directory",
        after_help = r#"EXAMPLES
  $ autojson auto                       # current directory, recursive
  $ autojson auto conf --no-recursive
  $ autojson auto conf --errors skip    # report bad files as notices, keep going
  $ autojson auto conf --key stem       # key by file name without .json"#
    )]
    Auto {
        #[arg(default_value = ".", help = "Directory to scan", value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        #[arg(long = "no-recursive", help = "Only load direct children")]
        no_recursive: bool,
        #[arg(long, help = "Create the directory when it is missing")]
        create: bool,
        #[arg(
            short = 'e',
            long = "errors",
            default_value = "stop",
            value_enum,
            help = "Bad file policy: stop|skip"
        )]
        errors: ErrorPolicyCli,
        #[arg(long, default_value = "path", value_enum, help = "Key style: path|stem")]
        key: KeyStyleCli,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl FormatArgs {
    fn write_options(self) -> WriteOptions {
        WriteOptions::new()
            .with_indent(Some(self.indent))
            .with_ensure_ascii(self.ensure_ascii)
    }

    fn create_options(self, overwrite: bool) -> CreateOptions {
        CreateOptions::new()
            .with_overwrite(overwrite)
            .with_indent(Some(self.indent))
            .with_ensure_ascii(self.ensure_ascii)
    }

    fn update_options(self, create: bool) -> UpdateOptions {
        UpdateOptions::new()
            .with_create_if_not_exists(create)
            .with_indent(Some(self.indent))
            .with_ensure_ascii(self.ensure_ascii)
    }
}

fn auto_options(
    no_recursive: bool,
    create: bool,
    errors: ErrorPolicyCli,
    key: KeyStyleCli,
) -> AutoOptions {
    AutoOptions::new()
        .with_recursive(!no_recursive)
        .with_create_if_not_exists(create)
        .with_error_policy(errors.into())
        .with_key_style(key.into())
}

fn parse_inline_json(text: &str, label: &str) -> Result<Value, Error> {
    serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("{label} is not valid JSON: {err}"))
            .with_hint("Provide a single JSON value (e.g. '{\"x\":1}').")
    })
}

/// Resolves the input value from DATA, `--file`, or piped stdin, in that order.
/// Returns `None` when nothing was supplied.
fn read_input(data: Option<String>, file: Option<String>) -> Result<Option<Value>, Error> {
    if let Some(data) = data {
        return parse_inline_json(&data, "DATA").map(Some);
    }
    let text = match file.as_deref() {
        Some("-") => read_stdin()?,
        Some(path) => std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read input file")
                .with_path(path)
                .with_source(err)
        })?,
        None if io::stdin().is_terminal() => return Ok(None),
        None => read_stdin()?,
    };
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_inline_json(&text, "input").map(Some)
}

fn read_stdin() -> Result<String, Error> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read stdin")
            .with_source(err)
    })?;
    Ok(text)
}

fn emit_json(value: &Value) -> Result<(), Error> {
    let encoding = if io::stdout().is_terminal() {
        Encoding {
            indent: Some(2),
            ensure_ascii: false,
        }
    } else {
        Encoding::compact()
    };
    write_json_line(&mut io::stdout().lock(), value, &encoding)
}

fn write_json_line<W: Write>(out: &mut W, value: &Value, encoding: &Encoding) -> Result<(), Error> {
    let mut bytes = autojson::api::to_vec(value, encoding)?;
    bytes.push(b'\n');
    out.write_all(&bytes)
        .and_then(|()| out.flush())
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write output")
                .with_source(err)
        })
}

fn collection_json(collection: Collection) -> Value {
    let mut map = Map::new();
    for (key, document) in collection {
        map.insert(key, document);
    }
    Value::Object(map)
}

fn emit_skipped(collection: &Collection, color_mode: ColorMode) {
    for skipped in collection.skipped() {
        let notice = skipped_file_notice(skipped, "auto", notice_time_now().unwrap_or_default());
        emit_notice(&notice, color_mode);
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    time::OffsetDateTime::now_utc().format(&Rfc3339).ok()
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {} (path: {})", notice.message, notice.path);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::NotAFile => "not a regular file".to_string(),
        ErrorKind::StorageFull => "no space left on device".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Parse => "invalid JSON".to_string(),
        ErrorKind::Serialize => "value is not JSON-serializable".to_string(),
        ErrorKind::Type => "unexpected JSON type".to_string(),
        ErrorKind::DuplicateKey => "duplicate document key".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("class".to_string(), json!(format!("{:?}", err.class())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(display_path(path)));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    if let Some(column) = err.column() {
        inner.insert("column".to_string(), json!(column));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            display_path(path)
        ));
    }
    if let (Some(line), Some(column)) = (err.line(), err.column()) {
        lines.push(format!(
            "{} line {line}, column {column}",
            colorize_label("at:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn add_file_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Permission => {
            err.with_hint("Permission denied. Check file and directory permissions.")
        }
        ErrorKind::StorageFull => err.with_hint("Disk is full. Free space and retry."),
        ErrorKind::NotAFile => err.with_hint("Point at a regular .json file, not a directory."),
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        _ => err,
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

#[cfg(test)]
mod tests {
    use super::{Cli, add_file_hint, error_json, error_text, write_json_line};
    use autojson::{Encoding, Error, ErrorKind};
    use clap::CommandFactory;
    use serde_json::json;
    use std::io;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn error_json_carries_kind_class_and_position() {
        let err = Error::new(ErrorKind::Parse)
            .with_message("invalid JSON")
            .with_path("bad.json")
            .with_position(2, 5);
        let value = error_json(&err);
        let inner = &value["error"];
        assert_eq!(inner["kind"], "Parse");
        assert_eq!(inner["class"], "Validation");
        assert_eq!(inner["path"], "bad.json");
        assert_eq!(inner["line"], 2);
        assert_eq!(inner["column"], 5);
    }

    #[test]
    fn error_text_without_color_has_no_escapes() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("file not found")
            .with_path("x.json");
        let text = error_text(&err, false);
        assert!(text.starts_with("error: file not found"));
        assert!(text.contains("path: x.json"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn file_hint_does_not_replace_existing_hint() {
        let err = add_file_hint(Error::new(ErrorKind::Io).with_hint("custom"));
        assert_eq!(err.hint(), Some("custom"));
        let err = add_file_hint(Error::new(ErrorKind::Permission));
        assert!(err.hint().unwrap().contains("permissions"));
    }

    struct ClosedPipe;

    impl io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn closed_stdout_is_an_io_error() {
        let err = write_json_line(&mut ClosedPipe, &json!({"a": 1}), &Encoding::compact())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(autojson::to_exit_code(err.kind()), 8);
    }

    #[test]
    fn json_line_ends_with_newline() {
        let mut out = Vec::new();
        write_json_line(&mut out, &json!([1, "x"]), &Encoding::compact()).expect("write");
        assert_eq!(out, b"[1,\"x\"]\n");
    }
}
