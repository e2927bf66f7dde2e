//! Purpose: Hold top-level CLI command dispatch for `autojson`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Each arm maps flags onto option structs and calls exactly one façade operation.
//! Invariants: Output envelopes and exit codes are produced by helpers in `main.rs`.

use super::*;

pub(super) fn dispatch_command(command: Command, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "autojson", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Read { path } => {
            let document = autojson::read(&path)?;
            emit_json(&document)?;
            Ok(RunOutcome::ok())
        }
        Command::Write {
            path,
            data,
            file,
            format,
            no_create_dirs,
        } => {
            let Some(document) = read_input(data, file)? else {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("write requires a JSON value")
                    .with_hint("Provide JSON via DATA, --file, or pipe JSON to stdin."));
            };
            let options = format.write_options().with_create_dirs(!no_create_dirs);
            autojson::write(&path, &document, &options)?;
            emit_json(&json!({ "written": display_path(&path) }))?;
            Ok(RunOutcome::ok())
        }
        Command::Create {
            path,
            data,
            overwrite,
            format,
        } => {
            let document = read_input(data, None)?;
            autojson::create(&path, document.as_ref(), &format.create_options(overwrite))?;
            emit_json(&json!({ "created": display_path(&path) }))?;
            Ok(RunOutcome::ok())
        }
        Command::Update {
            path,
            updates,
            create,
            format,
        } => {
            let updates = parse_inline_json(&updates, "UPDATES")?;
            let merged = autojson::update(&path, &updates, &format.update_options(create))?;
            emit_json(&merged)?;
            Ok(RunOutcome::ok())
        }
        Command::Delete { paths, if_exists } => {
            let mut deleted = Vec::new();
            for path in &paths {
                let removed = if if_exists {
                    autojson::delete_if_exists(path)?
                } else {
                    autojson::delete(path)?;
                    true
                };
                deleted.push(json!({ "path": display_path(path), "removed": removed }));
            }
            emit_json(&json!({ "deleted": deleted }))?;
            Ok(RunOutcome::ok())
        }
        Command::Exists { path } => {
            let found = autojson::exists(&path);
            emit_json(&Value::Bool(found))?;
            Ok(RunOutcome::with_code(if found { 0 } else { 1 }))
        }
        Command::Auto {
            dir,
            no_recursive,
            create,
            errors,
            key,
        } => {
            let options = auto_options(no_recursive, create, errors, key);
            let collection = autojson::auto(&dir, &options)?;
            emit_skipped(&collection, color_mode);
            emit_json(&collection_json(collection))?;
            Ok(RunOutcome::ok())
        }
    }
}
