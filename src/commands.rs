use crate::{OutputMode, emit_success};
use anyhow::{anyhow, bail};
use std::path::Path;
use std::process::Command;
use watchgit::ui::{self, Icons};
use watchgit::{Entry, Registry, SCHEMA_VERSION};

/// Stored path for `alias`, or `None` when the alias is not tracked.
fn lookup(registry: &Registry, alias: &str) -> watchgit::Result<Option<String>> {
    let mut found = None;
    registry.for_alias(alias, |_, value| {
        found = Some(value.to_string());
        Ok(())
    })?;
    Ok(found)
}

pub fn run_add(
    registry: &Registry,
    alias: &str,
    path: &Path,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    registry.insert(alias, path)?;
    let stored = lookup(registry, alias)?
        .ok_or_else(|| anyhow!("'{}' vanished right after it was added", alias))?;

    if output_mode.is_human() {
        println!("{} {} -> {}", Icons::LINK, ui::alias(alias), ui::path(&stored));
        ui::success("Now watching");
    } else {
        let data = serde_json::json!({ "alias": alias, "path": stored });
        emit_success(output_mode, "add", data)?;
    }
    Ok(())
}

pub fn run_remove(registry: &Registry, alias: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    // The registry treats both outcomes as success; probe first so the user
    // hears about typos.
    let existing = lookup(registry, alias)?;
    registry.remove(alias)?;

    if output_mode.is_human() {
        match &existing {
            Some(path) => println!("{} {} ({})", Icons::DEL, ui::alias(alias), ui::dim(path)),
            None => ui::warn(&format!("'{}' is not tracked, nothing to remove", alias)),
        }
    } else {
        let data = serde_json::json!({
            "alias": alias,
            "removed": existing.is_some(),
            "path": existing,
        });
        emit_success(output_mode, "rm", data)?;
    }
    Ok(())
}

pub fn run_list(registry: &Registry, output_mode: OutputMode) -> anyhow::Result<()> {
    let entries = registry.entries()?;

    if output_mode.is_human() {
        ui::header(&format!("{} tracked repositories", entries.len()));
        ui::info(
            &format!("{} Database", Icons::DATABASE),
            &registry.path().display().to_string(),
        );
        if entries.is_empty() {
            println!("Nothing tracked yet. Try: watchgit add <alias> <path>");
        } else {
            println!("{}", ui::entries_table(&entries));
        }
    } else {
        emit_success(output_mode, "list", serde_json::to_value(&entries)?)?;
    }
    Ok(())
}

pub fn run_path(registry: &Registry, alias: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let Some(path) = lookup(registry, alias)? else {
        bail!("'{}' is not tracked", alias);
    };

    if output_mode.is_human() {
        // Bare path so it can be used in command substitution.
        println!("{}", path);
    } else {
        let data = serde_json::json!({ "alias": alias, "path": path });
        emit_success(output_mode, "path", data)?;
    }
    Ok(())
}

pub fn run_status(
    registry: &Registry,
    alias: Option<&str>,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let targets = match alias {
        Some(alias) => match lookup(registry, alias)? {
            Some(path) => vec![Entry {
                alias: alias.to_string(),
                path,
            }],
            None => bail!("'{}' is not tracked", alias),
        },
        None => registry.entries()?,
    };

    if targets.is_empty() && output_mode.is_human() {
        println!("Nothing tracked yet. Try: watchgit add <alias> <path>");
        return Ok(());
    }

    let mut reports = Vec::with_capacity(targets.len());
    let mut failures = 0;

    for entry in &targets {
        let outcome = git_status(Path::new(&entry.path), output_mode.is_human());
        if output_mode.is_human() {
            ui::section(&entry.alias, &entry.path);
        }

        match outcome {
            Ok(status) => {
                if output_mode.is_human() {
                    print_status(&status);
                }
                reports.push(serde_json::json!({
                    "alias": entry.alias,
                    "path": entry.path,
                    "ok": true,
                    "status": status,
                }));
            }
            Err(e) => {
                tracing::debug!("status failed for {}: {:#}", entry.alias, e);
                failures += 1;
                if output_mode.is_human() {
                    ui::error(&format!("{:#}", e));
                }
                reports.push(serde_json::json!({
                    "alias": entry.alias,
                    "path": entry.path,
                    "ok": false,
                    "error": format!("{:#}", e),
                }));
            }
        }
    }

    emit_success(output_mode, "status", serde_json::Value::Array(reports))?;

    if failures > 0 {
        bail!(
            "{} of {} repositories could not be inspected",
            failures,
            targets.len()
        );
    }
    Ok(())
}

fn print_status(status: &str) {
    let mut lines = status.lines();
    if let Some(branch) = lines.next() {
        println!("  {}", branch);
    }

    let mut clean = true;
    for line in lines {
        clean = false;
        println!("  {}", line);
    }
    if clean {
        println!("  {}", ui::dim("clean"));
    }
}

fn git_status(repo: &Path, color: bool) -> anyhow::Result<String> {
    if !repo.is_dir() {
        bail!("{} no longer exists", repo.display());
    }

    let mut cmd = Command::new("git");
    if color && console::Term::stdout().is_term() {
        cmd.args(["-c", "color.status=always"]);
    }
    let output = cmd
        .arg("-C")
        .arg(repo)
        .args(["status", "--short", "--branch"])
        .output()
        .map_err(|e| anyhow!("failed to run git: {}", e))?;

    if !output.status.success() {
        bail!(
            "git status failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn run_version(output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode.is_human() {
        ui::header(&format!("watchgit {}", env!("CARGO_PKG_VERSION")));
        ui::info("Schema version", &SCHEMA_VERSION.to_string());
    } else {
        let data = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "schema_version": SCHEMA_VERSION,
        });
        emit_success(output_mode, "version", data)?;
    }
    Ok(())
}
