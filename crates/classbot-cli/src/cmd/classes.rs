use crate::cmd::{load_config, open_registry};
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use classbot_core::types::ManagedClass;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ClassesSubcommand {
    /// List managed classes in sorted order
    List,

    /// Record a managed class (channel and role are created on the next run)
    Add {
        /// Letters only, e.g. CS
        department: String,
        /// Digits only, e.g. 101
        course_id: String,
    },

    /// Remove one occurrence of a managed class
    Remove {
        department: String,
        course_id: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(config_path: &Path, subcmd: ClassesSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ClassesSubcommand::List => list(config_path, json),
        ClassesSubcommand::Add {
            department,
            course_id,
        } => add(config_path, department, course_id, json),
        ClassesSubcommand::Remove {
            department,
            course_id,
        } => remove(config_path, department, course_id, json),
    }
}

fn list(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registry = open_registry(config_path, &config)?;
    let mut classes = registry.list().to_vec();
    classes.sort();

    if json {
        return print_json(&classes);
    }
    if classes.is_empty() {
        println!("No managed classes.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = classes
        .iter()
        .map(|c| {
            vec![
                c.department.clone(),
                c.course_id.clone(),
                c.channel_name(),
                c.role_name(),
            ]
        })
        .collect();
    print_table(&["DEPARTMENT", "COURSE", "CHANNEL", "ROLE"], &rows);
    Ok(())
}

fn add(
    config_path: &Path,
    department: String,
    course_id: String,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut registry = open_registry(config_path, &config)?;
    let class = ManagedClass::new(department, course_id).context("cannot add class")?;

    registry.add(vec![class.clone()])?;

    if json {
        print_json(&serde_json::json!({ "added": class }))?;
    } else {
        println!("Added {class} (#{})", class.channel_name());
    }
    Ok(())
}

fn remove(
    config_path: &Path,
    department: String,
    course_id: String,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut registry = open_registry(config_path, &config)?;
    let class = ManagedClass::from_parts(department, course_id);

    let removed = registry.remove(std::slice::from_ref(&class))?;
    if removed == 0 {
        anyhow::bail!("{class} is not a managed class");
    }

    if json {
        print_json(&serde_json::json!({ "removed": class }))?;
    } else {
        println!("Removed {class}");
    }
    Ok(())
}
