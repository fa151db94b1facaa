use crate::cmd::{load_config, open_registry};
use crate::output::{print_json, print_table};
use anyhow::Context;
use classbot_core::reconcile::{ReconcilePlan, Reconciler};
use classbot_core::types::ManagedClass;
use classbot_discord::DiscordClient;
use std::path::Path;

pub fn run(config_path: &Path, token: &str, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registry = open_registry(config_path, &config)?;
    let client =
        DiscordClient::new(token, &config.guild_id).context("failed to build Discord client")?;

    let rt = tokio::runtime::Runtime::new()?;
    let plan = rt
        .block_on(
            Reconciler::new(&client, &config.class_category, config.reorder_channels)
                .plan(registry.list()),
        )
        .context("failed to read guild state")?;

    if json {
        return print_json(&plan);
    }
    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &ReconcilePlan) {
    if plan.is_empty() {
        println!("Guild is in sync with the ledger.");
        return;
    }

    let mut rows = Vec::new();
    let mut push = |action: &str, classes: &[ManagedClass], name: fn(&ManagedClass) -> String| {
        for class in classes {
            rows.push(vec![action.to_string(), name(class)]);
        }
    };
    push("create role", &plan.missing_roles, ManagedClass::role_name);
    push("create channel", &plan.missing_channels, ManagedClass::channel_name);
    push("ingest", &plan.ingestion_candidates, ManagedClass::channel_name);
    print_table(&["ACTION", "NAME"], &rows);
}
