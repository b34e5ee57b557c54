//! Offline translation over an in-memory artifact tree.

use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use serde::Serialize;

use super::{ChangeRecord, structure_helpers};
use crate::artifact::memory::MemoryArtifactTree;
use crate::cli::args::TranslateArgs;
use crate::config::Settings;
use crate::interpreted::{InterpretedTree, Notification};

/// What a listener registered as described by [`TranslateArgs`] observed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TranslateReport {
    /// Artifact path of the root the listener ended up under
    pub root: String,
    /// Paths requested from the artifact notifier
    pub registered: Vec<String>,
    /// Triples delivered to the listener
    pub deliveries: Vec<ChangeRecord>,
}

/// Build the tree, register, fire the raw triple and collect deliveries.
pub fn translate(settings: &Settings, args: &TranslateArgs) -> anyhow::Result<TranslateReport> {
    let artifacts = MemoryArtifactTree::with_containers(&args.entries);
    for root in &args.structure.roots {
        artifacts.add_container(root);
    }
    artifacts.add_container(&args.listen);

    let helpers = structure_helpers(settings, &args.structure)?;
    let tree = InterpretedTree::new(artifacts.root(), Arc::new(helpers));
    let container = tree
        .container(&args.listen)
        .with_context(|| format!("no container at {}", args.listen))?;

    let deliveries = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&deliveries);
    let notifier = container.adapt_notifier();
    notifier.register_for_notifications(
        &Notification::new(container.clone(), args.register.iter().cloned()),
        Arc::new(move |a: &Notification, r: &Notification, m: &Notification| {
            sink.lock().push(ChangeRecord::from_triple(a, r, m));
        }),
    )?;

    artifacts
        .notifier()
        .fire(&args.added, &args.removed, &args.modified)?;

    let deliveries = deliveries.lock().clone();
    Ok(TranslateReport {
        root: notifier.root_path().to_string(),
        registered: notifier.forwarded_paths().into_iter().collect(),
        deliveries,
    })
}

/// Run translate command - print the report as JSON.
pub fn run_translate(settings: &Settings, args: &TranslateArgs) -> anyhow::Result<()> {
    let report = translate(settings, args)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
