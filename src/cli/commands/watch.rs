//! Watch a real directory and print root-relative changes.

use std::sync::Arc;

use anyhow::Context;

use super::{ChangeRecord, structure_helpers};
use crate::artifact::fs::FsArtifactTree;
use crate::cli::args::WatchArgs;
use crate::config::Settings;
use crate::interpreted::{InterpretedTree, Notification};
use crate::paths;

/// Run watch command - print one JSON line per delivered triple until Ctrl-C.
pub async fn run_watch(settings: &Settings, args: &WatchArgs) -> anyhow::Result<()> {
    let mut watch_config = settings.watch.clone();
    if let Some(ms) = args.debounce_ms {
        watch_config.debounce_ms = ms;
    }

    let artifacts = FsArtifactTree::open(&args.dir, &watch_config)
        .with_context(|| format!("cannot open {}", args.dir.display()))?;
    let helpers = structure_helpers(settings, &args.structure)?;
    let tree = InterpretedTree::new(artifacts.root(), Arc::new(helpers));

    let listen = if args.listen.is_empty() {
        vec![paths::ROOT.to_string()]
    } else {
        args.listen.clone()
    };

    for path in &listen {
        let container = tree
            .container(path)
            .with_context(|| format!("no directory at {path} below {}", args.dir.display()))?;
        let notifier = container.adapt_notifier();
        notifier.register_for_notifications(
            &Notification::new(container.clone(), [paths::ROOT]),
            Arc::new(|a: &Notification, r: &Notification, m: &Notification| {
                match serde_json::to_string(&ChangeRecord::from_triple(a, r, m)) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!("[watch] cannot serialize change: {e}"),
                }
            }),
        )?;
        crate::log_event!("watch", "listening", "{path} (root {})", notifier.root_path());
    }

    eprintln!(
        "Watching {} ({} logical roots). Press Ctrl-C to stop.",
        artifacts.base().display(),
        tree.registry().len()
    );
    tokio::signal::ctrl_c().await?;

    artifacts.stop();
    Ok(())
}
