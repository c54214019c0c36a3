use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Context;

use crate::config::FeedMeta;
use crate::store::{self, Store};
use crate::{assemble, render};

pub(crate) fn cmd_render(db_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let meta = FeedMeta::from_env();
    let mut db = Store::open(db_path)?;
    let tx = db.session()?;
    let records = store::all_workouts(&tx)?;
    let states = store::all_sync_states(&tx)?;
    drop(tx);

    let entries = assemble::assemble(&records, &states, &meta.site_url)?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            render::render(&meta, &entries, file)?;
        }
        None => {
            render::render(&meta, &entries, io::stdout().lock())?;
        }
    }
    Ok(())
}
