use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::collection::ChangeSet;
use crate::ports::TaskStore;
use crate::task::Task;

#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join("tasks.data");
        if !tasks_path.exists() {
            fs::write(&tasks_path, "")
                .with_context(|| format!("failed to create {}", tasks_path.display()))?;
        }

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            tasks_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_tasks(&self) -> anyhow::Result<Vec<Task>> {
        load_jsonl(&self.tasks_path).context("failed to load tasks.data")
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.tasks_path, tasks).context("failed to save tasks.data")
    }
}

impl TaskStore for DataStore {
    fn load(&mut self) -> anyhow::Result<Vec<Task>> {
        self.load_tasks()
    }

    #[tracing::instrument(
        skip(self, changes),
        fields(
            created = changes.created.len(),
            updated = changes.updated.len(),
            deleted = changes.deleted.len()
        )
    )]
    fn sync(&mut self, changes: &ChangeSet) -> anyhow::Result<()> {
        let mut tasks = self.load_tasks()?;
        apply_changes(&mut tasks, changes);
        self.save_tasks(&tasks)
    }
}

fn apply_changes(tasks: &mut Vec<Task>, changes: &ChangeSet) {
    for created in &changes.created {
        match tasks.iter_mut().find(|task| task.uuid == created.uuid) {
            Some(existing) => *existing = created.clone(),
            None => tasks.push(created.clone()),
        }
    }

    for updated in &changes.updated {
        match tasks.iter_mut().find(|task| task.uuid == updated.uuid) {
            Some(existing) => *existing = updated.clone(),
            None => {
                warn!(uuid = %updated.uuid, "updated task missing on disk; re-adding");
                tasks.push(updated.clone());
            }
        }
    }

    let deleted: HashSet<_> = changes.deleted.iter().collect();
    let before = tasks.len();
    tasks.retain(|task| !deleted.contains(&task.uuid));
    debug!(
        removed = before - tasks.len(),
        total = tasks.len(),
        "applied change set"
    );
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<Task>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let task: Task = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(task);
    }

    debug!(count = out.len(), "loaded tasks from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, tasks))]
fn save_jsonl_atomic(path: &Path, tasks: &[Task]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = tasks.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for task in tasks {
        let serialized = serde_json::to_string(task)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
