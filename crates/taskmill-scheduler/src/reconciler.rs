use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::sync::watch;
use tracing::{debug, error, info};

use taskmill_runner::{run_task, RunnerSettings};
use taskmill_store::{parse_cron, StoreError, TaskStore};

/// One in-process trigger registration, rebuilt from task data.
struct Registration {
    /// The 5-field expression the registration was built from.
    cron: String,
    schedule: Schedule,
    /// Next scheduled fire; `None` when the expression yields no future time.
    next_due: Option<DateTime<Utc>>,
}

/// Owns the trigger-registration map and drives scheduled execution.
///
/// Constructed once per process and passed explicitly — there is no global
/// scheduler. The reconciler is the sole writer of registrations; the store
/// stays the sole source of truth for task definitions.
pub struct Reconciler {
    store: TaskStore,
    settings: RunnerSettings,
    refresh: Duration,
    registrations: HashMap<String, Registration>,
}

impl Reconciler {
    pub fn new(store: TaskStore, settings: RunnerSettings, refresh: Duration) -> Self {
        Self {
            store,
            settings,
            refresh,
            registrations: HashMap::new(),
        }
    }

    /// Main loop. The refresh interval re-derives registrations from the
    /// store; the one-second tick fires due ones. Runs until `shutdown`
    /// broadcasts `true`, completing any in-flight pass first. Spawned child
    /// processes are left to finish on their own.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(refresh_secs = self.refresh.as_secs(), "reconciler started");

        let mut refresh = tokio::time::interval(self.refresh);
        let mut fire_tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = refresh.tick() => {
                    if let Err(e) = self.reconcile() {
                        error!("reconciliation pass failed: {e}");
                    }
                }
                _ = fire_tick.tick() => {
                    for name in self.take_due(Utc::now()) {
                        let _ = self.fire_one(&name);
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("reconciler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One reconciliation pass: make the registration set a pure function of
    /// the current task list.
    ///
    /// Every enabled task with a parseable cron gets a registration matching
    /// its current expression (replaced when the expression changed);
    /// registrations for disabled, deleted, or no-longer-parseable tasks are
    /// dropped. A malformed expression logs an error and skips only that
    /// task.
    pub fn reconcile(&mut self) -> taskmill_store::Result<()> {
        let tasks = self.store.list()?;
        let enabled: HashMap<&str, &str> = tasks
            .iter()
            .filter(|t| t.enabled)
            .map(|t| (t.name.as_str(), t.cron.as_str()))
            .collect();

        self.registrations.retain(|name, _| {
            let keep = enabled.contains_key(name.as_str());
            if !keep {
                info!(task = %name, "dropping registration for removed or disabled task");
            }
            keep
        });

        for task in tasks.iter().filter(|t| t.enabled) {
            let registered_cron = self.registrations.get(&task.name).map(|r| r.cron.clone());
            if registered_cron.as_deref() == Some(task.cron.as_str()) {
                continue;
            }

            let schedule = match parse_cron(&task.cron) {
                Ok(s) => s,
                Err(e) => {
                    error!(task = %task.name, "skipping task: {e}");
                    self.registrations.remove(&task.name);
                    continue;
                }
            };
            let next_due = schedule.after(&Utc::now()).next();
            if registered_cron.is_some() {
                info!(task = %task.name, cron = %task.cron, "replacing registration for changed expression");
            } else {
                info!(task = %task.name, cron = %task.cron, "registering task");
            }
            self.registrations.insert(
                task.name.clone(),
                Registration {
                    cron: task.cron.clone(),
                    schedule,
                    next_due,
                },
            );
        }
        Ok(())
    }

    /// Names of registrations due at `now`, advancing each to its next fire.
    fn take_due(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let mut due = Vec::new();
        for (name, reg) in self.registrations.iter_mut() {
            if let Some(at) = reg.next_due {
                if at <= now {
                    reg.next_due = reg.schedule.after(&now).next();
                    due.push(name.clone());
                }
            }
        }
        due
    }

    /// Fire one registration. The task is re-fetched at fire time; a task
    /// deleted or disabled since registration is skipped rather than run.
    /// Returns the spawned run handle, or `None` when the fire was skipped.
    fn fire_one(&self, name: &str) -> Option<tokio::task::JoinHandle<()>> {
        let task = match self.store.get(name) {
            Ok(task) if task.enabled => task,
            Ok(_) => {
                debug!(task = %name, "task disabled since registration; skipping fire");
                return None;
            }
            Err(StoreError::TaskNotFound { .. }) => {
                debug!(task = %name, "task deleted since registration; skipping fire");
                return None;
            }
            Err(e) => {
                error!(task = %name, "task lookup failed at fire time: {e}");
                return None;
            }
        };

        info!(task = %name, "firing scheduled run");
        let store = self.store.clone();
        let settings = self.settings.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = run_task(&store, &task, &settings).await {
                error!(task = %task.name, "scheduled run failed: {e}");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use taskmill_store::NewTask;

    fn store() -> TaskStore {
        TaskStore::new(rusqlite::Connection::open_in_memory().expect("open")).expect("init")
    }

    fn settings(dir: &std::path::Path) -> RunnerSettings {
        RunnerSettings {
            logs_dir: dir.join("logs"),
            default_interpreter: "/bin/sh".into(),
        }
    }

    fn reconciler(store: &TaskStore, dir: &std::path::Path) -> Reconciler {
        Reconciler::new(store.clone(), settings(dir), Duration::from_secs(30))
    }

    fn add_task(store: &TaskStore, name: &str, cron: &str) {
        store
            .add(NewTask {
                name: name.into(),
                script_path: format!("/jobs/{name}.py"),
                interpreter: None,
                working_dir: None,
                cron: cron.into(),
            })
            .expect("add task");
    }

    /// Observable registration state: name -> (cron, next_due).
    fn snapshot(r: &Reconciler) -> BTreeMap<String, (String, Option<DateTime<Utc>>)> {
        r.registrations
            .iter()
            .map(|(name, reg)| (name.clone(), (reg.cron.clone(), reg.next_due)))
            .collect()
    }

    #[test]
    fn reconcile_registers_enabled_tasks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store();
        add_task(&store, "backup", "0 2 * * *");
        add_task(&store, "report", "*/15 * * * *");
        store.set_enabled("report", false).expect("disable");

        let mut r = reconciler(&store, dir.path());
        r.reconcile().expect("reconcile");

        let snap = snapshot(&r);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap["backup"].0, "0 2 * * *");
        assert!(snap["backup"].1.is_some());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store();
        add_task(&store, "backup", "0 2 * * *");
        add_task(&store, "sync", "*/5 * * * *");

        let mut r = reconciler(&store, dir.path());
        r.reconcile().expect("first pass");
        let first = snapshot(&r);
        r.reconcile().expect("second pass");
        assert_eq!(snapshot(&r), first);
    }

    #[test]
    fn disable_then_enable_restores_the_same_cron() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store();
        add_task(&store, "backup", "0 2 * * *");

        let mut r = reconciler(&store, dir.path());
        r.reconcile().expect("pass");
        assert!(r.registrations.contains_key("backup"));

        store.set_enabled("backup", false).expect("disable");
        r.reconcile().expect("pass");
        assert!(r.registrations.is_empty());

        store.set_enabled("backup", true).expect("enable");
        r.reconcile().expect("pass");
        assert_eq!(r.registrations["backup"].cron, "0 2 * * *");
    }

    #[test]
    fn deleted_task_loses_its_registration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store();
        add_task(&store, "backup", "0 2 * * *");

        let mut r = reconciler(&store, dir.path());
        r.reconcile().expect("pass");
        store.remove("backup").expect("remove");
        r.reconcile().expect("pass");
        assert!(r.registrations.is_empty());
    }

    #[test]
    fn changed_expression_replaces_the_registration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store();
        add_task(&store, "backup", "0 2 * * *");

        let mut r = reconciler(&store, dir.path());
        r.reconcile().expect("pass");

        store
            .update(
                "backup",
                taskmill_store::TaskUpdate {
                    cron: Some("0 4 * * *".into()),
                    ..Default::default()
                },
            )
            .expect("update");
        r.reconcile().expect("pass");
        assert_eq!(r.registrations["backup"].cron, "0 4 * * *");
    }

    #[test]
    fn malformed_cron_skips_only_that_task() {
        // The store validates expressions, so corrupt one behind its back
        // through a second connection to the same file.
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("tasks.db");
        let store = TaskStore::open(&db_path).expect("open");
        add_task(&store, "good", "0 2 * * *");
        add_task(&store, "bad", "0 3 * * *");

        let side = rusqlite::Connection::open(&db_path).expect("side connection");
        side.execute("UPDATE tasks SET cron = 'every now and then' WHERE name = 'bad'", [])
            .expect("corrupt cron");

        let mut r = reconciler(&store, dir.path());
        r.reconcile().expect("pass must not abort");
        assert!(r.registrations.contains_key("good"));
        assert!(!r.registrations.contains_key("bad"));
    }

    #[test]
    fn take_due_advances_past_fires() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store();
        add_task(&store, "often", "* * * * *");

        let mut r = reconciler(&store, dir.path());
        r.reconcile().expect("pass");

        // Force the registration due in the past, then collect it.
        let past = Utc::now() - chrono::Duration::minutes(5);
        r.registrations.get_mut("often").unwrap().next_due = Some(past);

        let now = Utc::now();
        let due = r.take_due(now);
        assert_eq!(due, ["often"]);

        let next = r.registrations["often"].next_due.expect("next due");
        assert!(next > now);
        assert!(r.take_due(now).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fire_skips_a_task_deleted_since_registration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store();
        let script = dir.path().join("touch.sh");
        std::fs::write(&script, "exit 0\n").expect("write script");
        store
            .add(NewTask {
                name: "gone".into(),
                script_path: script.display().to_string(),
                interpreter: None,
                working_dir: None,
                cron: "* * * * *".into(),
            })
            .expect("add");

        let mut r = reconciler(&store, dir.path());
        r.reconcile().expect("pass");
        store.remove("gone").expect("remove");

        assert!(r.fire_one("gone").is_none());
        assert!(store.recent_runs(10, None).expect("runs").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fire_runs_an_existing_task_and_records_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store();
        let script = dir.path().join("ok.sh");
        std::fs::write(&script, "exit 0\n").expect("write script");
        store
            .add(NewTask {
                name: "ok".into(),
                script_path: script.display().to_string(),
                interpreter: None,
                working_dir: None,
                cron: "* * * * *".into(),
            })
            .expect("add");

        let mut r = reconciler(&store, dir.path());
        r.reconcile().expect("pass");

        let handle = r.fire_one("ok").expect("spawned");
        handle.await.expect("join");

        let runs = store.recent_runs(1, Some("ok")).expect("runs");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].exit_code, Some(0));
    }
}
