use clap::{Parser, Subcommand};

use taskmill_core::TaskmillConfig;

mod commands;

#[derive(Parser)]
#[command(name = "taskmill", version, about = "Store script-run schedules and fire them on cron timers")]
struct Cli {
    /// Path to the config file (default: ~/.taskmill/taskmill.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override the data directory from config.
    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a new task.
    Add {
        /// Unique task name.
        name: String,
        /// Path to the script to run.
        script: String,
        /// 5-field cron expression, e.g. "0 2 * * *".
        #[arg(long)]
        cron: String,
        /// Interpreter to run the script with (default from config).
        #[arg(long)]
        interpreter: Option<String>,
        /// Working directory for the spawned process.
        #[arg(long = "cwd")]
        working_dir: Option<String>,
    },
    /// Edit fields of an existing task.
    Edit {
        name: String,
        #[arg(long)]
        script: Option<String>,
        #[arg(long)]
        cron: Option<String>,
        #[arg(long)]
        interpreter: Option<String>,
        #[arg(long = "cwd")]
        working_dir: Option<String>,
    },
    /// Enable a task for scheduling.
    Enable { name: String },
    /// Disable a task without deleting it.
    Disable { name: String },
    /// Remove a task.
    Remove { name: String },
    /// List all tasks.
    List,
    /// Show recent run history.
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Only show runs of this task.
        #[arg(long)]
        name: Option<String>,
    },
    /// Run a task immediately, outside its schedule.
    RunOnce { name: String },
    /// Run the scheduler loop until interrupted.
    Start {
        /// Seconds between reconciliation passes (default from config).
        #[arg(long)]
        refresh: Option<u64>,
    },
    /// Fast-forward a source checkout to the latest commit.
    SelfUpdate {
        #[arg(long, default_value = "main")]
        branch: String,
        /// Discard local changes with a hard reset.
        #[arg(long)]
        force: bool,
        /// Repository root (default: inferred from the executable location).
        #[arg(long)]
        repo_dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskmill=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = TaskmillConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }
    config.ensure_data_dir()?;

    match cli.command {
        Command::Add {
            name,
            script,
            cron,
            interpreter,
            working_dir,
        } => commands::add(&config, name, script, cron, interpreter, working_dir),
        Command::Edit {
            name,
            script,
            cron,
            interpreter,
            working_dir,
        } => commands::edit(&config, &name, script, cron, interpreter, working_dir),
        Command::Enable { name } => commands::set_enabled(&config, &name, true),
        Command::Disable { name } => commands::set_enabled(&config, &name, false),
        Command::Remove { name } => commands::remove(&config, &name),
        Command::List => commands::list(&config),
        Command::Runs { limit, name } => commands::runs(&config, limit, name.as_deref()),
        Command::RunOnce { name } => commands::run_once(&config, &name).await,
        Command::Start { refresh } => commands::start(&config, refresh).await,
        Command::SelfUpdate {
            branch,
            force,
            repo_dir,
        } => commands::self_update(&branch, force, repo_dir),
    }
}
