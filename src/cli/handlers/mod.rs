mod init;
pub use init::cmd_init;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;

use crate::backend::DocumentStore;
use crate::backend::auth::{AuthProvider, AuthUser, LocalAuth};
use crate::backend::file_store::FileStore;
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, DATA_DIR_ENV};
use crate::logging;
use crate::model::date::{canonical_date, today};
use crate::model::{AppConfig, TASKS, Task, TaskDraft, TaskPatch};
use crate::ops::account_ops::{self, AccountError};
use crate::ops::task_ops;
use crate::sync::{group_by_date, tasks_from_snapshot};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a command needs once the data directory is known
pub struct AppContext {
    pub data_dir: PathBuf,
    pub config: AppConfig,
    pub store: Arc<FileStore>,
    pub auth: LocalAuth,
}

impl AppContext {
    /// Resolve the data directory, read its config, and start logging
    pub fn load(data_dir_flag: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let cwd = std::env::current_dir()?;
        let env = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        let data_dir = config_io::resolve_data_dir(data_dir_flag.map(Path::new), env.as_deref(), &cwd)?;
        let config = config_io::read_config(&data_dir)?;
        logging::init(&data_dir, &config.log)?;

        Ok(AppContext {
            store: Arc::new(FileStore::open(&data_dir)?),
            auth: LocalAuth::new(&data_dir),
            data_dir,
            config,
        })
    }

    pub fn require_session(&self) -> Result<AuthUser, AccountError> {
        self.auth.current_user().ok_or(AccountError::NotSignedIn)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let cmd = match cli.command {
        None => return Err("no command given (run `tm` without arguments for the TUI)".into()),
        // Init runs before there is a data directory to load
        Some(Commands::Init(args)) => return cmd_init(args, cli.data_dir.as_deref()),
        Some(cmd) => cmd,
    };

    let ctx = AppContext::load(cli.data_dir.as_deref())?;
    match cmd {
        Commands::Init(_) => unreachable!("handled above"),

        // Account commands
        Commands::Signup(args) => cmd_signup(&ctx, args, json),
        Commands::Login(args) => cmd_login(&ctx, args, json),
        Commands::Logout => cmd_logout(&ctx),
        Commands::Profile => cmd_profile(&ctx, json),

        // Task commands
        Commands::Add(args) => cmd_add(&ctx, args, json),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Toggle(args) => cmd_toggle(&ctx, args, json),
        Commands::Rm(args) => cmd_rm(&ctx, args),
        Commands::List(args) => cmd_list(&ctx, args, json),
        Commands::Watch(args) => cmd_watch(&ctx, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Use the flag value, or read one line from stdin
fn password_arg(given: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(p) = given {
        return Ok(p);
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn load_tasks(store: &dyn DocumentStore) -> Result<Vec<Task>, Box<dyn std::error::Error>> {
    Ok(tasks_from_snapshot(&store.list(TASKS)?))
}

fn print_tasks(tasks: &[Task], json: bool) -> CmdResult {
    let groups = group_by_date(tasks);
    if json {
        println!("{}", serde_json::to_string_pretty(&groups_to_json(&groups))?);
    } else if groups.is_empty() {
        println!("No tasks yet.");
    } else {
        for line in format_groups(&groups) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Account commands
// ---------------------------------------------------------------------------

fn cmd_signup(ctx: &AppContext, args: SignupArgs, json: bool) -> CmdResult {
    let password = password_arg(args.password)?;
    let profile = account_ops::sign_up(&ctx.auth, ctx.store.as_ref(), &args.name, &args.email, &password)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Account created for {}. Run `tm login` to sign in.", profile.email);
    }
    Ok(())
}

fn cmd_login(ctx: &AppContext, args: LoginArgs, json: bool) -> CmdResult {
    let password = password_arg(args.password)?;
    let profile = account_ops::log_in(&ctx.auth, ctx.store.as_ref(), &args.email, &password)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Signed in as {} <{}>", profile.name, profile.email);
    }
    Ok(())
}

fn cmd_logout(ctx: &AppContext) -> CmdResult {
    account_ops::log_out(&ctx.auth)?;
    println!("Signed out");
    Ok(())
}

fn cmd_profile(ctx: &AppContext, json: bool) -> CmdResult {
    let summary = account_ops::profile_summary(&ctx.auth, ctx.store.as_ref())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_profile(&summary) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &AppContext, args: AddArgs, json: bool) -> CmdResult {
    ctx.require_session()?;
    let draft = TaskDraft {
        description: args.description,
        time: args.time,
        date: Some(args.date),
    };
    let id = task_ops::create_task(ctx.store.as_ref(), &draft, today())?;
    if json {
        println!("{}", serde_json::to_string(&CreatedJson { id: &id })?);
    } else {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_edit(ctx: &AppContext, args: EditArgs) -> CmdResult {
    ctx.require_session()?;
    let patch = TaskPatch {
        description: args.description,
        time: args.time,
        date: args.date,
    };
    task_ops::update_task(ctx.store.as_ref(), &args.id, &patch, today())?;
    println!("Task updated successfully!");
    Ok(())
}

fn cmd_toggle(ctx: &AppContext, args: IdArgs, json: bool) -> CmdResult {
    ctx.require_session()?;
    let task = task_ops::fetch_task(ctx.store.as_ref(), &args.id)?;
    let completed = task_ops::toggle_completion(ctx.store.as_ref(), &args.id, task.completed)?;
    if json {
        println!(
            "{}",
            serde_json::to_string(&ToggledJson {
                id: &args.id,
                completed
            })?
        );
    } else {
        let check = if completed { 'x' } else { ' ' };
        println!("[{}] {}", check, task.description);
    }
    Ok(())
}

fn cmd_rm(ctx: &AppContext, args: IdArgs) -> CmdResult {
    ctx.require_session()?;
    task_ops::delete_task(ctx.store.as_ref(), &args.id)?;
    println!("Deleted {}", args.id);
    Ok(())
}

fn cmd_list(ctx: &AppContext, args: ListArgs, json: bool) -> CmdResult {
    ctx.require_session()?;
    let mut tasks = load_tasks(ctx.store.as_ref())?;
    if let Some(date) = args.date {
        let date = canonical_date(&date, today())?;
        tasks.retain(|t| t.date == date);
    }
    print_tasks(&tasks, json)
}

fn cmd_watch(ctx: &AppContext, args: WatchArgs, json: bool) -> CmdResult {
    ctx.require_session()?;
    let (tx, rx) = mpsc::channel();
    let dispatch = move |tasks: Vec<Task>| {
        let _ = tx.send(tasks);
    };
    let _guard = crate::sync::open(ctx.store.as_ref(), TASKS, dispatch)?;

    let mut seen = 0;
    while args.count.is_none_or(|n| seen < n) {
        let Ok(tasks) = rx.recv() else { break };
        if seen > 0 && !json {
            println!("--");
        }
        if json {
            println!("{}", serde_json::to_string(&groups_to_json(&group_by_date(&tasks)))?);
        } else {
            print_tasks(&tasks, false)?;
        }
        seen += 1;
    }
    Ok(())
}
