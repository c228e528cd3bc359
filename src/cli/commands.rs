use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tm", about = concat!("TaskMate v", env!("CARGO_PKG_VERSION"), " - tasks on a calendar"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this data directory instead of searching for .taskmate/
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .taskmate/ data directory here
    Init(InitArgs),
    /// Create an account
    Signup(SignupArgs),
    /// Sign in
    Login(LoginArgs),
    /// Sign out
    Logout,
    /// Show the signed-in profile and task totals
    Profile,
    /// Add a task
    Add(AddArgs),
    /// Change a task's description, time or date
    Edit(EditArgs),
    /// Flip a task between done and not done
    Toggle(IdArgs),
    /// Delete a task
    Rm(IdArgs),
    /// List tasks grouped by date
    List(ListArgs),
    /// Print the task list every time it changes
    Watch(WatchArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Rewrite the config of an existing data directory
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Account args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SignupArgs {
    /// Display name
    #[arg(long)]
    pub name: String,
    /// Email address
    #[arg(long)]
    pub email: String,
    /// Password (read from stdin if omitted)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct LoginArgs {
    /// Email address
    #[arg(long)]
    pub email: String,
    /// Password (read from stdin if omitted)
    #[arg(long)]
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// What to do
    pub description: String,
    /// When, free text (e.g. "9am")
    #[arg(long)]
    pub time: String,
    /// Day: YYYY-MM-DD or "today"
    #[arg(long, default_value = "today")]
    pub date: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub time: Option<String>,
    /// Day: YYYY-MM-DD or "today"
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only tasks on this day (YYYY-MM-DD or "today")
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Exit after this many updates, counting the initial list
    #[arg(long)]
    pub count: Option<usize>,
}
