use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adminx_state::{
    AppContext, DocumentRoot, FileStorage, Notification, NotificationKind, ProfileUpdate,
    StateSettings, SystemThemeMonitor, SystemThemeSignal, Theme, detect_system_dark_mode,
};

/// Drive the AdminX dashboard state stores from the terminal.
#[derive(Parser)]
#[command(name = "adminx")]
#[command(version)]
#[command(about = "Inspect and change the AdminX dashboard session and preferences")]
#[command(after_help = "EXAMPLES:\n    \
    adminx status                                   Show session and preferences\n    \
    adminx login -e admin@dashboard.com -p secret1  Sign in with the demo backend\n    \
    adminx theme toggle                             Switch between light and dark\n    \
    adminx sidebar toggle                           Collapse or expand the sidebar\n    \
    adminx watch                                    Follow OS theme changes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding persisted store records
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in user and layout preferences
    Status,

    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Edit the signed-in user's profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, conflicts_with = "clear_avatar")]
        avatar: Option<String>,
        #[arg(long)]
        clear_avatar: bool,
    },

    /// Show or change the theme: light, dark, system or toggle
    Theme { value: Option<String> },

    /// Show or toggle the collapsed sidebar
    Sidebar {
        #[arg(value_parser = ["toggle", "show"], default_value = "show")]
        action: String,
    },

    /// Follow OS theme changes until interrupted
    Watch,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "adminx=debug,adminx_state=debug"
    } else {
        "adminx=info,adminx_state=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let settings = match &cli.config {
        Some(path) => StateSettings::load_from(path),
        None => StateSettings::load(),
    };
    let storage_dir = cli
        .storage_dir
        .clone()
        .or_else(|| settings.storage_dir.clone())
        .unwrap_or_else(FileStorage::default_dir);
    tracing::debug!("Using storage at {}", storage_dir.display());

    let (monitor, system) = match cli.command {
        Commands::Watch => {
            let (monitor, signal) = SystemThemeMonitor::start(settings.system_theme_poll());
            (Some(monitor), signal)
        }
        _ => (None, SystemThemeSignal::fixed(detect_system_dark_mode())),
    };

    let ctx = AppContext::with_demo_backend(
        &settings,
        Arc::new(FileStorage::new(storage_dir)),
        Box::new(DocumentRoot::new()),
        system,
    );

    let outcome = run(&ctx, cli.command).await;

    print_notifications(&ctx.notifications.snapshot());
    ctx.shutdown();
    if let Some(monitor) = monitor {
        monitor.stop();
    }
    outcome
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Status => {
            print_session(ctx);
            print_preferences(ctx);
        }
        Commands::Login { email, password } => {
            if ctx.session.is_authenticated() {
                println!("{}", "Already signed in; signing in again.".yellow());
            }
            ctx.login_with_feedback(&email, &password)
                .await
                .context("Login failed")?;
            print_session(ctx);
        }
        Commands::Register { name, email, password } => {
            ctx.register_with_feedback(&name, &email, &password)
                .await
                .context("Registration failed")?;
            print_session(ctx);
        }
        Commands::Logout => {
            if !ctx.session.is_authenticated() {
                println!("{}", "Not currently signed in.".yellow());
                return Ok(());
            }
            ctx.session.logout();
            println!("Signed out.");
        }
        Commands::Profile {
            name,
            email,
            avatar,
            clear_avatar,
        } => {
            let update = ProfileUpdate {
                display_name: name,
                email,
                avatar_ref: if clear_avatar { Some(None) } else { avatar.map(Some) },
                role: None,
            };
            if update.is_empty() {
                bail!("Nothing to update; pass --name, --email, --avatar or --clear-avatar");
            }
            ctx.session
                .update_profile(update)
                .context("Profile update failed")?;
            print_session(ctx);
        }
        Commands::Theme { value } => {
            match value.as_deref() {
                None => {}
                Some("toggle") => ctx.preferences.toggle_theme(),
                Some(other) => {
                    let theme: Theme = other.parse().map_err(anyhow::Error::msg)?;
                    ctx.preferences.set_theme(theme);
                }
            }
            print_preferences(ctx);
        }
        Commands::Sidebar { action } => {
            if action == "toggle" {
                ctx.preferences.toggle_sidebar_collapsed();
            }
            print_preferences(ctx);
        }
        Commands::Watch => {
            print_preferences(ctx);
            ctx.preferences.subscribe(|state| {
                println!("Theme now {} ({})", state.resolved.to_string().bold(), state.theme);
            });
            println!("Watching for system theme changes. Press Ctrl-C to stop.");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
        }
    }
    Ok(())
}

fn print_session(ctx: &AppContext) {
    match ctx.session.user() {
        Some(user) => {
            println!(
                "Signed in as {} <{}> [{}]",
                user.display_name.bold(),
                user.email.cyan(),
                user.initials()
            );
            println!("  Role:    {}", user.role);
            println!("  Member:  since {}", user.created_at);
            if let Some(avatar) = &user.avatar_ref {
                println!("  Avatar:  {avatar}");
            }
        }
        None => println!("{}", "Not signed in.".dimmed()),
    }
}

fn print_preferences(ctx: &AppContext) {
    let state = ctx.preferences.get_state();
    println!("Theme:    {} (showing {})", state.theme, state.resolved.to_string().bold());
    let sidebar = if state.sidebar_collapsed { "collapsed" } else { "expanded" };
    println!("Sidebar:  {sidebar}");
}

fn print_notifications(toasts: &[Notification]) {
    for toast in toasts {
        let label = match toast.kind {
            NotificationKind::Success => toast.title.green(),
            NotificationKind::Error => toast.title.red(),
            NotificationKind::Warning => toast.title.yellow(),
            NotificationKind::Info => toast.title.blue(),
        };
        match &toast.message {
            Some(message) => println!("{} {}", label.bold(), message),
            None => println!("{}", label.bold()),
        }
    }
}
