mod app;
mod persistence;
mod tui;
mod view;

use clap::{Parser, Subcommand};
use std::io;

use kollabx_models::ProjectId;
use kollabx_sdk::{KollabClient, ProjectFilter, ProjectSort};

use crate::app::ChatApp;
use crate::tui::EventHandler;

#[derive(Parser, Debug)]
#[command(name = "kollabx-tui")]
#[command(about = "KollabX terminal client")]
#[command(author, version, long_about = None)]
struct Cli {
    /// Backend REST endpoint
    #[arg(long, env = "KOLLABX_API_URL", default_value = "http://localhost:3001")]
    api_url: String,

    /// Realtime bus endpoint
    #[arg(long, env = "KOLLABX_NATS_URL", default_value = "nats://localhost:4222")]
    nats_url: String,

    /// Account email (required when no cached session exists)
    #[arg(long)]
    email: Option<String>,

    /// Account password
    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the chat view for one of your projects
    Chat {
        /// Project id to open
        #[arg(long)]
        project: ProjectId,
    },

    /// Browse public projects
    Projects {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Title search term
        #[arg(long)]
        search: Option<String>,

        /// Oldest first instead of newest first
        #[arg(long)]
        oldest: bool,
    },

    /// List the teams you belong to
    Teams,

    /// Show your notification feed
    Notifications,

    /// Sign out and clear the cached session
    Logout,
}

/// Reuse the cached session when the backend still accepts it, otherwise
/// sign in with the provided credentials and cache the new session.
async fn connect(cli: &Cli) -> KollabClient {
    if let Some(session) = persistence::load_session() {
        match KollabClient::connect(&cli.api_url, &cli.nats_url, session).await {
            Ok(client) => return client,
            Err(e) => eprintln!("[auth] Cached session rejected: {e}"),
        }
    }

    let email = cli
        .email
        .as_deref()
        .expect("no cached session; pass --email");
    let password = cli
        .password
        .as_deref()
        .expect("no cached session; pass --password");

    let client = KollabClient::sign_in(&cli.api_url, &cli.nats_url, email, password)
        .await
        .expect("Failed to sign in");
    persistence::save_session(client.session());
    client
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Chat { project } => {
            let project = *project;
            return run_chat(&cli, project).await;
        }
        Commands::Projects {
            category,
            search,
            oldest,
        } => {
            let client = connect(&cli).await;
            let filter = ProjectFilter {
                category: category.clone(),
                search: search.clone(),
                status: None,
            };
            let sort = if *oldest {
                ProjectSort::Oldest
            } else {
                ProjectSort::Newest
            };
            let projects = client
                .list_projects(&filter, sort)
                .await
                .expect("Failed to list projects");
            for p in projects {
                println!(
                    "{}  {} [{}] {}/{} members ({})",
                    p.id, p.title, p.category, p.current_members, p.team_size, p.status
                );
            }
        }
        Commands::Teams => {
            let client = connect(&cli).await;
            let teams = client.user_teams().await.expect("Failed to list teams");
            if teams.is_empty() {
                println!("You are not on any team yet.");
            }
            for membership in teams {
                if let Some(project) = membership.project {
                    let role = membership.member.role.as_deref().unwrap_or("member");
                    println!("{}  {} ({role})", project.id, project.title);
                }
            }
        }
        Commands::Notifications => {
            let client = connect(&cli).await;
            let unread = client.unread_count().await.expect("Failed to count unread");
            println!("{unread} unread");
            let feed = client
                .recent_notifications()
                .await
                .expect("Failed to fetch notifications");
            for n in feed {
                let marker = if n.read { " " } else { "*" };
                println!(
                    "{marker} [{}] {}: {}",
                    n.created_at.format("%Y-%m-%d %H:%M"),
                    n.title,
                    n.body
                );
            }
        }
        Commands::Logout => {
            let client = connect(&cli).await;
            client.sign_out().await.expect("Failed to sign out");
            persistence::clear_session();
            println!("Signed out.");
        }
    }

    Ok(())
}

async fn run_chat(cli: &Cli, project: ProjectId) -> io::Result<()> {
    let client = connect(cli).await;
    let mut app = ChatApp::new(client);

    if let Err(e) = app.notifications.start().await {
        eprintln!("[notifications] Feed unavailable: {e}");
    }
    if let Err(e) = app.session.select_project(project).await {
        eprintln!("Failed to open project {project}: {e}");
        return Ok(());
    }

    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(250);

    loop {
        terminal.draw(|f| app.render(f))?;

        tokio::select! {
            action = events.next_async() => {
                match action {
                    Some(action) => app.update(action).await,
                    None => break,
                }
            }
            result = app.session.pump() => {
                if let Err(e) = result {
                    app.show_toast(format!("Error: {e}"));
                }
            }
            alert = app.notifications.pump() => {
                match alert {
                    Ok(Some(notification)) => app.show_toast(notification.title),
                    Ok(None) => {}
                    Err(e) => app.show_toast(format!("Error: {e}")),
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    tui::restore()?;
    Ok(())
}
