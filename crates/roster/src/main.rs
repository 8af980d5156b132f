use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use roster_config::{get_log_path, get_socket_path, is_daemon_running, Config};
use roster_output::*;
use roster_types::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

static PROFILING_ENABLED: AtomicBool = AtomicBool::new(false);

fn profile_start(name: &str) -> (Instant, &str) {
    (Instant::now(), name)
}

fn profile_end((start, name): (Instant, &str)) {
    if PROFILING_ENABLED.load(Ordering::Relaxed) {
        let elapsed = start.elapsed();
        eprintln!(
            "[profile] {:>8.2}ms  {}",
            elapsed.as_secs_f64() * 1000.0,
            name
        );
    }
}

const MAIN_HELP: &str = r#"Roster is a command line user directory. It loads users from a remote
user API once, keeps them in a background daemon for the rest of the session,
and lets you browse and edit that local copy.

`roster list` shows the directory. Pass a QUERY to filter by name or email
(case-insensitive) and `--sort` to order by recently added, name, email or
company.

`roster show ID` prints one user in full. Users that are not in the local
copy are looked up on the remote API.

`roster add`, `roster edit` and `roster delete` change the local copy only;
nothing is written back to the API. `roster reload` throws local changes
away and fetches the directory again.

See `roster COMMAND --help` for more documentation and command-specific options."#;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = MAIN_HELP)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,

    #[arg(long, global = true, help = "Print timing information for profiling")]
    profile: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List users, optionally filtered and sorted.")]
    List {
        #[arg(help = "Case-insensitive text to match against name or email")]
        query: Option<String>,
        #[arg(
            short = 's',
            long,
            help = "Sort order: added, name, email or company (default from config)"
        )]
        sort: Option<SortKey>,
    },

    #[command(about = "Show everything known about one user.")]
    Show {
        #[arg(help = "User id")]
        id: String,
    },

    #[command(about = "Add a user to the local directory.")]
    Add {
        #[arg(long, default_value = "", help = "Full name (required)")]
        name: String,
        #[arg(long, default_value = "", help = "Email address (required)")]
        email: String,
        #[arg(long, default_value = "", help = "Company name")]
        company: String,
    },

    #[command(about = "Edit a user. Fields that are not given keep their current value.")]
    Edit {
        #[arg(help = "User id")]
        id: String,
        #[arg(long, help = "New full name")]
        name: Option<String>,
        #[arg(long, help = "New email address")]
        email: Option<String>,
        #[arg(long, help = "New company name")]
        company: Option<String>,
    },

    #[command(about = "Delete a user from the local directory.")]
    Delete {
        #[arg(help = "User id")]
        id: String,
    },

    #[command(about = "Fetch the directory again, discarding local changes.")]
    Reload,

    #[command(about = "Manage the roster daemon.")]
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },

    #[command(about = "Print config file location and contents.")]
    Config,

    #[command(about = "Print help for all commands.")]
    HelpAll,
}

#[derive(Subcommand)]
enum DaemonCommands {
    #[command(about = "Show current daemon state.")]
    Info,
    #[command(about = "Restart the roster daemon.")]
    Restart,
    #[command(about = "Start the roster daemon.")]
    Start,
    #[command(about = "Stop the roster daemon.")]
    Stop,
}

#[tokio::main]
async fn main() -> Result<()> {
    let total_start = profile_start("total");
    let cli = Cli::parse();

    if cli.profile {
        PROFILING_ENABLED.store(true, Ordering::Relaxed);
    }

    let result = match cli.command {
        Commands::Config => handle_config(),
        Commands::HelpAll => handle_help_all(),
        command => {
            let config = Config::load()?;

            match command {
                Commands::Daemon { command } => handle_daemon_command(&config, command).await,
                Commands::List { query, sort } => {
                    handle_list(&config, cli.json, query.unwrap_or_default(), sort).await
                }
                Commands::Show { id } => handle_show(&config, cli.json, id).await,
                Commands::Add {
                    name,
                    email,
                    company,
                } => handle_add(&config, cli.json, name, email, company).await,
                Commands::Edit {
                    id,
                    name,
                    email,
                    company,
                } => handle_edit(&config, cli.json, id, name, email, company).await,
                Commands::Delete { id } => handle_delete(&config, cli.json, id).await,
                Commands::Reload => handle_reload(&config, cli.json).await,
                Commands::Config | Commands::HelpAll => unreachable!(),
            }
        }
    };

    profile_end(total_start);
    result
}

fn handle_help_all() -> Result<()> {
    use clap::CommandFactory;

    let mut cmd = Cli::command();

    cmd.write_long_help(&mut std::io::stdout())?;
    println!("\n");

    let subcommands: Vec<_> = cmd
        .get_subcommands()
        .map(|c| c.get_name().to_string())
        .collect();
    for name in subcommands {
        if name == "help-all" || name == "help" {
            continue;
        }
        let mut subcmd = Cli::command();
        if let Some(sub) = subcmd.find_subcommand_mut(&name) {
            println!(
                "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
            );
            println!("roster {}", name);
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
            sub.write_long_help(&mut std::io::stdout())?;
            println!("\n");
        }
    }

    Ok(())
}

async fn ensure_daemon_running() -> Result<()> {
    let socket_path = get_socket_path();

    if can_connect_to_daemon(&socket_path).await {
        return Ok(());
    }

    let exe = std::env::current_exe()?;
    let daemon_exe = exe
        .parent()
        .ok_or_else(|| anyhow!("Cannot locate roster-daemon next to {}", exe.display()))?
        .join("roster-daemon");

    Command::new(&daemon_exe)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .envs(std::env::vars())
        .spawn()
        .map_err(|e| anyhow!("Failed to spawn {}: {}", daemon_exe.display(), e))?;

    for _ in 0..100 {
        if can_connect_to_daemon(&socket_path).await {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    Err(anyhow!("Failed to start daemon"))
}

async fn can_connect_to_daemon(socket_path: &Path) -> bool {
    if !socket_path.exists() {
        return false;
    }
    UnixStream::connect(socket_path).await.is_ok()
}

async fn send_request<P, R>(config: &Config, method: &str, params: P) -> Result<R>
where
    P: Serialize,
    R: DeserializeOwned,
{
    let profile = profile_start(method);
    let socket_path = get_socket_path();

    let stream = tokio::time::timeout(Duration::from_secs(5), UnixStream::connect(&socket_path))
        .await
        .map_err(|_| anyhow!("Timeout connecting to daemon"))??;

    let (mut read_half, mut write_half) = stream.into_split();

    let request = RpcRequest {
        method: method.to_string(),
        params,
    };

    write_half
        .write_all(serde_json::to_vec(&request)?.as_slice())
        .await?;
    write_half.shutdown().await?;

    let mut response_data = Vec::new();
    tokio::time::timeout(
        Duration::from_secs(config.daemon.request_timeout),
        read_half.read_to_end(&mut response_data),
    )
    .await
    .map_err(|_| anyhow!("Timeout waiting for daemon response (method: {})", method))??;

    profile_end(profile);

    let response: RpcResponse<R> = serde_json::from_slice(&response_data)?;
    response.into_result().map_err(|error| {
        if error.starts_with("Internal error") {
            anyhow!(with_log_tail(error, &get_log_path()))
        } else {
            anyhow!("{}", error)
        }
    })
}

fn with_log_tail(error: String, log_path: &Path) -> String {
    let mut msg = error;

    if let Ok(content) = std::fs::read_to_string(log_path) {
        let lines: Vec<&str> = content.lines().collect();
        let tail = &lines[lines.len().saturating_sub(15)..];
        msg.push_str("\n\nRecent daemon log:\n");
        msg.push_str(&tail.join("\n"));
    }
    msg.push_str(&format!("\n\nFull logs: {}", log_path.display()));
    msg
}

fn print_result<T: Serialize>(
    json_output: bool,
    result: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", text(result));
    }
    Ok(())
}

async fn handle_daemon_command(config: &Config, command: DaemonCommands) -> Result<()> {
    match command {
        DaemonCommands::Start => {
            if is_daemon_running() {
                println!("Daemon already running");
            } else {
                ensure_daemon_running().await?;
                println!("Daemon started");
            }
        }
        DaemonCommands::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running");
            } else {
                let _: ShutdownResult = send_request(config, "shutdown", ShutdownParams {}).await?;
                println!("Daemon stopped");
            }
        }
        DaemonCommands::Restart => {
            if is_daemon_running() {
                let _: ShutdownResult = send_request(config, "shutdown", ShutdownParams {}).await?;
                for _ in 0..50 {
                    if !get_socket_path().exists() {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
            ensure_daemon_running().await?;
            println!("Daemon restarted");
        }
        DaemonCommands::Info => {
            ensure_daemon_running().await?;
            let session: DescribeSessionResult =
                send_request(config, "describe-session", DescribeSessionParams {}).await?;
            println!("{}", format_describe_session_result(&session));
        }
    }
    Ok(())
}

fn handle_config() -> Result<()> {
    let config_path = roster_config::get_config_path();
    println!("Config file: {}", config_path.display());
    println!();

    if config_path.exists() {
        println!("{}", std::fs::read_to_string(&config_path)?);
    } else {
        println!("(file does not exist, using defaults)");
    }
    Ok(())
}

async fn handle_list(
    config: &Config,
    json_output: bool,
    query: String,
    sort: Option<SortKey>,
) -> Result<()> {
    ensure_daemon_running().await?;

    let result: ListUsersResult =
        send_request(config, "list-users", ListUsersParams { query, sort }).await?;
    print_result(json_output, &result, format_list_result)
}

async fn handle_show(config: &Config, json_output: bool, id: String) -> Result<()> {
    ensure_daemon_running().await?;

    let result: ShowUserResult = send_request(
        config,
        "show-user",
        ShowUserParams {
            id: UserId::new(id),
        },
    )
    .await?;
    print_result(json_output, &result, format_show_result)?;

    if result.user.is_none() {
        std::process::exit(1);
    }
    Ok(())
}

async fn handle_add(
    config: &Config,
    json_output: bool,
    name: String,
    email: String,
    company: String,
) -> Result<()> {
    ensure_daemon_running().await?;

    let result: AddUserResult = send_request(
        config,
        "add-user",
        AddUserParams {
            name,
            email,
            company,
        },
    )
    .await?;
    print_result(json_output, &result, format_add_result)?;

    if result.user.is_none() {
        std::process::exit(1);
    }
    Ok(())
}

async fn handle_edit(
    config: &Config,
    json_output: bool,
    id: String,
    name: Option<String>,
    email: Option<String>,
    company: Option<String>,
) -> Result<()> {
    ensure_daemon_running().await?;

    let result: EditUserResult = send_request(
        config,
        "edit-user",
        EditUserParams {
            id: UserId::new(id),
            name,
            email,
            company,
        },
    )
    .await?;
    print_result(json_output, &result, format_edit_result)?;

    if result.user.is_none() {
        std::process::exit(1);
    }
    Ok(())
}

async fn handle_delete(config: &Config, json_output: bool, id: String) -> Result<()> {
    ensure_daemon_running().await?;

    let result: DeleteUserResult = send_request(
        config,
        "delete-user",
        DeleteUserParams {
            id: UserId::new(id),
        },
    )
    .await?;
    print_result(json_output, &result, format_delete_result)
}

async fn handle_reload(config: &Config, json_output: bool) -> Result<()> {
    ensure_daemon_running().await?;

    let result: ReloadUsersResult =
        send_request(config, "reload-users", ReloadUsersParams {}).await?;
    print_result(json_output, &result, format_reload_result)
}
