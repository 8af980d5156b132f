use std::sync::Arc;

use roster_config::{get_pid_path, get_socket_path, remove_pid, write_pid};
use roster_types::*;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::handlers::{
    handle_add_user, handle_delete_user, handle_describe_session, handle_edit_user,
    handle_list_users, handle_reload_users, handle_show_user, HandlerContext,
};
use crate::session::Session;

pub struct DaemonServer {
    session: Arc<Session>,
    shutdown_tx: broadcast::Sender<()>,
}

impl DaemonServer {
    pub fn new(session: Session) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            session: Arc::new(session),
            shutdown_tx,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let socket_path = get_socket_path();
        let pid_path = get_pid_path();

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if socket_path.exists() {
            std::fs::remove_file(&socket_path)?;
        }

        let listener = UnixListener::bind(&socket_path)?;
        write_pid(&pid_path, std::process::id())?;

        info!("Daemon started, listening on {}", socket_path.display());

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let server = Arc::new(self);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let server = Arc::clone(&server);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_client(stream).await {
                                    error!("Error handling client: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down");
                    break;
                }
            }
        }

        server.shutdown();
        Ok(())
    }

    async fn handle_client(&self, mut stream: UnixStream) -> anyhow::Result<()> {
        let start = std::time::Instant::now();
        let mut data = Vec::new();
        stream.read_to_end(&mut data).await?;

        if data.is_empty() {
            return Ok(());
        }

        let request: Value = serde_json::from_slice(&data)?;
        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or(json!({}));

        let ctx = HandlerContext::new(Arc::clone(&self.session));
        let response = self.dispatch(&ctx, method, params).await;
        tracing::debug!("{} completed in {:?}", method, start.elapsed());

        stream
            .write_all(serde_json::to_vec(&response)?.as_slice())
            .await?;
        stream.shutdown().await?;

        Ok(())
    }

    async fn dispatch(&self, ctx: &HandlerContext, method: &str, params: Value) -> Value {
        macro_rules! handle {
            ($params_ty:ty, $handler:expr) => {{
                match serde_json::from_value::<$params_ty>(params) {
                    Ok(p) => match $handler(ctx, p).await {
                        Ok(result) => json!({"result": result}),
                        Err(e) => json!({"error": e}),
                    },
                    Err(e) => json!({"error": format!("Invalid params: {}", e)}),
                }
            }};
        }

        match method {
            "list-users" => handle!(ListUsersParams, handle_list_users),
            "show-user" => handle!(ShowUserParams, handle_show_user),
            "add-user" => handle!(AddUserParams, handle_add_user),
            "edit-user" => handle!(EditUserParams, handle_edit_user),
            "delete-user" => handle!(DeleteUserParams, handle_delete_user),
            "reload-users" => handle!(ReloadUsersParams, handle_reload_users),
            "describe-session" => handle!(DescribeSessionParams, handle_describe_session),
            "shutdown" => {
                let _ = self.shutdown_tx.send(());
                json!({"result": ShutdownResult { status: "shutting_down".to_string() }})
            }
            _ => json!({"error": format!("Unknown method: {}", method)}),
        }
    }

    fn shutdown(&self) {
        info!("Shutting down daemon");
        self.session.close_views();

        let socket_path = get_socket_path();
        if socket_path.exists() {
            let _ = std::fs::remove_file(&socket_path);
        }

        remove_pid(&get_pid_path());
    }
}
