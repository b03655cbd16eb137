use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::{Filter, Reply};

use crate::events::EventBus;
use crate::handlers;
use crate::lobby::{Lobby, LobbyConfig};
use crate::store::TableStore;

/// How often abandoned tables are swept.
const STALE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn for_tests() -> Self {
        Self::new("127.0.0.1", 0)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[derive(Clone)]
pub struct AppContext {
    config: ServerConfig,
    event_bus: EventBus,
    lobby: Arc<Lobby>,
    store: Arc<TableStore>,
}

impl AppContext {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_lobby_config(config, LobbyConfig::default())
    }

    pub fn with_lobby_config(config: ServerConfig, lobby_config: LobbyConfig) -> Self {
        let event_bus = EventBus::new();
        let store = Arc::new(TableStore::new());
        let lobby = Arc::new(Lobby::new(
            event_bus.clone(),
            Arc::clone(&store),
            lobby_config,
        ));
        Self {
            config,
            event_bus,
            lobby,
            store,
        }
    }

    pub fn new_for_tests() -> Self {
        Self::new(ServerConfig::for_tests())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn lobby(&self) -> Arc<Lobby> {
        Arc::clone(&self.lobby)
    }

    pub fn store(&self) -> Arc<TableStore> {
        Arc::clone(&self.store)
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            context: AppContext::new(config),
        }
    }

    pub fn from_context(context: AppContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let WebServer { context } = self;
        let bind_addr = Self::bind_addr(context.config())?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let routes = Self::routes(&context);
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        let (addr, server_future) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, shutdown_signal)
            .map_err(Self::map_warp_error)?;

        info!("cardroom server listening on http://{}", addr);

        let sweeper = Self::spawn_stale_sweeper(context.lobby());
        let task = tokio::spawn(async move {
            server_future.await;
            sweeper.abort();
            Ok(())
        });

        Ok(ServerHandle::new(addr, shutdown_tx, task, context))
    }

    fn spawn_stale_sweeper(lobby: Arc<Lobby>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(STALE_SWEEP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let reclaimed = lobby.reclaim_stale().await;
                if reclaimed > 0 {
                    info!(reclaimed, "reclaimed stale tables");
                }
            }
        })
    }

    fn bind_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
        let host = config.host();

        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }
        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, config.port()));
        }

        let candidate = format!("{}:{}", host, config.port());
        let mut addrs = candidate.to_socket_addrs().map_err(|err| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`: {err}"))
        })?;
        addrs.next().ok_or_else(|| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`"))
        })
    }

    fn map_warp_error(err: warp::Error) -> ServerError {
        use std::error::Error as StdError;

        if let Some(source) = err.source() {
            if let Some(io_err) = source.downcast_ref::<std::io::Error>() {
                let recreated = std::io::Error::new(io_err.kind(), io_err.to_string());
                return ServerError::BindError(recreated);
            }
        }
        ServerError::ConfigError(err.to_string())
    }

    pub fn routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let health = warp::path("health")
            .and(warp::get())
            .and(warp::path::end())
            .map(|| handlers::health::health().into_response())
            .boxed();

        health.or(Self::api_routes(context)).unify().boxed()
    }

    fn api_routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let lobby = context.lobby();

        let create = warp::path!("api" / "tables")
            .and(warp::post())
            .and(Self::with_lobby(lobby.clone()))
            .and(warp::body::json())
            .and_then(
                |lobby: Arc<Lobby>, request: handlers::CreateTableRequest| async move {
                    Ok::<_, Infallible>(handlers::tables::create_table(lobby, request).await)
                },
            );

        let list = warp::path!("api" / "tables")
            .and(warp::get())
            .and(Self::with_lobby(lobby.clone()))
            .and_then(|lobby: Arc<Lobby>| async move {
                Ok::<_, Infallible>(handlers::tables::list_tables(lobby).await)
            });

        let view = warp::path!("api" / "tables" / String)
            .and(warp::get())
            .and(Self::with_lobby(lobby.clone()))
            .and(warp::query::<handlers::ViewQuery>())
            .and_then(
                |id: String, lobby: Arc<Lobby>, query: handlers::ViewQuery| async move {
                    Ok::<_, Infallible>(handlers::tables::get_table(lobby, id, query).await)
                },
            );

        let join = warp::path!("api" / "tables" / String / "join")
            .and(warp::post())
            .and(Self::with_lobby(lobby.clone()))
            .and(warp::body::json())
            .and_then(
                |id: String, lobby: Arc<Lobby>, request: handlers::JoinRequest| async move {
                    Ok::<_, Infallible>(handlers::tables::join_table(lobby, id, request).await)
                },
            );

        let leave = warp::path!("api" / "tables" / String / "leave")
            .and(warp::post())
            .and(Self::with_lobby(lobby.clone()))
            .and(warp::body::json())
            .and_then(
                |id: String, lobby: Arc<Lobby>, request: handlers::PlayerRequest| async move {
                    Ok::<_, Infallible>(handlers::tables::leave_table(lobby, id, request).await)
                },
            );

        let add_bot = warp::path!("api" / "tables" / String / "bots")
            .and(warp::post())
            .and(Self::with_lobby(lobby.clone()))
            .and_then(|id: String, lobby: Arc<Lobby>| async move {
                Ok::<_, Infallible>(handlers::tables::add_bot(lobby, id).await)
            });

        let remove_bot = warp::path!("api" / "tables" / String / "bots" / String)
            .and(warp::delete())
            .and(Self::with_lobby(lobby.clone()))
            .and_then(|id: String, bot_id: String, lobby: Arc<Lobby>| async move {
                Ok::<_, Infallible>(handlers::tables::remove_bot(lobby, id, bot_id).await)
            });

        let start = warp::path!("api" / "tables" / String / "start")
            .and(warp::post())
            .and(Self::with_lobby(lobby.clone()))
            .and(warp::body::json())
            .and_then(
                |id: String, lobby: Arc<Lobby>, request: handlers::PlayerRequest| async move {
                    Ok::<_, Infallible>(handlers::tables::start_hand(lobby, id, request).await)
                },
            );

        let actions = warp::path!("api" / "tables" / String / "actions")
            .and(warp::post())
            .and(Self::with_lobby(lobby.clone()))
            .and(warp::body::json())
            .and_then(
                |id: String, lobby: Arc<Lobby>, request: handlers::ActionRequest| async move {
                    Ok::<_, Infallible>(handlers::tables::submit_action(lobby, id, request).await)
                },
            );

        let events = warp::path!("api" / "tables" / String / "events")
            .and(warp::get())
            .and(Self::with_lobby(lobby))
            .and_then(|id: String, lobby: Arc<Lobby>| async move {
                Ok::<_, Infallible>(handlers::sse::stream_events(lobby, id).await)
            });

        create
            .or(list)
            .unify()
            .or(join)
            .unify()
            .or(leave)
            .unify()
            .or(add_bot)
            .unify()
            .or(remove_bot)
            .unify()
            .or(start)
            .unify()
            .or(actions)
            .unify()
            .or(events)
            .unify()
            .or(view)
            .unify()
            .boxed()
    }

    fn with_lobby(
        lobby: Arc<Lobby>,
    ) -> impl Filter<Extract = (Arc<Lobby>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&lobby))
    }
}

pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    context: AppContext,
}

impl ServerHandle {
    fn new(
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<Result<(), ServerError>>,
        context: AppContext,
    ) -> Self {
        Self {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
            context,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(err) => {
                    return Err(ServerError::ConfigError(format!(
                        "server task join error: {err}"
                    )))
                }
            }
        }
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
