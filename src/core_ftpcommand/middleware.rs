use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;
use std::time::Instant;

use super::context::CommandContext;
use super::ftpcommand::FtpCommand;
use super::handlers::HandlerFuture;
use crate::core_proto::{Reply, Request};
use crate::error::ServerError;

pub type Endpoint = Arc<dyn Fn(Arc<CommandContext>, Request) -> HandlerFuture + Send + Sync>;

/// One link of the per-connection middleware chain. A middleware may answer
/// without calling `next` (short-circuit), wrap the call, or mutate session
/// state before passing through.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        req: Request,
        next: Next,
    ) -> Result<Reply, ServerError>;
}

/// Continuation into the rest of the chain, ending at the command handler.
pub struct Next {
    middlewares: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    endpoint: Endpoint,
}

impl Next {
    pub fn chain(middlewares: Arc<[Arc<dyn Middleware>]>, endpoint: Endpoint) -> Self {
        Self {
            middlewares,
            index: 0,
            endpoint,
        }
    }

    pub fn run(self, ctx: Arc<CommandContext>, req: Request) -> HandlerFuture {
        match self.middlewares.get(self.index) {
            Some(middleware) => {
                let middleware = Arc::clone(middleware);
                let next = Next {
                    middlewares: self.middlewares,
                    index: self.index + 1,
                    endpoint: self.endpoint,
                };
                Box::pin(async move { middleware.handle(ctx, req, next).await })
            }
            None => (self.endpoint)(ctx, req),
        }
    }
}

/// Logs every command with its reply code and handling time. PASS arguments
/// are never logged.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        req: Request,
        next: Next,
    ) -> Result<Reply, ServerError> {
        let shown = if req.verb == "PASS" {
            String::from("PASS ****")
        } else if req.arg.is_empty() {
            req.verb.clone()
        } else {
            format!("{} {}", req.verb, req.arg)
        };
        let started = Instant::now();
        let result = next.run(Arc::clone(&ctx), req).await;
        match &result {
            Ok(reply) => info!(
                "{} {} -> {:?} ({:?})",
                ctx.control_peer,
                shown,
                reply.code(),
                started.elapsed()
            ),
            Err(e) => debug!("{} {} -> error: {}", ctx.control_peer, shown, e),
        }
        result
    }
}

/// Rejects commands that need a login while the session has none.
pub struct AuthGateMiddleware;

#[async_trait]
impl Middleware for AuthGateMiddleware {
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        req: Request,
        next: Next,
    ) -> Result<Reply, ServerError> {
        if let Some(cmd) = FtpCommand::from_str(&req.verb) {
            if !cmd.allowed_before_login() && !ctx.session.lock().await.is_authenticated() {
                return Ok(Reply::new(530, "Please login with USER and PASS."));
            }
        }
        next.run(ctx, req).await
    }
}

/// While a transfer owns the data channel, further data-channel commands
/// fail with 425; ABOR and plain commands pass through.
pub struct TransferGateMiddleware;

#[async_trait]
impl Middleware for TransferGateMiddleware {
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        req: Request,
        next: Next,
    ) -> Result<Reply, ServerError> {
        if let Some(cmd) = FtpCommand::from_str(&req.verb) {
            if cmd.uses_data_channel() && ctx.session.lock().await.transfer_in_progress() {
                return Ok(Reply::new(425, "Transfer already in progress."));
            }
        }
        next.run(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core_auth::AnonymousProvider;
    use crate::core_pipe::DuplexPipe;
    use crate::core_proto::ReplyWriter;
    use crate::core_vfs::OsVfs;
    use crate::session::Session;
    use tokio::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    fn test_context() -> Arc<CommandContext> {
        let pipe = Arc::new(DuplexPipe::new());
        Arc::new(CommandContext::new(
            Arc::new(Config::default()),
            Arc::new(Mutex::new(Session::new())),
            Arc::new(AnonymousProvider),
            Arc::new(OsVfs::new("/tmp")),
            Arc::new(ReplyWriter::new(pipe)),
            None,
            "127.0.0.1:50000".parse().unwrap(),
            "127.0.0.1:21".parse().unwrap(),
            CancellationToken::new(),
        ))
    }

    fn noop_endpoint() -> Endpoint {
        Arc::new(|_ctx, _req| Box::pin(async { Ok(Reply::new(200, "Ok.")) }))
    }

    #[tokio::test]
    async fn auth_gate_blocks_before_login() {
        let ctx = test_context();
        let middlewares: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![
            Arc::new(AuthGateMiddleware) as Arc<dyn Middleware>,
        ]);
        let next = Next::chain(middlewares, noop_endpoint());
        let reply = next
            .run(ctx, Request::parse("RETR file"))
            .await
            .unwrap();
        assert_eq!(reply.code(), Some(530));
    }

    #[tokio::test]
    async fn auth_gate_passes_open_commands() {
        let ctx = test_context();
        let middlewares: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![
            Arc::new(AuthGateMiddleware) as Arc<dyn Middleware>,
        ]);
        let next = Next::chain(middlewares, noop_endpoint());
        let reply = next.run(ctx, Request::parse("FEAT")).await.unwrap();
        assert_eq!(reply.code(), Some(200));
    }
}
