//! Sales Chatbot - terminal admin client for the fashion sales assistant

mod api;
mod auth;
mod config;
mod console;
mod session;

use api::{ChatbotApi, HttpTransport, LoggingTransport};
use auth::AuthConfig;
use config::ClientConfig;
use console::{Console, Exit};
use session::SessionRuntime;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;

    // Logs go to stderr so they never interleave with the console on stdout
    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salesbot=info".into()),
        )
        .with(fmt_layer)
        .init();

    tracing::info!(api_url = %config.api_url, "Starting Sales Chatbot");

    let auth = AuthConfig::new(&config.admin_id, &config.admin_password);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();

    out.write_all(b"Sales Chatbot: Fashion Sales Assistant Portal\n").await?;

    while let Some(session) = console::prompt_login(&mut lines, &mut out, &auth).await? {
        // Fresh session state per login, like remounting the dashboard
        let http = HttpTransport::new(&config.api_url, config.timeout)?;
        tracing::debug!(
            base_url = http.base_url(),
            timeout_ms = %http.timeout().as_millis(),
            "Opening session"
        );
        let transport = LoggingTransport::new(http);
        let runtime = SessionRuntime::new(ChatbotApi::new(transport));
        let mut console = Console::new(runtime, session);

        let exit = console.run(&mut lines, &mut out).await?;
        match exit {
            Exit::Logout => {
                let user = console.into_session().logout();
                out.write_all(format!("Logged out {user}.\n").as_bytes()).await?;
                out.flush().await?;
            }
            Exit::Quit => break,
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
