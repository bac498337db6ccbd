//! Line-oriented terminal front end
//!
//! Admin dashboard for the terminal: a login prompt, then a command
//! loop over one [`SessionRuntime`]. Plain text is sent to the active
//! conversation; commands start with `/`.

use crate::api::{Conversation, MessageRole, Transport};
use crate::auth::{AuthConfig, AuthSession};
use crate::session::{Event, Notice, NoticeLevel, SessionRuntime, SessionState};
use std::io;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::broadcast;

const SALES_PREVIEW: usize = 5;
const PREVIEW_CHARS: usize = 50;

const HELP: &str = "\
Commands:
  /new              start a new conversation
  /list             list conversations (* marks the open one)
  /open <n|id>      open a conversation
  /delete <n|id>    delete a conversation
  /reload           refresh the open conversation from the backend
  /refresh          re-check the backend and reload all conversations
  /sales            show raw sales data
  /status           connection and session status
  /logout           log out
  /quit             exit
Anything else is sent to the open conversation. An empty line resends a
message that failed to send.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    List,
    Open(String),
    Delete(String),
    Reload,
    Refresh,
    Sales,
    Status,
    Help,
    Logout,
    Quit,
    Say(String),
    Unknown(String),
}

impl Command {
    /// `None` for a blank line
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::Say(line.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        Some(match name {
            "new" => Command::New,
            "list" | "chats" => Command::List,
            "open" if !arg.is_empty() => Command::Open(arg.to_string()),
            "delete" | "rm" if !arg.is_empty() => Command::Delete(arg.to_string()),
            "reload" => Command::Reload,
            "refresh" => Command::Refresh,
            "sales" => Command::Sales,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "logout" => Command::Logout,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        })
    }
}

/// Why the command loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Logout,
    Quit,
}

/// Resolve a 1-based list position or a conversation id
pub fn resolve_target(state: &SessionState, arg: &str) -> Option<String> {
    if let Ok(n) = arg.parse::<usize>() {
        if let Some(conv) = n.checked_sub(1).and_then(|i| state.conversations().nth(i)) {
            return Some(conv.id.clone());
        }
    }
    state.is_cached(arg).then(|| arg.to_string())
}

pub fn render_list(state: &SessionState) -> String {
    if state.conversations.is_empty() {
        return "No conversations yet. Use /new to start one.".to_string();
    }
    state
        .conversations()
        .enumerate()
        .map(|(i, conv)| {
            let marker = if state.active_id.as_deref() == Some(conv.id.as_str()) {
                '*'
            } else {
                ' '
            };
            let mut line = format!(
                "{marker} {}. {} ({} messages) [{}]",
                i + 1,
                conv.title,
                conv.messages.len(),
                conv.id
            );
            if let Some(last) = conv.last_message() {
                let preview: String = last.content.chars().take(PREVIEW_CHARS).collect();
                line.push_str(&format!("\n      {}: {preview}", last.role.as_str()));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_conversation(conv: &Conversation) -> String {
    let mut out = format!("== {} ==", conv.title);
    if conv.messages.is_empty() {
        out.push_str("\nNo messages yet. Ask about sales data, inventory or trends.");
    }
    for message in &conv.messages {
        out.push('\n');
        out.push_str(&format!("{}> {}", message.role.as_str(), message.content));
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}: {}", notice.title, notice.detail)
}

pub fn render_status(state: &SessionState, session: &AuthSession) -> String {
    let backend = if state.checking_connection {
        "checking"
    } else if state.backend_reachable {
        "connected"
    } else {
        "unreachable"
    };
    let active = state
        .active_conversation()
        .map_or_else(|| "none".to_string(), |c| format!("{} [{}]", c.title, c.id));
    format!(
        "user: {} (since {})\nbackend: {backend}\nconversations: {}\nopen: {active}",
        session.user_id(),
        session.started_at().format("%H:%M:%S"),
        state.conversations.len()
    )
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

async fn write_prompt<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}

/// Ask for credentials until they check out. `None` on end of input.
pub async fn prompt_login<R, W>(
    lines: &mut Lines<R>,
    out: &mut W,
    auth: &AuthConfig,
) -> io::Result<Option<AuthSession>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        write_prompt(out, "Admin ID: ").await?;
        let Some(id) = lines.next_line().await? else {
            return Ok(None);
        };
        write_prompt(out, "Password: ").await?;
        let Some(password) = lines.next_line().await? else {
            return Ok(None);
        };

        match auth.login(&id, &password) {
            Ok(session) => {
                write_line(out, "Welcome back! Successfully logged into Sales Chatbot").await?;
                return Ok(Some(session));
            }
            Err(e) => write_line(out, &e.to_string()).await?,
        }
    }
}

pub struct Console<T> {
    runtime: SessionRuntime<T>,
    session: AuthSession,
    notices: broadcast::Receiver<Notice>,
}

impl<T: Transport> Console<T> {
    pub fn new(runtime: SessionRuntime<T>, session: AuthSession) -> Self {
        let notices = runtime.subscribe();
        Self {
            runtime,
            session,
            notices,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.runtime.state()
    }

    pub fn into_session(self) -> AuthSession {
        self.session
    }

    pub async fn run<R, W>(&mut self, lines: &mut Lines<R>, out: &mut W) -> io::Result<Exit>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        write_line(out, "Connecting to backend...").await?;
        self.runtime.dispatch(Event::Startup).await;
        self.flush_notices(out).await?;
        if self.state().backend_reachable {
            write_line(out, &render_list(self.state())).await?;
        } else {
            write_line(
                out,
                "Backend server not connected. Use /refresh once it is running.",
            )
            .await?;
        }

        loop {
            let prompt = match self.state().active_conversation() {
                Some(conv) => format!("[{}]> ", conv.title),
                None => "> ".to_string(),
            };
            write_prompt(out, &prompt).await?;

            let Some(line) = lines.next_line().await? else {
                return Ok(Exit::Quit);
            };
            match Command::parse(&line) {
                None => {
                    if !self.state().pending_input.is_empty() {
                        self.submit(out).await?;
                    }
                }
                Some(command) => {
                    if let Some(exit) = self.execute(command, out).await? {
                        return Ok(exit);
                    }
                }
            }
        }
    }

    async fn execute<W: AsyncWrite + Unpin>(
        &mut self,
        command: Command,
        out: &mut W,
    ) -> io::Result<Option<Exit>> {
        match command {
            Command::New => {
                let before = self.state().active_id.clone();
                self.runtime.dispatch(Event::CreateRequested).await;
                self.flush_notices(out).await?;
                if self.state().active_id != before {
                    if let Some(conv) = self.state().active_conversation() {
                        write_line(out, &render_conversation(conv)).await?;
                    }
                }
            }
            Command::List => write_line(out, &render_list(self.state())).await?,
            Command::Open(arg) => match resolve_target(self.state(), &arg) {
                Some(conversation_id) => {
                    self.runtime.dispatch(Event::Select { conversation_id }).await;
                    if let Some(conv) = self.state().active_conversation() {
                        write_line(out, &render_conversation(conv)).await?;
                    }
                }
                None => write_line(out, &format!("No such conversation: {arg}")).await?,
            },
            Command::Delete(arg) => match resolve_target(self.state(), &arg) {
                Some(conversation_id) => {
                    self.runtime
                        .dispatch(Event::DeleteRequested { conversation_id })
                        .await;
                    self.flush_notices(out).await?;
                }
                None => write_line(out, &format!("No such conversation: {arg}")).await?,
            },
            Command::Reload => match self.state().active_id.clone() {
                Some(conversation_id) => {
                    self.runtime
                        .dispatch(Event::ReloadRequested { conversation_id })
                        .await;
                    self.flush_notices(out).await?;
                    if let Some(conv) = self.state().active_conversation() {
                        write_line(out, &render_conversation(conv)).await?;
                    }
                }
                None => write_line(out, "No conversation open.").await?,
            },
            Command::Refresh => {
                self.runtime.dispatch(Event::Refresh).await;
                self.flush_notices(out).await?;
                write_line(out, &render_status(self.state(), &self.session)).await?;
            }
            Command::Sales => self.show_sales(out).await?,
            Command::Status => {
                write_line(out, &render_status(self.state(), &self.session)).await?;
            }
            Command::Help => write_line(out, HELP).await?,
            Command::Logout => return Ok(Some(Exit::Logout)),
            Command::Quit => return Ok(Some(Exit::Quit)),
            Command::Say(text) => {
                self.runtime.dispatch(Event::InputChanged { text }).await;
                self.submit(out).await?;
            }
            Command::Unknown(line) => {
                write_line(out, &format!("Unknown command: {line} (try /help)")).await?;
            }
        }
        Ok(None)
    }

    /// Send whatever is in the input buffer to the open conversation
    async fn submit<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> io::Result<()> {
        let state = self.state();
        if state.active_conversation().is_none() {
            return write_line(out, "Open or create a conversation first (/new, /open <n>).").await;
        }
        if !state.backend_reachable {
            return write_line(
                out,
                "Backend not connected; your message is kept. Use /refresh to reconnect.",
            )
            .await;
        }
        let seen = state.active_conversation().map_or(0, |c| c.messages.len());

        write_line(out, "Analyzing sales data...").await?;
        self.runtime.dispatch(Event::SubmitInput).await;
        self.flush_notices(out).await?;

        let state = self.state();
        if !state.pending_input.is_empty() {
            return write_line(
                out,
                "Message not sent. Press Enter to retry, or type a new message.",
            )
            .await;
        }
        if let Some(conv) = state.active_conversation() {
            for message in conv.messages.iter().skip(seen) {
                if message.role == MessageRole::Assistant {
                    write_line(out, &format!("assistant> {}", message.content)).await?;
                }
            }
        }
        Ok(())
    }

    async fn show_sales<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> io::Result<()> {
        if !self.state().backend_reachable {
            return write_line(out, "Backend not connected.").await;
        }
        match self.runtime.api().sales_data().await {
            Ok(records) => {
                write_line(out, &format!("{} sales records", records.len())).await?;
                for record in records.iter().take(SALES_PREVIEW) {
                    write_line(out, &record.to_string()).await?;
                }
                if records.len() > SALES_PREVIEW {
                    write_line(out, &format!("... {} more", records.len() - SALES_PREVIEW)).await?;
                }
                Ok(())
            }
            Err(e) => write_line(out, &render_notice(&Notice::error("Error", e.message))).await,
        }
    }

    async fn flush_notices<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> io::Result<()> {
        loop {
            match self.notices.try_recv() {
                Ok(notice) => write_line(out, &render_notice(&notice)).await?,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Dropped notices");
                }
                Err(_) => return Ok(()),
            }
        }
    }
}
