//! Command/reply exchange over an API stream
//!
//! Commands are sent one at a time and the reply is read to its `!done`,
//! so no `.tag` bookkeeping is needed.

use crate::codec::{self, Reply, ReplyKind};
use fwdsync_core::{Error, Result};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Result of a command that finished with `!done`
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// `!re` rows in the order received
    pub rows: Vec<Reply>,
    /// The final `!done` sentence
    pub done: Reply,
}

/// A RouterOS API connection over any byte stream
pub struct ApiConnection<S> {
    stream: S,
}

impl<S> ApiConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established stream
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Log in with the plaintext credential exchange (RouterOS 6.43+)
    ///
    /// A rejected login, and a router that answers with a legacy challenge,
    /// are both connection errors.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let words = [
            "/login".to_string(),
            format!("=name={username}"),
            format!("=password={password}"),
        ];

        let output = self.command(&words).await.map_err(|e| match e {
            Error::StoreWrite(msg) => Error::store_connection(format!("login failed: {msg}")),
            other => other.into_connection("login"),
        })?;

        if output.done.get("ret").is_some() {
            return Err(Error::store_connection(
                "router requested the legacy challenge login; only plaintext login (RouterOS 6.43+) is supported",
            ));
        }

        debug!("Logged in as {}", username);
        Ok(())
    }

    /// Send a command and collect its reply
    ///
    /// # Returns
    ///
    /// - `Ok(CommandOutput)`: The command finished with `!done`
    /// - `Err(Error::StoreWrite)`: The router answered `!trap`
    /// - `Err(Error::StoreConnection)`: The router answered `!fatal`
    /// - `Err(Error::Protocol | Error::Network)`: The stream broke
    pub async fn command<W: AsRef<str>>(&mut self, words: &[W]) -> Result<CommandOutput> {
        if let Some(first) = words.first() {
            debug!("Sending {}", first.as_ref());
        }
        codec::write_sentence(&mut self.stream, words).await?;

        let mut rows = Vec::new();
        let mut trap: Option<String> = None;

        loop {
            let reply = self.read_reply().await?;
            match reply.kind {
                ReplyKind::Re => rows.push(reply),
                ReplyKind::Empty => {}
                ReplyKind::Trap => {
                    // Keep the first trap; more may follow before !done
                    if trap.is_none() {
                        trap = Some(reply.message().to_string());
                    }
                }
                ReplyKind::Fatal => {
                    return Err(Error::store_connection(format!(
                        "router closed the session: {}",
                        reply.message()
                    )));
                }
                ReplyKind::Done => {
                    return match trap {
                        Some(msg) => Err(Error::store_write(msg)),
                        None => Ok(CommandOutput { rows, done: reply }),
                    };
                }
            }
        }
    }

    /// Ask the router to end the session and shut the stream down
    pub async fn quit(&mut self) -> Result<()> {
        codec::write_sentence(&mut self.stream, &["/quit"]).await?;

        // The router answers /quit with !fatal and closes
        match self.read_reply().await {
            Ok(reply) if reply.kind == ReplyKind::Fatal => {
                debug!("Session ended: {}", reply.message());
            }
            Ok(reply) => debug!("Unexpected reply to /quit: {:?}", reply.kind),
            Err(e) => debug!("Stream closed before /quit reply: {}", e),
        }

        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown after /quit failed: {}", e);
        }
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        loop {
            let words = codec::read_sentence(&mut self.stream).await?;
            if !words.is_empty() {
                return Reply::parse(words);
            }
        }
    }
}
