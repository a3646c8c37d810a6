// SPDX-License-Identifier: MIT

//! Authenticated RouterOS API session: connect, login, command round trips

use md5::compute as md5_compute;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::protocol::{encode_length, read_length};

/// Connection timeout (5 seconds)
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Command round-trip timeout (10 seconds)
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// One attribute sentence from a RouterOS reply
pub type Sentence = HashMap<String, String>;

/// Transport-level and protocol-level session failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("RouterOS trap: {0}")]
    Trap(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("encrypted API transport is not supported")]
    TlsUnsupported,
}

/// Everything needed to establish a session to one device
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// `host:port` of the device API endpoint
    pub addr: String,
    pub username: String,
    pub password: String,
    /// Transport flag from the device record; the encrypted API channel is
    /// carried through the data model but not implemented by this session
    pub secure: bool,
}

/// A live authenticated API session to a single device
#[derive(Debug)]
pub(super) struct RouterOsSession {
    stream: TcpStream,
    alive: bool,
}

impl RouterOsSession {
    /// Connects and authenticates
    pub(super) async fn open(params: &ConnectParams) -> Result<Self, SessionError> {
        if params.secure {
            return Err(SessionError::TlsUnsupported);
        }
        tracing::trace!("Attempting TCP connection to: {}", params.addr);
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&params.addr))
            .await
            .map_err(|_| SessionError::Timeout(CONNECT_TIMEOUT))??;
        tracing::trace!("TCP connection established to: {}", params.addr);

        let mut session = Self {
            stream,
            alive: true,
        };
        session.login(&params.username, &params.password).await?;
        Ok(session)
    }

    /// False once any command on this session has failed
    pub(super) fn is_alive(&self) -> bool {
        self.alive
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<(), SessionError> {
        tracing::trace!("Attempting login for user: {}", username);
        // Try new login method first (RouterOS 6.43+)
        let login_result = self
            .raw_command(vec![
                "/login".to_string(),
                format!("=name={}", username),
                format!("=password={}", password),
            ])
            .await;

        match login_result {
            Ok(sentences) => {
                for s in &sentences {
                    if let Some(msg) = s.get("message") {
                        if msg.contains("failure") || msg.contains("invalid") {
                            tracing::trace!("Login failed with message: {}", msg);
                            return Err(SessionError::LoginFailed(msg.clone()));
                        }
                        tracing::debug!("Login message: {}", msg);
                    }
                }
                tracing::debug!("Login successful (new method)");
                return Ok(());
            }
            Err(e @ (SessionError::Io(_) | SessionError::Timeout(_))) => return Err(e),
            Err(e) => {
                tracing::debug!("New login method failed, trying legacy method: {}", e);
            }
        }

        // Fallback to legacy challenge-response method (pre-6.43)
        let sentences = self.raw_command(vec!["/login".to_string()]).await?;
        let challenge_hex = sentences
            .iter()
            .find_map(|s| s.get("ret").cloned())
            .ok_or_else(|| SessionError::Protocol("no login challenge received".to_string()))?;
        let challenge = hex::decode(&challenge_hex)
            .map_err(|e| SessionError::Protocol(format!("bad login challenge: {e}")))?;

        // MD5 of 0x00 + password + challenge
        let mut data = Vec::with_capacity(1 + password.len() + challenge.len());
        data.push(0u8);
        data.extend_from_slice(password.as_bytes());
        data.extend_from_slice(&challenge);
        let digest = md5_compute(&data);
        let mut response = String::from("00");
        response.push_str(&hex::encode(digest.0));

        let login_sentences = self
            .raw_command(vec![
                "/login".to_string(),
                format!("=name={}", username),
                format!("=response={}", response),
            ])
            .await?;
        for s in &login_sentences {
            if let Some(msg) = s.get("message") {
                if msg.contains("failure") || msg.contains("invalid") {
                    return Err(SessionError::LoginFailed(msg.clone()));
                }
                tracing::warn!("Login message: {}", msg);
            }
        }
        tracing::debug!("Login successful (legacy method)");
        Ok(())
    }

    /// Sends one command sentence and reads the reply
    ///
    /// Any failure marks the session dead; the pool then re-establishes on
    /// the next acquire instead of handing the broken stream back out.
    pub(super) async fn command(
        &mut self,
        path: &str,
        args: &[&str],
    ) -> Result<Vec<Sentence>, SessionError> {
        let mut words: Vec<String> = Vec::with_capacity(1 + args.len());
        words.push(path.to_string());
        for a in args {
            words.push((*a).to_string());
        }
        match self.raw_command(words).await {
            Ok(sentences) => Ok(sentences),
            Err(e) => {
                self.alive = false;
                Err(e)
            }
        }
    }

    async fn raw_command(&mut self, words: Vec<String>) -> Result<Vec<Sentence>, SessionError> {
        self.send_words(&words).await?;
        self.read_sentences().await
    }

    async fn send_words(&mut self, words: &[String]) -> Result<(), SessionError> {
        for w in words {
            self.write_word(w).await?;
        }
        // zero length word terminator
        self.stream.write_all(&[0]).await?;
        Ok(())
    }

    async fn write_word(&mut self, word: &str) -> Result<(), SessionError> {
        let bytes = word.as_bytes();
        self.stream.write_all(&encode_length(bytes.len())).await?;
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    async fn read_sentences(&mut self) -> Result<Vec<Sentence>, SessionError> {
        // Bound the whole read so a dead device cannot hang the caller (and
        // with it the per-device pool slot)
        timeout(COMMAND_TIMEOUT, async {
            let mut sentences: Vec<Sentence> = Vec::new();
            let mut current: Option<Sentence> = None;
            loop {
                let word = self.read_word().await?;
                if word.is_empty() {
                    continue;
                }
                tracing::trace!("Received word: {}", word);
                if word == "!done" {
                    if let Some(s) = current.take() {
                        sentences.push(s);
                    }
                    break;
                }
                if word == "!trap" {
                    // collect trap details
                    let mut trap = Sentence::new();
                    loop {
                        let w = self.read_word().await?;
                        if w.is_empty() {
                            continue;
                        }
                        if let Some(stripped) = w.strip_prefix('=') {
                            if let Some((k, v)) = stripped.split_once('=') {
                                trap.insert(k.to_string(), v.to_string());
                            }
                            continue;
                        }
                        if w.starts_with('!') {
                            break;
                        }
                    }
                    let msg = trap
                        .get("message")
                        .cloned()
                        .unwrap_or_else(|| "trap".to_string());
                    return Err(SessionError::Trap(msg));
                }
                if word == "!re" {
                    if let Some(s) = current.take() {
                        sentences.push(s);
                    }
                    current = Some(Sentence::new());
                    continue;
                }
                if let Some(stripped) = word.strip_prefix('=') {
                    let tgt = current.get_or_insert_with(Sentence::new);
                    if let Some((k, v)) = stripped.split_once('=') {
                        tgt.insert(k.to_string(), v.to_string());
                    }
                }
                // ignore other reply headers
            }
            Ok(sentences)
        })
        .await
        .map_err(|_| SessionError::Timeout(COMMAND_TIMEOUT))?
    }

    async fn read_word(&mut self) -> Result<String, SessionError> {
        let len = read_length(&mut self.stream).await?;
        if len == 0 {
            return Ok(String::new());
        }
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_refuses_secure_transport() {
        let params = ConnectParams {
            addr: "127.0.0.1:8729".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            secure: true,
        };
        let err = RouterOsSession::open(&params).await.unwrap_err();
        assert!(matches!(err, SessionError::TlsUnsupported));
    }

    #[tokio::test]
    async fn test_open_reports_refused_connection() {
        // Grab a port that nothing is listening on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let params = ConnectParams {
            addr: addr.to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            secure: false,
        };
        let err = RouterOsSession::open(&params).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Io(_) | SessionError::Timeout(_)
        ));
    }
}
