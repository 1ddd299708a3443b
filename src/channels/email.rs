//! IMAP mail source — raw IMAP over rustls, blocking I/O behind
//! `spawn_blocking`.
//!
//! Fetches use `BODY.PEEK[]` so nothing is flagged `\Seen` as a side
//! effect; the pipeline marks messages read explicitly once every
//! publication in them was handled.

use std::io::Write as IoWrite;
use std::net::TcpStream;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mail_parser::MessageParser;
use tracing::{debug, info, warn};

use crate::channels::MailSource;
use crate::error::ChannelError;
use crate::pipeline::types::RawMessage;
use crate::text;

const READ_TIMEOUT: Duration = Duration::from_secs(30);

// ── Configuration ───────────────────────────────────────────────────

/// IMAP mailbox settings.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Mailbox folder or Gmail label holding the publication emails.
    /// Empty means INBOX.
    pub folder: String,
}

impl ImapConfig {
    /// Folder names to try, in order. Gmail exposes labels under several
    /// spellings depending on account locale, so selection walks a list
    /// and falls back to INBOX.
    fn folder_candidates(&self) -> Vec<String> {
        if self.folder.is_empty() {
            return vec!["INBOX".to_string()];
        }
        vec![
            format!("\"{}\"", self.folder),
            format!("\"[Gmail]/{}\"", self.folder),
            self.folder.clone(),
            format!("INBOX/{}", self.folder),
        ]
    }
}

// ── Mail source ─────────────────────────────────────────────────────

/// Unread-mail fetcher over raw IMAP.
pub struct ImapMailSource {
    config: ImapConfig,
}

impl ImapMailSource {
    pub fn new(config: ImapConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailSource for ImapMailSource {
    async fn fetch_unread(&self) -> Result<Vec<RawMessage>, ChannelError> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || fetch_unread_blocking(&config))
            .await
            .map_err(|e| ChannelError::FetchFailed {
                name: "imap".into(),
                reason: format!("fetch task panicked: {e}"),
            })?
    }

    async fn mark_read(&self, id: &str) -> Result<(), ChannelError> {
        let config = self.config.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || mark_read_blocking(&config, &id))
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "imap".into(),
                reason: format!("mark task panicked: {e}"),
            })?
    }
}

// ── Blocking IMAP plumbing ──────────────────────────────────────────

type TlsStream = rustls::StreamOwned<rustls::ClientConnection, TcpStream>;

fn protocol_err(reason: impl Into<String>) -> ChannelError {
    ChannelError::Protocol {
        name: "imap".into(),
        reason: reason.into(),
    }
}

fn connect(config: &ImapConfig) -> Result<TlsStream, ChannelError> {
    let tcp = TcpStream::connect((&*config.host, config.port)).map_err(|e| {
        ChannelError::ConnectFailed {
            name: "imap".into(),
            reason: format!("{}:{}: {e}", config.host, config.port),
        }
    })?;
    tcp.set_read_timeout(Some(READ_TIMEOUT))
        .map_err(|e| protocol_err(format!("set read timeout: {e}")))?;

    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = std::sync::Arc::new(
        rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth(),
    );
    let server_name = rustls_pki_types::ServerName::try_from(config.host.clone())
        .map_err(|e| protocol_err(format!("invalid server name: {e}")))?;
    let conn = rustls::ClientConnection::new(tls_config, server_name)
        .map_err(|e| protocol_err(format!("TLS setup: {e}")))?;
    let mut tls = rustls::StreamOwned::new(conn, tcp);

    let _greeting = read_line(&mut tls)?;

    let login = send_cmd(
        &mut tls,
        "A1",
        &format!("LOGIN \"{}\" \"{}\"", config.username, config.password),
    )?;
    if !login.last().is_some_and(|l| l.contains("OK")) {
        return Err(ChannelError::ConnectFailed {
            name: "imap".into(),
            reason: "IMAP login rejected".into(),
        });
    }

    Ok(tls)
}

fn read_line(tls: &mut TlsStream) -> Result<String, ChannelError> {
    let mut buf = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        match std::io::Read::read(tls, &mut byte) {
            Ok(0) => return Err(protocol_err("connection closed")),
            Ok(_) => {
                buf.push(byte[0]);
                if buf.ends_with(b"\r\n") {
                    return Ok(String::from_utf8_lossy(&buf).to_string());
                }
            }
            Err(e) => return Err(protocol_err(format!("read: {e}"))),
        }
    }
}

fn send_cmd(tls: &mut TlsStream, tag: &str, cmd: &str) -> Result<Vec<String>, ChannelError> {
    let full = format!("{tag} {cmd}\r\n");
    IoWrite::write_all(tls, full.as_bytes()).map_err(|e| protocol_err(format!("write: {e}")))?;
    IoWrite::flush(tls).map_err(|e| protocol_err(format!("flush: {e}")))?;
    let mut lines = Vec::new();
    loop {
        let line = read_line(tls)?;
        let done = line.starts_with(tag);
        lines.push(line);
        if done {
            break;
        }
    }
    Ok(lines)
}

/// Select the configured folder, walking Gmail label spellings and
/// falling back to INBOX.
fn select_folder(tls: &mut TlsStream, config: &ImapConfig) -> Result<(), ChannelError> {
    let mut tag = 2u32;
    for candidate in config.folder_candidates() {
        let resp = send_cmd(tls, &format!("A{tag}"), &format!("SELECT {candidate}"))?;
        tag += 1;
        if resp.last().is_some_and(|l| l.contains("OK")) {
            debug!(folder = %candidate, "Mailbox folder selected");
            return Ok(());
        }
    }
    warn!(
        folder = %config.folder,
        "Configured folder not selectable, falling back to INBOX"
    );
    let resp = send_cmd(tls, &format!("A{tag}"), "SELECT \"INBOX\"")?;
    if resp.last().is_some_and(|l| l.contains("OK")) {
        Ok(())
    } else {
        Err(protocol_err("could not select INBOX"))
    }
}

fn search_unseen(tls: &mut TlsStream) -> Result<Vec<String>, ChannelError> {
    let resp = send_cmd(tls, "A9", "SEARCH UNSEEN")?;
    let mut uids = Vec::new();
    for line in &resp {
        if line.starts_with("* SEARCH") {
            uids.extend(
                line.split_whitespace()
                    .skip(2)
                    .map(str::to_string),
            );
        }
    }
    Ok(uids)
}

fn fetch_unread_blocking(config: &ImapConfig) -> Result<Vec<RawMessage>, ChannelError> {
    let mut tls = connect(config)?;
    select_folder(&mut tls, config)?;

    let uids = search_unseen(&mut tls)?;
    if uids.is_empty() {
        return Ok(Vec::new());
    }
    info!(count = uids.len(), "Unread emails found");

    let mut messages = Vec::new();
    let mut tag = 10u32;

    for uid in &uids {
        // PEEK keeps the message unread until the pipeline says otherwise.
        let resp = send_cmd(&mut tls, &format!("A{tag}"), &format!("FETCH {uid} BODY.PEEK[]"))?;
        tag += 1;

        let raw: String = resp
            .iter()
            .skip(1)
            .take(resp.len().saturating_sub(2))
            .cloned()
            .collect();

        match parse_message(uid, raw.as_bytes()) {
            Some(msg) => messages.push(msg),
            None => warn!(uid = %uid, "Unparseable email skipped"),
        }
    }

    let _ = send_cmd(&mut tls, &format!("A{tag}"), "LOGOUT");
    Ok(messages)
}

fn mark_read_blocking(config: &ImapConfig, id: &str) -> Result<(), ChannelError> {
    let mut tls = connect(config)?;
    select_folder(&mut tls, config)?;
    let resp = send_cmd(&mut tls, "A9", &format!("STORE {id} +FLAGS (\\Seen)"))?;
    let _ = send_cmd(&mut tls, "A10", "LOGOUT");
    if resp.last().is_some_and(|l| l.contains("OK")) {
        Ok(())
    } else {
        Err(ChannelError::SendFailed {
            name: "imap".into(),
            reason: format!("STORE rejected for {id}"),
        })
    }
}

// ── Message extraction ──────────────────────────────────────────────

fn parse_message(uid: &str, raw: &[u8]) -> Option<RawMessage> {
    let parsed = MessageParser::default().parse(raw)?;

    let sender = parsed
        .from()
        .and_then(|addr| addr.first())
        .and_then(|a| a.address())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".into());

    let subject = parsed.subject().unwrap_or("(no subject)").to_string();

    let date = parsed
        .date()
        .and_then(|d| {
            chrono::NaiveDate::from_ymd_opt(
                i32::from(d.year),
                u32::from(d.month),
                u32::from(d.day),
            )
            .and_then(|date| {
                date.and_hms_opt(u32::from(d.hour), u32::from(d.minute), u32::from(d.second))
            })
            .map(|naive| naive.and_utc())
        })
        .unwrap_or_else(Utc::now);

    Some(RawMessage {
        id: uid.to_string(),
        subject,
        sender,
        date,
        body: extract_body(&parsed),
    })
}

/// Plain text preferred; HTML bodies are reduced to text.
fn extract_body(parsed: &mail_parser::Message) -> String {
    if let Some(body) = parsed.body_text(0) {
        let tidy = text::tidy_whitespace(&body);
        if !tidy.is_empty() {
            return tidy;
        }
    }
    if let Some(html) = parsed.body_html(0) {
        return text::clean_html(&html);
    }
    String::new()
}
