//! Telegram notifier — HTML-formatted alerts about processed publications.
//!
//! Every send is best-effort: a misconfigured or unreachable bot logs a
//! warning and the batch keeps going.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::channels::Notifier;
use crate::extract::ExtractedRecord;
use crate::pipeline::types::BatchCounters;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram bot settings. Empty token or chat id disables the notifier.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub chat_id: String,
}

pub struct TelegramNotifier {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn enabled(&self) -> bool {
        !self.config.bot_token.expose_secret().is_empty() && !self.config.chat_id.is_empty()
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.config.bot_token.expose_secret()
        )
    }

    /// Startup reachability probe: `(ok, diagnostic message)`.
    pub async fn test_connection(&self) -> (bool, String) {
        if !self.enabled() {
            return (false, "Telegram not configured".into());
        }
        let response = self
            .client
            .get(self.api_url("getMe"))
            .timeout(SEND_TIMEOUT)
            .send()
            .await;
        match response {
            Ok(r) if r.status().is_success() => {
                let username = r
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| {
                        v.pointer("/result/username")
                            .and_then(|u| u.as_str())
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| "unknown".into());
                (true, format!("Telegram connected, bot: @{username}"))
            }
            Ok(r) => (false, format!("Telegram returned HTTP {}", r.status())),
            Err(e) => (false, format!("Could not reach Telegram: {e}")),
        }
    }

    async fn send(&self, text: String) {
        if !self.enabled() {
            debug!("Telegram not configured, notification dropped");
            return;
        }
        let result = self
            .client
            .post(self.api_url("sendMessage"))
            .timeout(SEND_TIMEOUT)
            .form(&[
                ("chat_id", self.config.chat_id.as_str()),
                ("text", &text),
                ("parse_mode", "HTML"),
                ("disable_web_page_preview", "true"),
            ])
            .send()
            .await;
        match result {
            Ok(r) if r.status().is_success() => {}
            Ok(r) => warn!(status = %r.status(), "Telegram rejected notification"),
            Err(e) => warn!(error = %e, "Telegram notification failed"),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn publication_processed(&self, record: &ExtractedRecord, card_url: &str) {
        self.send(format_processed(record, card_url)).await;
        info!("Publication notification sent");
    }

    async fn batch_summary(&self, counters: &BatchCounters) {
        self.send(format_summary(counters)).await;
    }

    async fn fatal_error(&self, message: &str) {
        let head: String = message.chars().take(500).collect();
        let when = Local::now().format("%d/%m/%Y %H:%M");
        self.send(format!(
            "🚨 <b>ERRO NO BOT DE PUBLICAÇÕES</b>\n\n\
             ❌ <b>Erro:</b> {head}\n\n\
             ⏰ <b>Horário:</b> {when}\n\n\
             <i>Verifique os logs para mais detalhes.</i>"
        ))
        .await;
    }
}

// ── Message formatting ──────────────────────────────────────────────

fn format_processed(record: &ExtractedRecord, card_url: &str) -> String {
    let process = record.process_number.as_deref().unwrap_or("Não identificado");
    let mut client = record
        .client_name
        .clone()
        .unwrap_or_else(|| "Não identificado".into());
    if client.chars().count() > 45 {
        client = client.chars().take(45).collect::<String>() + "...";
    }
    let court = record.court.as_deref().unwrap_or("");
    let due = record
        .due_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "Não calculado".into());

    let mut warnings = String::new();
    if record.is_urgent {
        warnings.push_str("\n⚡ <b>URGENTE!</b>");
    }
    if record.deadline_is_implicit {
        warnings.push_str("\n\n⚠️ <b>Prazo implícito (revisar!)</b>");
    }

    format!(
        "🤖 <b>Nova Publicação Processada!</b>\n\
         ━━━━━━━━━━━━━━━━━━━━━━\n\
         📋 <b>Processo:</b> {process}\n\
         👤 <b>Cliente:</b> {client}\n\
         🏷️ <b>Tipo:</b> {tipo}\n\
         🏛️ <b>Tribunal:</b> {court}\n\
         📅 <b>Prazo:</b> {due}{warnings}\n\
         ━━━━━━━━━━━━━━━━━━━━━━\n\
         🔗 <a href=\"{card_url}\">Ver card no Trello</a>",
        tipo = record.act_type,
    )
}

fn format_summary(counters: &BatchCounters) -> String {
    let now = Local::now();
    let header = format!(
        "📊 <b>RESUMO - {} {}</b>",
        now.format("%d/%m/%Y"),
        now.format("%H:%M")
    );

    let total = counters.total();
    if total == 0 {
        return format!("{header}\n\n📭 Nenhuma publicação nova encontrada.");
    }

    let rate = counters.created as f64 / total as f64 * 100.0;
    let skipped = if counters.skipped_special_list > 0 {
        format!(
            "\n⏭️ <b>Ignorados (lista especial):</b> {}",
            counters.skipped_special_list
        )
    } else {
        String::new()
    };

    format!(
        "{header}\n\n\
         📬 <b>Total processado:</b> {total} publicação(ões)\n\
         ✅ <b>Cards criados:</b> {created}{skipped}\n\
         ❌ <b>Falhas:</b> {failed}\n\
         📈 <b>Taxa de sucesso:</b> {rate:.0}%",
        created = counters.created,
        failed = counters.failed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::DeadlineUnit;
    use chrono::{NaiveDate, Utc};

    fn record() -> ExtractedRecord {
        ExtractedRecord {
            process_number: Some("1234567-89.2024.8.26.0100".into()),
            client_name: Some("Acme Ltda".into()),
            act_type: "Intimação".into(),
            court: Some("TJSP".into()),
            court_division: None,
            deadline_mentioned: Some("15 dias".into()),
            deadline_is_implicit: false,
            deadline_days: 15,
            deadline_unit: DeadlineUnit::Business,
            summary_points: vec![],
            is_urgent: false,
            notes: None,
            confidence: 0.9,
            publication_date: NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 28),
            processed_at: Utc::now(),
            source_provider: "test".into(),
        }
    }

    #[test]
    fn processed_message_carries_core_fields() {
        let text = format_processed(&record(), "https://trello.com/c/abc");
        assert!(text.contains("1234567-89.2024.8.26.0100"));
        assert!(text.contains("Acme Ltda"));
        assert!(text.contains("28/06/2024"));
        assert!(text.contains("https://trello.com/c/abc"));
        assert!(!text.contains("URGENTE"));
    }

    #[test]
    fn implicit_and_urgent_flags_add_warnings() {
        let mut r = record();
        r.is_urgent = true;
        r.deadline_is_implicit = true;
        let text = format_processed(&r, "url");
        assert!(text.contains("URGENTE"));
        assert!(text.contains("Prazo implícito"));
    }

    #[test]
    fn long_client_name_is_truncated() {
        let mut r = record();
        r.client_name = Some("A".repeat(80));
        let text = format_processed(&r, "url");
        assert!(text.contains(&("A".repeat(45) + "...")));
    }

    #[test]
    fn empty_batch_summary() {
        let text = format_summary(&BatchCounters::default());
        assert!(text.contains("Nenhuma publicação nova"));
    }

    #[test]
    fn summary_reports_counters_and_rate() {
        let counters = BatchCounters {
            created: 3,
            skipped_special_list: 1,
            failed: 0,
        };
        let text = format_summary(&counters);
        assert!(text.contains("Total processado:</b> 4"));
        assert!(text.contains("Cards criados:</b> 3"));
        assert!(text.contains("lista especial):</b> 1"));
        assert!(text.contains("75%"));
    }
}
