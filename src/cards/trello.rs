//! Trello board sink.
//!
//! Cards land on a fixed list with review labels, a due date on the Prazo
//! Fatal and a standard review checklist. Label ids are resolved once at
//! startup; missing labels are created on the board.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, warn};

use crate::cards::{format, CardSink, CreatedCard};
use crate::error::CardError;
use crate::extract::ExtractedRecord;

const BASE_URL: &str = "https://api.trello.com/1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Labels every card may carry. Matching against existing board labels is
/// fuzzy because boards accumulate emoji-decorated variants over time.
const STANDARD_LABELS: &[(&str, &[&str], &str)] = &[
    ("a_revisar", &["🔴 A REVISAR", "A REVISAR"], "red"),
    ("urgente", &["⚡ URGENTE", "URGENTE"], "yellow"),
    (
        "prazo_implicito",
        &["⚠️ PRAZO IMPLÍCITO", "PRAZO IMPLÍCITO", "PRAZO IMPLICITO"],
        "orange",
    ),
];

const CHECKLIST_NAME: &str = "Ações Necessárias";
const CHECKLIST_ITEMS: &[&str] = &[
    "☐ Revisar prazo calculado",
    "☐ Conferir dados extraídos",
    "☐ Verificar texto integral",
    "☐ Preparar providências",
    "☐ Mudar para 🟢 REVISADO",
];

/// Trello API settings.
#[derive(Debug, Clone)]
pub struct TrelloConfig {
    pub api_key: String,
    pub token: SecretString,
    pub board_id: String,
    pub list_id: String,
}

#[derive(Debug, Deserialize)]
struct LabelPayload {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CardPayload {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChecklistPayload {
    id: String,
}

pub struct TrelloBoard {
    config: TrelloConfig,
    client: reqwest::Client,
    labels: HashMap<&'static str, String>,
}

impl TrelloBoard {
    pub fn new(config: TrelloConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            labels: HashMap::new(),
        }
    }

    fn auth_params(&self) -> [(&'static str, String); 2] {
        [
            ("key", self.config.api_key.clone()),
            ("token", self.config.token.expose_secret().to_string()),
        ]
    }

    /// Resolve the standard label ids, creating missing labels.
    /// Failures degrade to unlabelled cards rather than erroring.
    pub async fn setup_labels(&mut self) {
        let existing = match self.fetch_labels().await {
            Ok(labels) => labels,
            Err(e) => {
                warn!(error = %e, "Could not list board labels, cards will be unlabelled");
                return;
            }
        };

        for (key, variants, color) in STANDARD_LABELS {
            let found = existing.iter().find(|label| {
                let name = label.name.to_uppercase();
                variants.iter().any(|v| {
                    let v = v.to_uppercase();
                    name.contains(v.trim()) || v.contains(name.trim())
                })
            });
            match found {
                Some(label) => {
                    info!(label = %label.name, key, "Board label found");
                    self.labels.insert(key, label.id.clone());
                }
                None => match self.create_label(variants[0], color).await {
                    Ok(id) => {
                        info!(label = variants[0], "Board label created");
                        self.labels.insert(key, id);
                    }
                    Err(e) => warn!(label = variants[0], error = %e, "Could not create label"),
                },
            }
        }
    }

    async fn fetch_labels(&self) -> Result<Vec<LabelPayload>, CardError> {
        let url = format!("{BASE_URL}/boards/{}/labels", self.config.board_id);
        let response = self
            .client
            .get(url)
            .query(&self.auth_params())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| CardError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CardError::Request(format!(
                "label listing returned HTTP {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| CardError::Request(e.to_string()))
    }

    async fn create_label(&self, name: &str, color: &str) -> Result<String, CardError> {
        let response = self
            .client
            .post(format!("{BASE_URL}/labels"))
            .query(&self.auth_params())
            .form(&[
                ("idBoard", self.config.board_id.as_str()),
                ("name", name),
                ("color", color),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| CardError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CardError::Request(format!(
                "label creation returned HTTP {}",
                response.status()
            )));
        }
        let label: LabelPayload = response
            .json()
            .await
            .map_err(|e| CardError::Request(e.to_string()))?;
        Ok(label.id)
    }

    fn labels_for(&self, record: &ExtractedRecord) -> Vec<String> {
        let mut ids = Vec::new();
        if let Some(id) = self.labels.get("a_revisar") {
            ids.push(id.clone());
        }
        if record.is_urgent && let Some(id) = self.labels.get("urgente") {
            ids.push(id.clone());
        }
        if record.deadline_is_implicit && let Some(id) = self.labels.get("prazo_implicito") {
            ids.push(id.clone());
        }
        ids
    }

    /// Best-effort review checklist; a failure here never fails the card.
    async fn add_checklist(&self, card_id: &str) {
        let response = self
            .client
            .post(format!("{BASE_URL}/checklists"))
            .query(&self.auth_params())
            .form(&[("idCard", card_id), ("name", CHECKLIST_NAME)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await;

        let checklist: ChecklistPayload = match response {
            Ok(r) if r.status().is_success() => match r.json().await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "Checklist response unreadable");
                    return;
                }
            },
            Ok(r) => {
                warn!(status = %r.status(), "Checklist creation rejected");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Checklist creation failed");
                return;
            }
        };

        for item in CHECKLIST_ITEMS {
            let result = self
                .client
                .post(format!(
                    "{BASE_URL}/checklists/{}/checkItems",
                    checklist.id
                ))
                .query(&self.auth_params())
                .form(&[("name", *item)])
                .timeout(Duration::from_secs(5))
                .send()
                .await;
            if let Err(e) = result {
                warn!(error = %e, "Checklist item failed");
            }
        }
    }
}

#[async_trait]
impl CardSink for TrelloBoard {
    async fn create(
        &self,
        record: &ExtractedRecord,
        source_text: &str,
    ) -> Result<CreatedCard, CardError> {
        let title = format::card_title(record);
        let description = format::card_description(record, source_text);

        let mut fields: Vec<(&str, String)> = vec![
            ("idList", self.config.list_id.clone()),
            ("name", title.clone()),
            ("desc", description),
        ];
        if let Some(due) = format::card_due_stamp(record.due_date) {
            fields.push(("due", due));
        }
        let label_ids = self.labels_for(record);
        if !label_ids.is_empty() {
            fields.push(("idLabels", label_ids.join(",")));
        }

        let response = self
            .client
            .post(format!("{BASE_URL}/cards"))
            .query(&self.auth_params())
            .form(&fields)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| CardError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let head: String = detail.chars().take(200).collect();
            return Err(CardError::CreateFailed(format!("HTTP {status}: {head}")));
        }

        let card: CardPayload = response
            .json()
            .await
            .map_err(|e| CardError::Request(e.to_string()))?;

        self.add_checklist(&card.id).await;

        info!(card_id = %card.id, "Review card created");
        Ok(CreatedCard {
            id: card.id,
            url: card.url,
            title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::DeadlineUnit;
    use chrono::{NaiveDate, Utc};

    fn board_with_labels() -> TrelloBoard {
        let mut board = TrelloBoard::new(TrelloConfig {
            api_key: "k".into(),
            token: SecretString::from("t"),
            board_id: "b".into(),
            list_id: "l".into(),
        });
        board.labels.insert("a_revisar", "id-rev".into());
        board.labels.insert("urgente", "id-urg".into());
        board.labels.insert("prazo_implicito", "id-imp".into());
        board
    }

    fn record(urgent: bool, implicit: bool) -> ExtractedRecord {
        ExtractedRecord {
            process_number: None,
            client_name: None,
            act_type: "Despacho".into(),
            court: None,
            court_division: None,
            deadline_mentioned: None,
            deadline_is_implicit: implicit,
            deadline_days: 5,
            deadline_unit: DeadlineUnit::Business,
            summary_points: vec![],
            is_urgent: urgent,
            notes: None,
            confidence: 0.5,
            publication_date: NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
            due_date: None,
            processed_at: Utc::now(),
            source_provider: "test".into(),
        }
    }

    #[test]
    fn review_label_is_always_applied() {
        let board = board_with_labels();
        assert_eq!(board.labels_for(&record(false, false)), vec!["id-rev"]);
    }

    #[test]
    fn conditional_labels_follow_record_flags() {
        let board = board_with_labels();
        let ids = board.labels_for(&record(true, true));
        assert_eq!(ids, vec!["id-rev", "id-urg", "id-imp"]);
    }

    #[test]
    fn missing_labels_mean_unlabelled_cards() {
        let board = TrelloBoard::new(TrelloConfig {
            api_key: "k".into(),
            token: SecretString::from("t"),
            board_id: "b".into(),
            list_id: "l".into(),
        });
        assert!(board.labels_for(&record(true, true)).is_empty());
    }
}
