//! Card title and description rendering.
//!
//! Titles lead with the case number and the Prazo Fatal so the two facts
//! a lawyer scans for survive any truncation the board applies.

use chrono::{Local, NaiveDate};

use crate::extract::ExtractedRecord;

/// Boards allow ~512 chars but long titles wrap badly in list view.
const TITLE_BUDGET: usize = 120;

/// Publication text shown on the card before truncation.
const MAX_SOURCE_CHARS: usize = 3000;

/// Hard ceiling on the whole description.
const MAX_DESCRIPTION_CHARS: usize = 15000;

const RULE: &str = "══════════════════════════════════════════════════";

fn fmt_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `PROCESSO (PF: DD/MM/YYYY) - CLIENTE - TIPO`, fitted to the budget.
///
/// The case number and due date are never truncated; client and act type
/// split the leftover space 70/30 and are dropped entirely when fewer
/// than 20 characters remain.
pub fn card_title(record: &ExtractedRecord) -> String {
    let process = record.process_number.as_deref().unwrap_or("SEM NÚMERO");
    let due = record
        .due_date
        .map(fmt_date)
        .unwrap_or_else(|| "N/D".into());
    let client = record.client_name.as_deref().unwrap_or("N/I");
    let act = if record.act_type.is_empty() {
        "ATO"
    } else {
        &record.act_type
    };

    let fixed = format!("{process} (PF: {due})");

    let remaining = TITLE_BUDGET.saturating_sub(fixed.chars().count() + 6);
    if remaining <= 20 {
        return fixed;
    }

    let client_budget = remaining * 7 / 10;
    let act_budget = remaining - client_budget;

    let client = fit(client, client_budget);
    let act = fit(act, act_budget).to_uppercase();

    format!("{fixed} - {client} - {act}")
}

fn fit(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let head: String = text.chars().take(budget.saturating_sub(2)).collect();
    format!("{head}..")
}

/// Full card description: source text, extracted summary, deadline notes
/// and review warnings.
pub fn card_description(record: &ExtractedRecord, source_text: &str) -> String {
    let confidence_label = if record.confidence >= 0.8 {
        "ALTA"
    } else if record.confidence >= 0.6 {
        "MÉDIA"
    } else {
        "BAIXA"
    };

    let source = truncate_chars(source_text, MAX_SOURCE_CHARS);
    let source_truncated = source.len() < source_text.len();

    let mut desc = format!(
        "{RULE}\n📄 TEXTO DA PUBLICAÇÃO\n{RULE}\n\n{source}\n\n"
    );
    if source_truncated {
        desc.push_str(&format!(
            "... (Texto truncado - total: {} caracteres)\n\n",
            source_text.chars().count()
        ));
    }

    desc.push_str(&format!(
        "{RULE}\n\
         🤖 RESUMO AUTOMÁTICO (CONFERIR!)\n\
         ⚠️ CONFIANÇA: {confidence_label} ({pct}%)\n\
         {RULE}\n\n\
         📌 INFORMAÇÕES EXTRAÍDAS:\n\n\
         • Processo: {process}\n\
         • Cliente: {client}\n\
         • Tipo: {act}\n\
         • Tribunal: {court}\n\
         • Vara: {division}\n\n\
         📅 PRAZO:\n",
        pct = (record.confidence * 100.0) as u32,
        process = record.process_number.as_deref().unwrap_or("N/A"),
        client = record.client_name.as_deref().unwrap_or("N/A"),
        act = record.act_type,
        court = record.court.as_deref().unwrap_or("N/A"),
        division = record.court_division.as_deref().unwrap_or("N/A"),
    ));

    if let Some(due) = record.due_date {
        desc.push_str(&format!("• Data limite: {}\n", fmt_date(due)));
    }
    if let Some(mentioned) = &record.deadline_mentioned {
        desc.push_str(&format!("• Prazo mencionado: {mentioned}\n"));
    } else if record.deadline_is_implicit {
        desc.push_str("• ⚠️ Prazo não especificado (aplicado 5 dias úteis - CPC)\n");
    }

    if !record.summary_points.is_empty() {
        desc.push_str("\n📋 DETERMINAÇÕES:\n\n");
        for point in record.summary_points.iter().take(5) {
            desc.push_str(&format!("• {}\n", truncate_chars(point, 200)));
        }
    }

    if let Some(notes) = &record.notes {
        desc.push_str(&format!(
            "\n⚠️ OBSERVAÇÕES:\n{}\n",
            truncate_chars(notes, 300)
        ));
    }

    desc.push_str(&format!("\n{RULE}\n⚠️ ATENÇÃO\n{RULE}\n"));

    if record.deadline_is_implicit {
        desc.push_str(
            "\n🔴 PRAZO NÃO ESPECIFICADO NA PUBLICAÇÃO\n\n\
             Prazo calculado: 5 dias úteis (regra geral CPC art. 231)\n\n\
             Revisar:\n\
             - Confirmar se aplica prazo geral\n\
             - Verificar caso específico\n\
             - Validar dias úteis vs corridos\n",
        );
    }
    if record.is_urgent {
        desc.push_str("\n⚡ URGENTE! Publicação contém menção a urgência.\n");
    }

    desc.push_str(&format!(
        "\n{RULE}\n\n\
         ⚠️ Resumo gerado por IA - SEMPRE conferir texto original!\n\n\
         🤖 Processado: {}\n",
        Local::now().format("%d/%m/%Y às %H:%M")
    ));

    if desc.chars().count() > MAX_DESCRIPTION_CHARS {
        let mut clipped: String = desc.chars().take(MAX_DESCRIPTION_CHARS).collect();
        clipped.push_str("\n\n... (Descrição truncada)");
        return clipped;
    }
    desc
}

/// Card due stamp, noon UTC on the Prazo Fatal.
pub fn card_due_stamp(due_date: Option<NaiveDate>) -> Option<String> {
    due_date.map(|d| format!("{}T12:00:00.000Z", d.format("%Y-%m-%d")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::DeadlineUnit;
    use chrono::Utc;

    fn record() -> ExtractedRecord {
        ExtractedRecord {
            process_number: Some("1234567-89.2024.8.26.0100".into()),
            client_name: Some("Acme Ltda".into()),
            act_type: "Intimação".into(),
            court: Some("TJSP".into()),
            court_division: Some("2ª Vara Cível".into()),
            deadline_mentioned: Some("15 dias".into()),
            deadline_is_implicit: false,
            deadline_days: 15,
            deadline_unit: DeadlineUnit::Business,
            summary_points: vec!["Manifestar sobre laudo".into()],
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
    fn title_leads_with_process_and_due_date() {
        let title = card_title(&record());
        assert!(title.starts_with("1234567-89.2024.8.26.0100 (PF: 28/06/2024)"));
        assert!(title.contains("Acme Ltda"));
        assert!(title.contains("INTIMAÇÃO"));
        assert!(title.chars().count() <= 120);
    }

    #[test]
    fn title_defaults_for_missing_fields() {
        let mut r = record();
        r.process_number = None;
        r.due_date = None;
        let title = card_title(&r);
        assert!(title.starts_with("SEM NÚMERO (PF: N/D)"));
    }

    #[test]
    fn long_client_is_truncated_not_the_process() {
        let mut r = record();
        r.client_name = Some("Empresa com Razão Social Extraordinariamente Comprida e Detalhada S/A".into());
        let title = card_title(&r);
        assert!(title.starts_with("1234567-89.2024.8.26.0100 (PF: 28/06/2024)"));
        assert!(title.chars().count() <= 120);
        assert!(title.contains(".."));
    }

    #[test]
    fn description_carries_source_and_extraction() {
        let desc = card_description(&record(), "PROCESSO Nº ... intimação da parte.");
        assert!(desc.contains("TEXTO DA PUBLICAÇÃO"));
        assert!(desc.contains("intimação da parte"));
        assert!(desc.contains("CONFIANÇA: ALTA (90%)"));
        assert!(desc.contains("Data limite: 28/06/2024"));
        assert!(desc.contains("Prazo mencionado: 15 dias"));
        assert!(desc.contains("Manifestar sobre laudo"));
    }

    #[test]
    fn implicit_deadline_gets_review_block() {
        let mut r = record();
        r.deadline_mentioned = None;
        r.deadline_is_implicit = true;
        let desc = card_description(&r, "texto");
        assert!(desc.contains("PRAZO NÃO ESPECIFICADO"));
        assert!(desc.contains("CPC art. 231"));
    }

    #[test]
    fn oversized_source_is_truncated_with_note() {
        let source = "x".repeat(5000);
        let desc = card_description(&record(), &source);
        assert!(desc.contains("Texto truncado - total: 5000"));
    }

    #[test]
    fn due_stamp_is_noon_utc() {
        let due = NaiveDate::from_ymd_opt(2024, 6, 28);
        assert_eq!(
            card_due_stamp(due).as_deref(),
            Some("2024-06-28T12:00:00.000Z")
        );
        assert_eq!(card_due_stamp(None), None);
    }
}
