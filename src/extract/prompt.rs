//! Extraction prompt for the AI backend.
//!
//! The instructions and the output contract are in Portuguese because the
//! publications are; models follow the deadline directives noticeably
//! better when prompted in the language of the source text.

use chrono::NaiveDate;

/// Build the instruction prompt for one (already truncated) publication.
pub fn build_prompt(text: &str, publication_date: NaiveDate) -> String {
    format!(
        r#"Você é um assistente especializado em análise de publicações jurídicas brasileiras.

Analise a publicação abaixo e extraia as informações em formato JSON.

PUBLICAÇÃO (publicada em {date}):
{text}

INSTRUÇÕES:
1. Extraia o número do processo (formato CNJ: 0000000-00.0000.0.00.0000)
2. Identifique o nome do cliente/parte principal (POLO ATIVO geralmente é nosso cliente)
3. Identifique o tipo de ato (intimação, citação, decisão, sentença, despacho, etc)
4. Identifique o tribunal/órgão
5. Identifique a vara/juízo
6. IMPORTANTE: Extraia o prazo em DIAS se mencionado (ex: "prazo de 15 dias", "5 dias úteis")
7. Se não houver prazo expresso, marque "prazo_implicito": true e "prazo_dias": 5
8. Crie um resumo em tópicos curtos do que foi determinado
9. Identifique se há urgência

ATENÇÃO AO PRAZO:
- Se mencionar "prazo de 15 dias" → prazo_dias: 15
- Se mencionar "prazo de 5 dias" → prazo_dias: 5
- Se não mencionar prazo → prazo_implicito: true, prazo_dias: 5
- Prazos são sempre em dias ÚTEIS, exceto se disser "dias corridos"

FORMATO DE SAÍDA (APENAS JSON, sem explicações):
{{
  "numero_processo": "0000000-00.0000.0.00.0000",
  "cliente": "Nome da Parte",
  "tipo_ato": "Tipo do Ato",
  "tribunal": "Nome do Tribunal",
  "vara": "Nome da Vara",
  "prazo_mencionado": "15 dias" ou null,
  "prazo_implicito": false,
  "prazo_dias": 15,
  "prazo_tipo": "úteis",
  "resumo_topicos": ["Tópico 1", "Tópico 2"],
  "urgente": false,
  "observacoes": "Observações importantes",
  "confianca": 0.85
}}

IMPORTANTE: Retorne APENAS o JSON, sem markdown, sem explicações.

JSON:"#,
        date = publication_date.format("%d/%m/%Y"),
    )
}
