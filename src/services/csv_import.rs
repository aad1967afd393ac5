//! CSV lead import/export
//!
//! Imports a simple tabular format with a header row. Header names are
//! locale-tolerant: the product ships to Spanish-speaking markets, so
//! "nombre" maps to the name column the same way "name" does. Unknown
//! columns are ignored. Rows that fail validation are reported per line and
//! do not abort the rest of the file.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use validator::Validate;

use crate::models::{CreateLeadRequest, Lead, Market, PipelineStage};

/// Logical lead columns recognized in an import file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Name,
    Email,
    Phone,
    Stage,
    Market,
    Segment,
    BudgetMin,
    BudgetMax,
    Currency,
}

/// Header synonym table. Keys are normalized (lowercase, accents stripped).
static HEADER_SYNONYMS: Lazy<HashMap<&'static str, Column>> = Lazy::new(|| {
    HashMap::from([
        ("name", Column::Name),
        ("full name", Column::Name),
        ("full_name", Column::Name),
        ("nombre", Column::Name),
        ("nombre completo", Column::Name),
        ("email", Column::Email),
        ("e-mail", Column::Email),
        ("correo", Column::Email),
        ("correo electronico", Column::Email),
        ("phone", Column::Phone),
        ("tel", Column::Phone),
        ("telefono", Column::Phone),
        ("stage", Column::Stage),
        ("status", Column::Stage),
        ("etapa", Column::Stage),
        ("estado", Column::Stage),
        ("market", Column::Market),
        ("mercado", Column::Market),
        ("segment", Column::Segment),
        ("segmento", Column::Segment),
        ("budget min", Column::BudgetMin),
        ("budget_min", Column::BudgetMin),
        ("presupuesto min", Column::BudgetMin),
        ("presupuesto_min", Column::BudgetMin),
        ("budget max", Column::BudgetMax),
        ("budget_max", Column::BudgetMax),
        ("presupuesto max", Column::BudgetMax),
        ("presupuesto_max", Column::BudgetMax),
        ("currency", Column::Currency),
        ("moneda", Column::Currency),
    ])
});

/// Normalize a header cell for synonym lookup
fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            _ => c,
        })
        .collect()
}

fn parse_market(raw: &str) -> Option<Market> {
    match normalize_header(raw).as_str() {
        "national" | "nacional" => Some(Market::National),
        "international" | "internacional" => Some(Market::International),
        _ => None,
    }
}

/// A row that could not be imported
#[derive(Debug, Clone, Serialize)]
pub struct CsvRowError {
    /// 1-based line number in the source file (header is line 1)
    pub line: usize,
    pub message: String,
}

/// Outcome of parsing an import file
#[derive(Debug, Default)]
pub struct CsvImportReport {
    pub rows: Vec<CreateLeadRequest>,
    pub errors: Vec<CsvRowError>,
}

/// Parse an import file into lead-creation requests.
///
/// The header row is required. A file whose header contains no recognizable
/// name column is rejected outright; anything else is processed row by row
/// with per-row error collection.
pub fn parse_leads_csv(data: &[u8]) -> Result<CsvImportReport, CsvRowError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers().map_err(|e| CsvRowError {
        line: 1,
        message: format!("unreadable header row: {}", e),
    })?;

    let mut columns: HashMap<Column, usize> = HashMap::new();
    for (idx, raw) in headers.iter().enumerate() {
        if let Some(column) = HEADER_SYNONYMS.get(normalize_header(raw).as_str()) {
            // First occurrence wins when a file repeats a column
            columns.entry(*column).or_insert(idx);
        }
    }

    if !columns.contains_key(&Column::Name) {
        return Err(CsvRowError {
            line: 1,
            message: "no name column found in header".to_string(),
        });
    }

    let field = |record: &csv::StringRecord, column: Column| -> Option<String> {
        columns
            .get(&column)
            .and_then(|idx| record.get(*idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut report = CsvImportReport::default();

    for (row_idx, record) in reader.records().enumerate() {
        // Header occupies line 1
        let line = row_idx + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report.errors.push(CsvRowError {
                    line,
                    message: format!("unreadable row: {}", e),
                });
                continue;
            }
        };

        let Some(name) = field(&record, Column::Name) else {
            report.errors.push(CsvRowError {
                line,
                message: "missing name".to_string(),
            });
            continue;
        };

        let stage = match field(&record, Column::Stage) {
            Some(raw) => match PipelineStage::parse(raw.to_lowercase().as_str()) {
                Some(stage) => Some(stage),
                None => {
                    report.errors.push(CsvRowError {
                        line,
                        message: format!("unknown stage: {}", raw),
                    });
                    continue;
                }
            },
            None => None,
        };

        let market = match field(&record, Column::Market) {
            Some(raw) => match parse_market(&raw) {
                Some(market) => market,
                None => {
                    report.errors.push(CsvRowError {
                        line,
                        message: format!("unknown market: {}", raw),
                    });
                    continue;
                }
            },
            None => Market::National,
        };

        let budget_min_cents = match parse_amount(field(&record, Column::BudgetMin)) {
            Ok(v) => v,
            Err(message) => {
                report.errors.push(CsvRowError { line, message });
                continue;
            }
        };
        let budget_max_cents = match parse_amount(field(&record, Column::BudgetMax)) {
            Ok(v) => v,
            Err(message) => {
                report.errors.push(CsvRowError { line, message });
                continue;
            }
        };

        let request = CreateLeadRequest {
            name,
            email: field(&record, Column::Email),
            phone: field(&record, Column::Phone),
            stage,
            market,
            segment: field(&record, Column::Segment),
            assignee_id: None,
            budget_min_cents,
            budget_max_cents,
            currency: field(&record, Column::Currency).map(|c| c.to_uppercase()),
        };

        if let Err(e) = request.validate() {
            report.errors.push(CsvRowError {
                line,
                message: e.to_string(),
            });
            continue;
        }

        report.rows.push(request);
    }

    Ok(report)
}

/// Parse a whole-unit amount ("250000" or "250000.50") into cents
fn parse_amount(raw: Option<String>) -> Result<Option<i64>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let cleaned = raw.replace([' ', ','], "");
    match cleaned.parse::<f64>() {
        Ok(v) if v >= 0.0 => Ok(Some((v * 100.0).round() as i64)),
        _ => Err(format!("invalid amount: {}", raw)),
    }
}

/// Serialize leads to the same tabular format the importer accepts
pub fn export_leads_csv(leads: &[Lead]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "name",
        "email",
        "phone",
        "stage",
        "market",
        "segment",
        "budget_min",
        "budget_max",
        "currency",
        "created_at",
    ])?;

    for lead in leads {
        writer.write_record([
            lead.name.as_str(),
            lead.email.as_deref().unwrap_or(""),
            lead.phone.as_deref().unwrap_or(""),
            lead.stage.as_str(),
            lead.market.as_str(),
            lead.segment.as_deref().unwrap_or(""),
            &lead
                .budget_min_cents
                .map(format_amount)
                .unwrap_or_default(),
            &lead
                .budget_max_cents
                .map(format_amount)
                .unwrap_or_default(),
            lead.currency.as_str(),
            &lead.created_at.to_rfc3339(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush csv writer: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

fn format_amount(cents: i64) -> String {
    if cents % 100 == 0 {
        format!("{}", cents / 100)
    } else {
        format!("{:.2}", cents as f64 / 100.0)
    }
}
