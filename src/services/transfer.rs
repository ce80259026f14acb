//! CSV export of lab tables and CSV import of computers and software.
//!
//! The format is deliberately naive: values are wrapped in double quotes and
//! joined with commas with no escaping, and import splits on raw commas.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::constants::limits::MAX_IMPORT_ROWS;
use crate::db::Store;
use crate::db::repositories::computer::NewComputer;
use crate::db::repositories::software::NewSoftware;
use crate::services::ServiceError;
use crate::services::access::{Actor, Scope};
use crate::services::computers::validate_new_computer;
use crate::services::software::validate_new_software;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Computers,
    Software,
    Bookings,
    Issues,
    Sessions,
}

impl ExportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Computers => "computers",
            Self::Software => "software",
            Self::Bookings => "bookings",
            Self::Issues => "issues",
            Self::Sessions => "sessions",
        }
    }

    /// Download name stem.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Sessions => "session_logs",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "computers" => Ok(Self::Computers),
            "software" => Ok(Self::Software),
            "bookings" => Ok(Self::Bookings),
            "issues" => Ok(Self::Issues),
            "sessions" | "session_logs" => Ok(Self::Sessions),
            other => Err(ServiceError::Validation(format!(
                "Unknown export type: '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Computers,
    Software,
}

impl FromStr for ImportKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "computers" => Ok(Self::Computers),
            "software" => Ok(Self::Software),
            other => Err(ServiceError::Validation(format!(
                "Unknown import type: '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub kind: &'static str,
    pub imported: usize,
}

/// Hoists the fields of nested objects into `<key>_<field>` columns.
fn flatten(record: Value) -> Map<String, Value> {
    let Value::Object(fields) = record else {
        return Map::new();
    };

    let mut flat = Map::new();
    for (key, value) in fields {
        match value {
            Value::Object(nested) => {
                for (nested_key, nested_value) in nested {
                    flat.insert(format!("{key}_{nested_key}"), nested_value);
                }
            }
            other => {
                flat.insert(key, other);
            }
        }
    }
    flat
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Renders records as CSV. The first record's columns form the header.
pub fn to_csv(records: Vec<Value>) -> Result<String, ServiceError> {
    let rows: Vec<Map<String, Value>> = records.into_iter().map(flatten).collect();
    let Some(first) = rows.first() else {
        return Err(ServiceError::Validation("No data to export".to_string()));
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in &rows {
        let line = headers
            .iter()
            .map(|h| format!("\"{}\"", cell(row.get(h))))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

/// Splits CSV text into header-keyed records.
///
/// Rows with fewer than two cells are skipped; cells are trimmed.
pub fn parse_csv(text: &str) -> Vec<HashMap<String, String>> {
    let mut rows = text.split('\n').map(|row| row.split(',').collect::<Vec<_>>());
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row.iter().map(|h| h.trim().to_string()).collect();

    rows.filter(|row| row.len() > 1)
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .filter_map(|(i, header)| {
                    row.get(i)
                        .map(|value| (header.clone(), value.trim().to_string()))
                })
                .collect()
        })
        .collect()
}

fn take(record: &mut HashMap<String, String>, key: &str) -> Option<String> {
    record.remove(key).filter(|v| !v.is_empty())
}

fn required(
    record: &mut HashMap<String, String>,
    key: &str,
    line: usize,
) -> Result<String, ServiceError> {
    take(record, key)
        .ok_or_else(|| ServiceError::Validation(format!("Row {line}: missing required field '{key}'")))
}

pub(crate) fn computer_from_record(
    mut record: HashMap<String, String>,
    line: usize,
) -> Result<NewComputer, ServiceError> {
    let status = match take(&mut record, "status") {
        Some(s) => s
            .parse()
            .map_err(|e| ServiceError::Validation(format!("Row {line}: {e}")))?,
        None => Default::default(),
    };

    let mut computer = NewComputer {
        system_id: required(&mut record, "system_id", line)?,
        name: required(&mut record, "name", line)?,
        location: take(&mut record, "location"),
        processor: take(&mut record, "processor"),
        ram: take(&mut record, "ram"),
        storage: take(&mut record, "storage"),
        os_version: take(&mut record, "os_version"),
        purchase_date: take(&mut record, "purchase_date"),
        warranty_expiry: take(&mut record, "warranty_expiry"),
        notes: take(&mut record, "notes"),
        status,
    };
    validate_new_computer(&mut computer)
        .map_err(|e| ServiceError::Validation(format!("Row {line}: {e}")))?;
    Ok(computer)
}

pub(crate) fn software_from_record(
    mut record: HashMap<String, String>,
    line: usize,
) -> Result<NewSoftware, ServiceError> {
    let mut package = NewSoftware {
        name: required(&mut record, "name", line)?,
        version: take(&mut record, "version"),
        vendor: take(&mut record, "vendor"),
        license_key: take(&mut record, "license_key"),
        license_expiry: take(&mut record, "license_expiry"),
        notes: take(&mut record, "notes"),
    };
    validate_new_software(&mut package)
        .map_err(|e| ServiceError::Validation(format!("Row {line}: {e}")))?;
    Ok(package)
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::Internal(e.to_string()))
}

pub struct TransferService {
    store: Store,
}

impl TransferService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Staff-only CSV of a whole table, with computer and profile columns joined in.
    pub async fn export(&self, actor: &Actor, kind: ExportKind) -> Result<String, ServiceError> {
        actor.require_staff()?;

        let records = match kind {
            ExportKind::Computers => self
                .store
                .computers()
                .list(None)
                .await?
                .into_iter()
                .map(to_value)
                .collect::<Result<Vec<_>, _>>()?,
            ExportKind::Software => self
                .store
                .software()
                .list_with_counts()
                .await?
                .into_iter()
                .map(|(package, _)| to_value(package))
                .collect::<Result<Vec<_>, _>>()?,
            ExportKind::Bookings => {
                let rows = self.store.bookings().list(&Scope::All, None).await?;
                self.joined(rows, |b| (b.computer_id.clone(), b.user_id.clone()))
                    .await?
            }
            ExportKind::Issues => {
                let rows = self.store.issues().list(&Scope::All, None).await?;
                self.joined(rows, |i| (i.computer_id.clone(), i.reported_by.clone()))
                    .await?
            }
            ExportKind::Sessions => {
                let rows = self.store.sessions().list(&Scope::All, None).await?;
                self.joined(rows, |s| (s.computer_id.clone(), s.user_id.clone()))
                    .await?
            }
        };

        let csv = to_csv(records)?;
        info!(event = "csv_exported", kind = %kind, lines = csv.lines().count(), "CSV export generated");
        Ok(csv)
    }

    /// Attaches `computers {name, system_id}` and `profiles {full_name, email}`
    /// objects to each row.
    async fn joined<T, F>(&self, rows: Vec<T>, keys: F) -> Result<Vec<Value>, ServiceError>
    where
        T: Serialize,
        F: Fn(&T) -> (String, String),
    {
        let computers: HashMap<String, (String, String)> = self
            .store
            .computers()
            .labels()
            .await?
            .into_iter()
            .map(|(id, system_id, name)| (id, (name, system_id)))
            .collect();
        let profiles: HashMap<String, (String, String)> = self
            .store
            .profiles()
            .list_with_roles()
            .await?
            .into_iter()
            .map(|(p, _)| (p.id, (p.full_name, p.email)))
            .collect();

        rows.into_iter()
            .map(|row| -> Result<Value, ServiceError> {
                let (computer_id, user_id) = keys(&row);
                let mut value = to_value(&row)?;
                if let Value::Object(fields) = &mut value {
                    let computer = computers.get(&computer_id);
                    fields.insert(
                        "computers".to_string(),
                        serde_json::json!({
                            "name": computer.map(|(name, _)| name.as_str()),
                            "system_id": computer.map(|(_, system_id)| system_id.as_str()),
                        }),
                    );
                    let (full_name, email) = profiles
                        .get(&user_id)
                        .map_or(("Unknown", ""), |(name, email)| (name.as_str(), email.as_str()));
                    fields.insert(
                        "profiles".to_string(),
                        serde_json::json!({ "full_name": full_name, "email": email }),
                    );
                }
                Ok(value)
            })
            .collect()
    }

    /// Staff-only. Inserts every row in one transaction or none.
    pub async fn import(
        &self,
        actor: &Actor,
        kind: ImportKind,
        text: &str,
    ) -> Result<ImportSummary, ServiceError> {
        actor.require_staff()?;

        let records = parse_csv(text);
        if records.is_empty() {
            return Err(ServiceError::Validation("No rows to import".to_string()));
        }
        if records.len() > MAX_IMPORT_ROWS {
            return Err(ServiceError::Validation(format!(
                "Imports are limited to {MAX_IMPORT_ROWS} rows"
            )));
        }

        let imported = match kind {
            ImportKind::Computers => {
                let computers = records
                    .into_iter()
                    .enumerate()
                    .map(|(i, record)| computer_from_record(record, i + 2))
                    .collect::<Result<Vec<_>, _>>()?;

                let mut seen: HashSet<String> = self
                    .store
                    .computers()
                    .labels()
                    .await?
                    .into_iter()
                    .map(|(_, system_id, _)| system_id)
                    .collect();
                for computer in &computers {
                    if !seen.insert(computer.system_id.trim().to_string()) {
                        return Err(ServiceError::Conflict(format!(
                            "System ID {} is already registered",
                            computer.system_id.trim()
                        )));
                    }
                }

                self.store.computers().create_many(computers).await?
            }
            ImportKind::Software => {
                let packages = records
                    .into_iter()
                    .enumerate()
                    .map(|(i, record)| software_from_record(record, i + 2))
                    .collect::<Result<Vec<_>, _>>()?;
                self.store.software().create_many(packages).await?
            }
        };

        let kind = match kind {
            ImportKind::Computers => "computers",
            ImportKind::Software => "software",
        };
        info!(event = "csv_imported", kind, imported, actor_id = %actor.user_id, "CSV import finished");

        Ok(ImportSummary { kind, imported })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_csv_shape() {
        let records = vec![
            json!({"id": "1", "name": "Alpha", "ram": null}),
            json!({"id": "2", "name": "Bravo", "ram": "16GB"}),
            json!({"id": "3", "name": "Charlie", "ram": "8GB"}),
        ];

        let csv = to_csv(records).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "id,name,ram");
        assert_eq!(lines[1], "\"1\",\"Alpha\",\"\"");
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), 3);
        }
    }

    #[test]
    fn test_to_csv_flattens_relations() {
        let records = vec![json!({
            "id": "b1",
            "duration_minutes": 45,
            "computers": {"name": "Alpha", "system_id": "LAB-01"},
            "profiles": {"full_name": "Ada", "email": "ada@lab.local"},
        })];

        let csv = to_csv(records).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("id,duration_minutes,computers_name,computers_system_id,profiles_full_name,profiles_email")
        );
        assert_eq!(
            lines.next(),
            Some("\"b1\",\"45\",\"Alpha\",\"LAB-01\",\"Ada\",\"ada@lab.local\"")
        );
    }

    #[test]
    fn test_to_csv_empty_is_an_error() {
        let err = to_csv(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("No data to export"));
    }

    #[test]
    fn test_parse_csv() {
        let text = " system_id , name ,location\r\nLAB-01, Alpha ,Room 1\r\n\r\nLAB-02,Bravo\nlonely\n";
        let records = parse_csv(text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["system_id"], "LAB-01");
        assert_eq!(records[0]["name"], "Alpha");
        assert_eq!(records[0]["location"], "Room 1");
        assert_eq!(records[1]["name"], "Bravo");
        assert!(!records[1].contains_key("location"));
    }

    #[test]
    fn test_computer_from_record_requires_fields() {
        let records = parse_csv("system_id,name,colour\nLAB-01,Alpha,blue\n,Bravo,red");
        let mut records = records.into_iter();

        let first = computer_from_record(records.next().unwrap(), 2).unwrap();
        assert_eq!(first.system_id, "LAB-01");

        let err = computer_from_record(records.next().unwrap(), 3).unwrap_err();
        assert!(err.to_string().contains("Row 3"));
        assert!(err.to_string().contains("system_id"));
    }

    #[test]
    fn test_software_from_record_rejects_bad_expiry() {
        let mut records = parse_csv("name,license_expiry\nOffice,2025-01-31\nIDE,someday").into_iter();
        let ok = software_from_record(records.next().unwrap(), 2).unwrap();
        assert_eq!(ok.license_expiry.as_deref(), Some("2025-01-31"));
        assert!(software_from_record(records.next().unwrap(), 3).is_err());
    }

    #[test]
    fn test_export_kind_parse() {
        assert_eq!("sessions".parse::<ExportKind>().unwrap(), ExportKind::Sessions);
        assert_eq!(ExportKind::Sessions.file_stem(), "session_logs");
        assert!("users".parse::<ExportKind>().is_err());
        assert!("bookings".parse::<ImportKind>().is_err());
    }
}
