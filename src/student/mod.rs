//! Student record, the service that fetches it, and the PDF report renderer.

pub mod report;
pub mod service;

pub use report::{render, ReportDocument, ReportRow};
pub use service::StudentService;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Student record as served by the upstream `GET /api/v1/students/{id}`.
///
/// Keys missing from the upstream payload decode to their zero value.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub system_access: bool,
    pub phone: String,
    pub gender: String,
    #[serde(with = "date")]
    #[schema(value_type = String, format = DateTime)]
    pub dob: DateTime<Utc>,
    #[serde(rename = "class")]
    pub class_name: String,
    pub section: String,
    pub roll: i64,
    pub father_name: String,
    pub father_phone: String,
    pub mother_name: String,
    pub mother_phone: String,
    pub guardian_name: String,
    pub guardian_phone: String,
    pub relation_of_guardian: String,
    pub current_address: String,
    pub permanent_address: String,
    #[serde(with = "date")]
    #[schema(value_type = String, format = DateTime)]
    pub admission_date: DateTime<Utc>,
    pub reporter_name: String,
}

/// Dates go out as RFC 3339 and come in as RFC 3339 or a bare `YYYY-MM-DD`.
mod date {
    use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(timestamp.with_timezone(&Utc));
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;
    use serde_json::json;

    /// Fully populated record shared by tests across the crate.
    pub(crate) fn sample_student() -> StudentRecord {
        StudentRecord {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            system_access: true,
            phone: "1234567890".to_string(),
            gender: "F".to_string(),
            dob: Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            class_name: "10".to_string(),
            section: "A".to_string(),
            roll: 5,
            father_name: "Bob".to_string(),
            father_phone: "1111111111".to_string(),
            mother_name: "Carol".to_string(),
            mother_phone: "2222222222".to_string(),
            guardian_name: "Eve".to_string(),
            guardian_phone: "3333333333".to_string(),
            relation_of_guardian: "Aunt".to_string(),
            current_address: "Current Addr".to_string(),
            permanent_address: "Perm Addr".to_string(),
            admission_date: Utc.with_ymd_and_hms(2018, 6, 10, 0, 0, 0).unwrap(),
            reporter_name: "Reporter".to_string(),
        }
    }

    #[test]
    fn serializes_camel_case_keys() -> Result<()> {
        let value = serde_json::to_value(sample_student())?;
        assert_eq!(value["systemAccess"], true);
        assert_eq!(value["class"], "10");
        assert_eq!(value["relationOfGuardian"], "Aunt");
        assert_eq!(value["dob"], "2000-01-01T00:00:00Z");
        assert_eq!(value["admissionDate"], "2018-06-10T00:00:00Z");
        Ok(())
    }

    #[test]
    fn decodes_upstream_payload() -> Result<()> {
        let payload = json!({
            "id": 1,
            "name": "Alice",
            "email": "alice@example.com",
            "systemAccess": true,
            "phone": "1234567890",
            "gender": "F",
            "dob": "2000-01-01T00:00:00.000Z",
            "class": "10",
            "section": "A",
            "roll": 5,
            "fatherName": "Bob",
            "fatherPhone": "1111111111",
            "motherName": "Carol",
            "motherPhone": "2222222222",
            "guardianName": "Eve",
            "guardianPhone": "3333333333",
            "relationOfGuardian": "Aunt",
            "currentAddress": "Current Addr",
            "permanentAddress": "Perm Addr",
            "admissionDate": "2018-06-10",
            "reporterName": "Reporter"
        });
        let record: StudentRecord = serde_json::from_value(payload)?;
        assert_eq!(record, sample_student());
        Ok(())
    }

    #[test]
    fn missing_keys_take_zero_values() -> Result<()> {
        let record: StudentRecord = serde_json::from_value(json!({ "id": 4, "name": "Dan" }))?;
        assert_eq!(record.id, 4);
        assert_eq!(record.name, "Dan");
        assert!(record.guardian_name.is_empty());
        assert!(!record.system_access);
        Ok(())
    }

    #[test]
    fn rejects_garbage_dates() {
        let result: Result<StudentRecord, _> =
            serde_json::from_value(json!({ "dob": "first of january" }));
        assert!(result.is_err());
    }

    #[test]
    fn date_parse_accepts_offsets() {
        let parsed = date::parse("2000-01-01T05:45:00+05:45");
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()));
    }
}
