use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::JobDecodeError;
use crate::ledger::{normalize_address, LedgerObject};

/// Job status as stored on the ledger.
///
/// The integer codes are published by the on-chain protocol, not chosen here.
/// Codes other than the two known ones are carried as `Other` and treated as
/// not actionable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Fulfilled,
    Other(u64),
}

impl JobStatus {
    pub const PENDING_CODE: u64 = 0;
    pub const FULFILLED_CODE: u64 = 1;

    pub fn from_code(code: u64) -> Self {
        match code {
            Self::PENDING_CODE => JobStatus::Pending,
            Self::FULFILLED_CODE => JobStatus::Fulfilled,
            other => JobStatus::Other(other),
        }
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self, JobStatus::Pending)
    }
}

/// Fully qualified Move type of job objects: `<package>::<module>::<name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobType {
    pub package: String,
    pub module: String,
    pub name: String,
}

impl JobType {
    pub fn new(package: &str, module: &str, name: &str) -> Self {
        Self {
            package: normalize_address(package),
            module: module.to_string(),
            name: name.to_string(),
        }
    }

    pub fn tag(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.name)
    }

    /// True if `type_tag` names this struct, with or without type parameters.
    /// The package address may be abbreviated on either side.
    pub fn matches(&self, type_tag: &str) -> bool {
        let mut parts = type_tag.splitn(3, "::");
        let (Some(package), Some(module), Some(rest)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let name = rest.split('<').next().unwrap_or(rest);

        normalize_address(package) == self.package && module == self.module && name == self.name
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// A job object decoded from its ledger fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    pub id: String,
    pub status: JobStatus,
    pub input_data: Vec<u64>,
}

impl JobRequest {
    /// Decode only the status field. Used before deciding whether the rest is worth reading.
    pub fn decode_status(object: &LedgerObject) -> Result<JobStatus, JobDecodeError> {
        let value = object
            .fields
            .get("status")
            .ok_or(JobDecodeError::MissingField("status"))?;

        as_u64(value)
            .map(JobStatus::from_code)
            .ok_or_else(|| JobDecodeError::InvalidField {
                field: "status",
                value: value.to_string(),
            })
    }

    pub fn from_object(object: &LedgerObject) -> Result<Self, JobDecodeError> {
        let status = Self::decode_status(object)?;

        let raw_input = object
            .fields
            .get("input_data")
            .ok_or(JobDecodeError::MissingField("input_data"))?;
        let invalid_input = || JobDecodeError::InvalidField {
            field: "input_data",
            value: raw_input.to_string(),
        };

        let input_data = raw_input
            .as_array()
            .ok_or_else(invalid_input)?
            .iter()
            .map(|v| as_u64(v).ok_or_else(invalid_input))
            .collect::<Result<Vec<u64>, _>>()?;

        Ok(Self {
            id: object.id.clone(),
            status,
            input_data,
        })
    }
}

/// u64 fields arrive as decimal strings from the RPC; plain numbers are accepted too
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(fields: Value) -> LedgerObject {
        LedgerObject {
            id: "0xjob".to_string(),
            type_tag: Some("0x1::logic::JobRequest".to_string()),
            fields: fields.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(JobStatus::from_code(0), JobStatus::Pending);
        assert_eq!(JobStatus::from_code(1), JobStatus::Fulfilled);
        assert_eq!(JobStatus::from_code(7), JobStatus::Other(7));
        assert!(JobStatus::Pending.is_actionable());
        assert!(!JobStatus::Other(7).is_actionable());
    }

    #[test]
    fn test_decode_job_with_string_inputs() {
        let job = JobRequest::from_object(&object(json!({
            "status": 0,
            "input_data": ["10", "20", 30]
        })))
        .unwrap();

        assert_eq!(job.id, "0xjob");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.input_data, vec![10, 20, 30]);
    }

    #[test]
    fn test_decode_rejects_bad_fields() {
        assert_eq!(
            JobRequest::from_object(&object(json!({ "input_data": [] }))),
            Err(JobDecodeError::MissingField("status"))
        );
        assert!(matches!(
            JobRequest::from_object(&object(json!({ "status": 0, "input_data": ["-1"] }))),
            Err(JobDecodeError::InvalidField { field: "input_data", .. })
        ));
        assert!(matches!(
            JobRequest::decode_status(&object(json!({ "status": "pending" }))),
            Err(JobDecodeError::InvalidField { field: "status", .. })
        ));
    }

    #[test]
    fn test_decode_error_messages() {
        assert_eq!(
            JobDecodeError::MissingField("status").to_string(),
            "missing field `status`"
        );
        let err = JobRequest::decode_status(&object(json!({ "status": "pending" }))).unwrap_err();
        assert_eq!(err.to_string(), "field `status` has unexpected value \"pending\"");
    }

    #[test]
    fn test_job_type_matching() {
        let job_type = JobType::new("0x1", "logic", "JobRequest");

        assert!(job_type.matches("0x1::logic::JobRequest"));
        assert!(job_type.matches(
            "0x0000000000000000000000000000000000000000000000000000000000000001::logic::JobRequest"
        ));
        assert!(job_type.matches("0x1::logic::JobRequest<0x2::sui::SUI>"));
        assert!(!job_type.matches("0x1::logic::JobRequestV2"));
        assert!(!job_type.matches("0x2::logic::JobRequest"));
        assert!(!job_type.matches("0x1::other::JobRequest"));
        assert!(!job_type.matches("JobRequest"));
    }
}
