use serde::{Deserialize, Serialize};

/// One person as it travels through the pipeline.
///
/// Height and weight are in inches and pounds until the transform step,
/// and in meters and kilograms afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub height: f64,
    pub weight: f64,
}

impl Record {
    pub fn new<S: Into<String>>(name: S, height: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            height,
            weight,
        }
    }
}

/// Records in discovery order: format group, then file, then position in file.
pub type RecordSet = Vec<Record>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_json_ignores_extra_keys() {
        let record: Record =
            serde_json::from_str(r#"{"name":"jack","height":68.7,"weight":144,"id":9}"#).unwrap();
        assert_eq!(record, Record::new("jack", 68.7, 144.0));
    }

    #[test]
    fn test_record_requires_all_fields() {
        let result = serde_json::from_str::<Record>(r#"{"name":"jack","height":68.7}"#);
        assert!(result.is_err());
    }
}
