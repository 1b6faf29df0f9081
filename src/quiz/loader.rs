use serde_json::{Map, Value};

use crate::quiz::error::RecordError;
use crate::quiz::store::{json_type_name, QuestionStore};
use crate::quiz::{Question, QuestionSet};

/// Store-assigned identifier, dropped before a record becomes a `Question`.
const STORE_ID_FIELD: &str = "_id";

pub struct QuestionLoader<'a> {
    store: &'a dyn QuestionStore,
}

impl<'a> QuestionLoader<'a> {
    pub fn new(store: &'a dyn QuestionStore) -> Self {
        Self { store }
    }

    /// Fetches and validates every record. Store failures yield an empty set.
    pub async fn load(&self) -> QuestionSet {
        let records = match self.store.fetch_all().await {
            Ok(records) => records,
            Err(e) => {
                log::error!("Failed to load questions: {}", e);
                return QuestionSet::default();
            }
        };

        let mut questions = Vec::with_capacity(records.len());
        for record in records {
            log::debug!("Processing record: {}", record);
            match validate_record(record) {
                Ok(question) => questions.push(question),
                Err(e) => log::warn!("Skipped {}", e),
            }
        }

        log::info!("Loaded {} valid questions", questions.len());
        QuestionSet::new(questions)
    }
}

/// Checks every field independently and reports all failures at once.
pub fn validate_record(record: Value) -> Result<Question, RecordError> {
    let mut fields = match record {
        Value::Object(fields) => fields,
        other => {
            return Err(RecordError {
                id: "N/A".to_string(),
                reasons: vec![format!(
                    "record is not an object: {} (type: {})",
                    other,
                    json_type_name(&other)
                )],
            })
        }
    };
    let id = fields
        .remove(STORE_ID_FIELD)
        .map(|id| describe_id(&id))
        .unwrap_or_else(|| "N/A".to_string());

    let mut reasons = Vec::new();
    let text = non_blank_string(&fields, "question", &mut reasons);
    let options = options(&fields, &mut reasons);
    let correct_text = non_blank_string(&fields, "correct_answer", &mut reasons);
    let correct_index = correct_index(&fields, &mut reasons);

    if let (Some(options), Some(index)) = (&options, correct_index) {
        if index < 0 || index as usize >= options.len() {
            reasons.push(format!(
                "'correct_index' {} is out of range for {} options",
                index,
                options.len()
            ));
        }
    }

    match (text, options, correct_text, correct_index) {
        (Some(text), Some(options), Some(correct_text), Some(index)) if reasons.is_empty() => {
            Ok(Question::new(text, options, index as usize, correct_text))
        }
        _ => Err(RecordError { id, reasons }),
    }
}

fn describe_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        // MongoDB ObjectId in extended JSON form
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(oid)) => oid.clone(),
            _ => id.to_string(),
        },
        other => other.to_string(),
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        Some(value) => format!("{} (type: {})", value, json_type_name(value)),
        None => "missing".to_string(),
    }
}

fn non_blank_string(
    fields: &Map<String, Value>,
    name: &str,
    reasons: &mut Vec<String>,
) -> Option<String> {
    match fields.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        other => {
            reasons.push(format!(
                "'{}' is missing, not a string or blank: {}",
                name,
                describe(other)
            ));
            None
        }
    }
}

fn options(fields: &Map<String, Value>, reasons: &mut Vec<String>) -> Option<Vec<String>> {
    let items = match fields.get("options") {
        Some(Value::Array(items)) => items,
        other => {
            reasons.push(format!("'options' is not a list: {}", describe(other)));
            return None;
        }
    };
    if items.is_empty() {
        reasons.push("'options' is an empty list".to_string());
        return None;
    }

    let mut options = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) if !s.trim().is_empty() => options.push(s.clone()),
            Value::String(_) => {
                reasons.push("some elements of 'options' are blank".to_string());
                return None;
            }
            _ => {
                reasons.push("some elements of 'options' are not strings".to_string());
                return None;
            }
        }
    }
    Some(options)
}

/// Accepts integers, and floats with no fractional part.
fn correct_index(fields: &Map<String, Value>, reasons: &mut Vec<String>) -> Option<i64> {
    let value = fields.get("correct_index");
    let index = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    };
    if index.is_none() {
        reasons.push(format!(
            "'correct_index' is not an integer: {}",
            describe(value)
        ));
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::error::StoreError;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedStore(Vec<Value>);

    #[async_trait]
    impl QuestionStore for FixedStore {
        async fn fetch_all(&self) -> Result<Vec<Value>, StoreError> {
            Ok(self.0.clone())
        }
    }

    struct UnreachableStore;

    #[async_trait]
    impl QuestionStore for UnreachableStore {
        async fn fetch_all(&self) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }
    }

    fn record(index: Value) -> Value {
        json!({
            "_id": {"$oid": "65f0c0ffee0000000000abcd"},
            "question": "Who founded Kyiv?",
            "options": ["Kyi", "Oleg", "Askold"],
            "correct_answer": "Kyi",
            "correct_index": index,
        })
    }

    #[test]
    fn accepts_well_formed_record() {
        let question = validate_record(record(json!(0))).unwrap();
        assert_eq!(question.text, "Who founded Kyiv?");
        assert_eq!(question.options, vec!["Kyi", "Oleg", "Askold"]);
        assert_eq!(question.correct_index, 0);
        assert_eq!(question.correct_text, "Kyi");
    }

    #[test]
    fn integral_float_index_is_coerced() {
        let question = validate_record(record(json!(2.0))).unwrap();
        assert_eq!(question.correct_index, 2);
    }

    #[test]
    fn fractional_float_index_is_rejected() {
        let err = validate_record(record(json!(2.5))).unwrap_err();
        assert_eq!(err.id, "65f0c0ffee0000000000abcd");
        assert_eq!(err.reasons.len(), 1);
        assert!(err.reasons[0].contains("'correct_index' is not an integer"));
    }

    #[test]
    fn string_index_is_rejected() {
        let err = validate_record(record(json!("1"))).unwrap_err();
        assert!(err.reasons[0].contains("correct_index"));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let err = validate_record(record(json!(3))).unwrap_err();
        assert!(err.reasons[0].contains("out of range"));

        let err = validate_record(record(json!(-1))).unwrap_err();
        assert!(err.reasons[0].contains("out of range"));
    }

    #[test]
    fn mismatched_correct_answer_text_is_kept_as_is() {
        let mut raw = record(json!(1));
        raw["correct_answer"] = json!("Kyi");
        let question = validate_record(raw).unwrap();
        assert_eq!(question.correct_index, 1);
        assert_eq!(question.correct_text, "Kyi");
    }

    #[test]
    fn collects_every_violation() {
        let err = validate_record(json!({
            "_id": "doc-7",
            "question": "   ",
            "options": [],
            "correct_index": 1.5,
        }))
        .unwrap_err();

        assert_eq!(err.id, "doc-7");
        assert_eq!(err.reasons.len(), 4);
        assert!(err.reasons[0].starts_with("'question'"));
        assert_eq!(err.reasons[1], "'options' is an empty list");
        assert!(err.reasons[2].starts_with("'correct_answer'"));
        assert!(err.reasons[3].starts_with("'correct_index'"));
    }

    #[test]
    fn non_string_option_is_rejected() {
        let mut raw = record(json!(0));
        raw["options"] = json!(["Kyi", 2]);
        let err = validate_record(raw).unwrap_err();
        assert_eq!(err.reasons, vec!["some elements of 'options' are not strings"]);
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = validate_record(json!("just text")).unwrap_err();
        assert_eq!(err.id, "N/A");
        assert!(err.reasons[0].contains("not an object"));
    }

    #[tokio::test]
    async fn load_drops_invalid_records_and_keeps_the_rest_in_order() {
        let mut missing_options = record(json!(0));
        missing_options.as_object_mut().unwrap().remove("options");
        let mut second = record(json!(1));
        second["question"] = json!("Who baptised Rus?");

        let store = FixedStore(vec![
            record(json!(0)),
            missing_options,
            record(json!(2.5)),
            second,
            json!(null),
        ]);
        let questions = QuestionLoader::new(&store).load().await;

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "Who founded Kyiv?");
        assert_eq!(questions[1].text, "Who baptised Rus?");
        assert_eq!(questions[1].correct_index, 1);
    }

    #[tokio::test]
    async fn load_returns_empty_set_when_store_is_down() {
        let questions = QuestionLoader::new(&UnreachableStore).load().await;
        assert!(questions.is_empty());
    }
}
