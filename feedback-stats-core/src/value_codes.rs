use std::collections::HashMap;
use tracing::warn;

use crate::questionnaire::Question;
use feedback_stats_common::{FeedbackStatsError, Result};

/// Translates recorded answer values into the numeric codes of the
/// questionnaire version they were given in.
#[derive(Debug, Clone, Default)]
pub struct ValueCodesMapper {
    tables: HashMap<String, HashMap<String, i32>>,
}

impl ValueCodesMapper {
    pub fn new(questions: &[Question]) -> Self {
        let mut tables = HashMap::new();
        for option in questions.iter().flat_map(|q| &q.answer_options) {
            let Some(codes) = &option.values_code else { continue };
            if codes.len() != option.values.len() {
                warn!(
                    answer_option = option.id,
                    values = option.values.len(),
                    codes = codes.len(),
                    "answer option has mismatched values and codes, extra entries are ignored"
                );
            }
            let table: HashMap<String, i32> = option
                .values
                .iter()
                .cloned()
                .zip(codes.iter().copied())
                .collect();
            let key = option
                .variable_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| id_key(option.id));
            tables.insert(key, table);
        }
        Self { tables }
    }

    /// `Ok(None)` if the option is not part of the questionnaire. Empty
    /// values are skipped; any other unknown value is an error.
    pub fn map(
        &self,
        variable_name: Option<&str>,
        answer_option_id: i64,
        values: &[String],
    ) -> Result<Option<Vec<i32>>> {
        let table = variable_name
            .filter(|name| !name.is_empty())
            .and_then(|name| self.tables.get(name))
            .or_else(|| self.tables.get(&id_key(answer_option_id)));
        let Some(table) = table else {
            return Ok(None);
        };

        let mut codes = Vec::with_capacity(values.len());
        for value in values.iter().filter(|v| !v.is_empty()) {
            match table.get(value) {
                Some(&code) => codes.push(code),
                None => {
                    return Err(FeedbackStatsError::UnmappedValue {
                        variable: variable_name
                            .map(str::to_string)
                            .unwrap_or_else(|| id_key(answer_option_id)),
                        value: value.clone(),
                    })
                }
            }
        }
        Ok(Some(codes))
    }
}

fn id_key(id: i64) -> String {
    format!("__id_{id}")
}
