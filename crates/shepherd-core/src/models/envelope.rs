use serde::Deserialize;

/// Response wrapper every endpoint uses: `{ success, data, message }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    /// Only list endpoints that page send this
    #[serde(rename = "totalCount", default)]
    pub total_count: Option<u64>,
}

impl<T> Envelope<T> {
    /// Message to show the user, if the API sent a non-blank one
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

impl<T> Envelope<Vec<T>> {
    /// List payload; a successful response with `data: null` is an empty list
    pub fn into_list(self) -> Vec<T> {
        self.data.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_data_is_empty_list() {
        let env: Envelope<Vec<i64>> =
            serde_json::from_str(r#"{"success":true,"data":null,"message":""}"#).unwrap();
        assert!(env.success);
        assert_eq!(env.message(), None);
        assert!(env.into_list().is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let env: Envelope<Vec<i64>> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
        assert!(!env.success);
        assert_eq!(env.message(), None);
        assert_eq!(env.total_count, None);
        assert_eq!(env.into_list(), vec![1, 2]);
    }
}
