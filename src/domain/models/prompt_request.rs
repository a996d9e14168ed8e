use super::AllowedFieldSet;

/// A fully-constructed natural-language instruction for the completion provider.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    prompt: String,
    /// Columns of the dataset the client uploaded, when it sent them.
    fields: Option<Vec<String>>,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// The dataset-derived field set, if the request carried a non-empty one.
    pub fn dataset_fields(&self) -> Option<AllowedFieldSet> {
        self.fields
            .as_ref()
            .map(|f| AllowedFieldSet::new(f.iter().cloned()))
            .filter(|set| !set.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_fields_absent_without_columns() {
        assert!(PromptRequest::new("plot it").dataset_fields().is_none());
        assert!(PromptRequest::new("plot it")
            .with_fields(vec!["  ".to_string()])
            .dataset_fields()
            .is_none());
    }

    #[test]
    fn dataset_fields_built_from_columns() {
        let request =
            PromptRequest::new("plot it").with_fields(vec!["price".into(), "region".into()]);
        let set = request.dataset_fields().unwrap();
        assert!(set.contains("price"));
        assert!(!set.contains("Horsepower"));
    }

    #[test]
    fn whitespace_prompt_is_blank() {
        assert!(PromptRequest::new(" \n\t").is_blank());
        assert!(!PromptRequest::new("histogram").is_blank());
    }
}
