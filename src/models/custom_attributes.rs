//! Custom attribute values of user stories, tasks, issues and epics.

use serde_json::{json, Value};

use super::resource::Resource;
use crate::error::{Result, TaigaError};
use crate::request::Request;

impl Resource {
    fn custom_attributes_request(&self) -> Result<Request> {
        let kind = self.kind();
        if !kind.custom_attributes {
            return Err(TaigaError::Usage(format!(
                "{} has no custom attributes",
                kind.name
            )));
        }
        Ok(
            Request::new(format!("{}/custom-attributes-values/{{id}}", kind.endpoint))
                .param("id", self.require_id()?),
        )
    }

    /// Current custom attribute values, as returned by the server
    /// (`attributes_values` plus `version`).
    ///
    /// # Errors
    ///
    /// Returns a usage error if the kind has no custom attributes, or a REST
    /// error if the request fails.
    pub async fn get_attributes(&self) -> Result<Value> {
        let request = self.custom_attributes_request()?;
        self.client().get(request).await?.json_value()
    }

    /// Set one custom attribute value.
    ///
    /// `version` is the version of the attribute values record, which the
    /// server checks to reject concurrent edits.
    ///
    /// # Errors
    ///
    /// Returns a usage error if no attribute with `attribute_id` exists on
    /// this instance, or a REST error if a request fails.
    #[tracing::instrument(skip(self, value), fields(kind = self.kind().name))]
    pub async fn set_attribute(
        &self,
        attribute_id: i64,
        value: impl Into<Value> + Send,
        version: i64,
    ) -> Result<Value> {
        let request = self.custom_attributes_request()?;
        let mut attributes = self.get_attributes().await?;

        let values = attributes
            .get_mut("attributes_values")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                TaigaError::UnexpectedResponse("missing attributes_values".to_string())
            })?;

        let key = attribute_id.to_string();
        match values.get_mut(&key) {
            Some(slot) => *slot = value.into(),
            None => {
                return Err(TaigaError::Usage(format!(
                    "Attribute with id {key} doesn't exist"
                )))
            }
        }

        let body = json!({
            "attributes_values": Value::Object(values.clone()),
            "version": version,
        });
        self.client().patch(request.payload(body)).await?.json_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::kinds;
    use crate::TaigaClient;

    #[tokio::test]
    async fn test_kind_without_custom_attributes() {
        let client = TaigaClient::with_token("http://host", "f4k3").unwrap();
        let project = Resource::with_id(&client, &kinds::PROJECT, 1);
        assert!(matches!(
            project.get_attributes().await,
            Err(TaigaError::Usage(_))
        ));
    }

    #[test]
    fn test_custom_attributes_path() {
        let client = TaigaClient::with_token("http://host", "f4k3").unwrap();
        let issue = Resource::with_id(&client, &kinds::ISSUE, 3);
        let request = issue.custom_attributes_request().unwrap();
        assert_eq!(request.path().unwrap(), "issues/custom-attributes-values/3");
    }
}
