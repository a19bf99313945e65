//! CloudFormation template model and intrinsic function helpers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

pub const AWS_ACCOUNT_ID: &str = "AWS::AccountId";
pub const AWS_PARTITION: &str = "AWS::Partition";
pub const AWS_REGION: &str = "AWS::Region";
pub const AWS_URL_SUFFIX: &str = "AWS::URLSuffix";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resources: BTreeMap<String, Resource>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: None,
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }
}

impl Template {
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, resource)| resource.resource_type == resource_type)
    }

    pub(crate) fn insert(&mut self, logical_id: String, resource: Resource) {
        self.resources.insert(logical_id, resource);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Resource {
    pub fn new(resource_type: &str, properties: Value) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            properties,
            depends_on: Vec::new(),
            metadata: None,
        }
    }

    pub fn depends_on(mut self, logical_ids: impl IntoIterator<Item = String>) -> Self {
        self.depends_on.extend(logical_ids);
        self.depends_on.sort();
        self.depends_on.dedup();
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

pub fn join(parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": ["", parts] })
}

pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}

/// CloudFormation `Tags` list, sorted by key.
pub fn tags(tags: &BTreeMap<String, String>) -> Option<Value> {
    if tags.is_empty() {
        return None;
    }
    Some(Value::Array(
        tags.iter()
            .map(|(key, value)| json!({ "Key": key, "Value": value }))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_cloudformation_keys() {
        let mut template = Template::default();
        template.insert(
            "Role".to_string(),
            Resource::new("AWS::IAM::Role", json!({}))
                .depends_on(["Other".to_string()]),
        );

        let value = serde_json::to_value(&template)
            .expect("template should serialize");
        assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(value["Resources"]["Role"]["Type"], "AWS::IAM::Role");
        assert_eq!(value["Resources"]["Role"]["DependsOn"], json!(["Other"]));
        assert!(value.get("Outputs").is_none());
        assert!(value.get("Description").is_none());
    }

    #[test]
    fn tags_are_omitted_when_empty() {
        assert!(tags(&BTreeMap::new()).is_none());
        let rendered = tags(&BTreeMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]))
        .expect("tags should render");
        assert_eq!(rendered[0]["Key"], "a");
    }

    #[test]
    fn intrinsic_helpers_render_expected_shapes() {
        assert_eq!(reference("Api"), json!({"Ref": "Api"}));
        assert_eq!(get_att("Fn", "Arn"), json!({"Fn::GetAtt": ["Fn", "Arn"]}));
        assert_eq!(
            join(vec![json!("a"), reference(AWS_REGION)]),
            json!({"Fn::Join": ["", ["a", {"Ref": "AWS::Region"}]]})
        );
    }
}
