//! Administrative (config) actions.
//!
//! # Design
//! Every action is one row in `ACTIONS`: its snake-case name, whether it is
//! scoped to a domain, which positional parameter it takes, whether it
//! accepts a name list and a `Deployed` flag, and whether it is sent as a
//! POST. [`build`] turns a row plus caller input into an `Operation`; the
//! public per-action functions are thin wrappers that only shape their
//! positional argument.
//!
//! Structured arguments are flattened the way the AWS query protocol
//! expects: nested objects become `Parent.Child` keys and lists become
//! `Parent.member.N`, counting from 1.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{CloudSearchError, Result};
use crate::operation::{Operation, API_VERSION};
use crate::params::Params;

use ConfigAction as A;
use Scope::{Account, Domain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigAction {
    BuildSuggesters,
    CreateDomain,
    DefineAnalysisScheme,
    DefineExpression,
    DefineIndexField,
    DefineSuggester,
    DeleteAnalysisScheme,
    DeleteDomain,
    DeleteExpression,
    DeleteIndexField,
    DeleteSuggester,
    DescribeAnalysisSchemes,
    DescribeAvailabilityOptions,
    DescribeDomains,
    DescribeExpressions,
    DescribeIndexFields,
    DescribeScalingParameters,
    DescribeServiceAccessPolicies,
    DescribeSuggesters,
    IndexDocuments,
    ListDomainNames,
    UpdateAvailabilityOptions,
    UpdateScalingParameters,
    UpdateServiceAccessPolicies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Domain,
    Account,
}

#[derive(Debug)]
struct ActionSpec {
    action: ConfigAction,
    name: &'static str,
    scope: Scope,
    /// Key of the required positional parameter.
    param: Option<&'static str>,
    /// Base key for the `.member.N` name list.
    names: Option<&'static str>,
    deployed: bool,
    post: bool,
}

const fn spec(
    action: ConfigAction,
    name: &'static str,
    scope: Scope,
    param: Option<&'static str>,
    names: Option<&'static str>,
    deployed: bool,
    post: bool,
) -> ActionSpec {
    ActionSpec {
        action,
        name,
        scope,
        param,
        names,
        deployed,
        post,
    }
}

/// Indexed by `ConfigAction as usize`.
#[rustfmt::skip]
static ACTIONS: [ActionSpec; 24] = [
    spec(A::BuildSuggesters, "build_suggesters", Domain, None, None, false, true),
    spec(A::CreateDomain, "create_domain", Domain, None, None, false, true),
    spec(A::DefineAnalysisScheme, "define_analysis_scheme", Domain, Some("AnalysisScheme"), None, false, true),
    spec(A::DefineExpression, "define_expression", Domain, Some("Expression"), None, false, true),
    spec(A::DefineIndexField, "define_index_field", Domain, Some("IndexField"), None, false, true),
    spec(A::DefineSuggester, "define_suggester", Domain, Some("Suggester"), None, false, true),
    spec(A::DeleteAnalysisScheme, "delete_analysis_scheme", Domain, Some("AnalysisSchemeName"), None, false, true),
    spec(A::DeleteDomain, "delete_domain", Domain, None, None, false, true),
    spec(A::DeleteExpression, "delete_expression", Domain, Some("ExpressionName"), None, false, true),
    spec(A::DeleteIndexField, "delete_index_field", Domain, Some("IndexFieldName"), None, false, true),
    spec(A::DeleteSuggester, "delete_suggester", Domain, Some("SuggesterName"), None, false, true),
    spec(A::DescribeAnalysisSchemes, "describe_analysis_schemes", Domain, None, Some("AnalysisSchemeNames"), true, true),
    spec(A::DescribeAvailabilityOptions, "describe_availability_options", Domain, None, None, true, false),
    spec(A::DescribeDomains, "describe_domains", Account, None, Some("DomainNames"), false, true),
    spec(A::DescribeExpressions, "describe_expressions", Domain, None, Some("ExpressionNames"), true, true),
    spec(A::DescribeIndexFields, "describe_index_fields", Domain, None, Some("FieldNames"), true, true),
    spec(A::DescribeScalingParameters, "describe_scaling_parameters", Domain, None, None, false, false),
    spec(A::DescribeServiceAccessPolicies, "describe_service_access_policies", Domain, None, None, true, false),
    spec(A::DescribeSuggesters, "describe_suggesters", Domain, None, Some("SuggesterNames"), true, true),
    spec(A::IndexDocuments, "index_documents", Domain, None, None, false, true),
    spec(A::ListDomainNames, "list_domain_names", Account, None, None, false, false),
    spec(A::UpdateAvailabilityOptions, "update_availability_options", Domain, Some("MultiAZ"), None, false, true),
    spec(A::UpdateScalingParameters, "update_scaling_parameters", Domain, Some("ScalingParameters"), None, false, true),
    spec(A::UpdateServiceAccessPolicies, "update_service_access_policies", Domain, Some("AccessPolicies"), None, false, true),
];

impl ConfigAction {
    fn spec(self) -> &'static ActionSpec {
        &ACTIONS[self as usize]
    }

    pub fn all() -> impl Iterator<Item = ConfigAction> {
        ACTIONS.iter().map(|s| s.action)
    }

    /// Snake-case name, e.g. `describe_index_fields`.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Wire name, e.g. `DescribeIndexFields`.
    pub fn action_name(self) -> String {
        camelize(self.name())
    }

    pub fn is_account_level(self) -> bool {
        self.spec().scope == Scope::Account
    }

    pub fn positional_param(self) -> Option<&'static str> {
        self.spec().param
    }
}

/// Caller options shared by every config action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOptions {
    /// Names for `describe_*` actions, sent as `<Base>.member.N`.
    pub names: Vec<String>,
    /// Show the deployed configuration instead of the pending one.
    pub deployed: Option<bool>,
    /// API version; defaults to [`API_VERSION`].
    pub version: Option<String>,
}

impl ConfigOptions {
    pub fn names<I: Into<String>>(names: impl IntoIterator<Item = I>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn deployed(mut self, deployed: bool) -> Self {
        self.deployed = Some(deployed);
        self
    }
}

/// Build the operation for `action`.
///
/// `positional` is the action's required argument, flattened under its key.
/// `domain` is ignored for account-level actions.
pub fn build(
    action: ConfigAction,
    domain: Option<&str>,
    positional: Option<Value>,
    options: &ConfigOptions,
) -> Operation {
    let spec = action.spec();
    let mut params = Params::new();

    if let (Some(key), Some(value)) = (spec.param, positional) {
        flatten_into(key, &value, &mut params);
    }
    if let Some(base) = spec.names {
        params.merge(names_params(base, &options.names));
    }
    if spec.deployed {
        if let Some(deployed) = options.deployed {
            params.insert("Deployed", deployed);
        }
    }

    let version = options.version.clone().unwrap_or_else(|| API_VERSION.to_string());
    params.insert("Action", action.action_name());
    if spec.scope == Domain {
        if let Some(domain) = domain {
            params.insert("DomainName", domain);
        }
    }
    params.insert("Version", version.clone());
    params.elide_blank();

    let op = Operation::config(params)
        .with_api_version(version)
        .with_header("accept", "application/json");
    if spec.post {
        op.force_post()
    } else {
        op
    }
}

/// `["a", "b"]` under `Base` becomes `Base.member.1=a`, `Base.member.2=b`.
pub fn names_params(base: &str, names: &[String]) -> Params {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| (format!("{base}.member.{}", i + 1), name.clone()))
        .collect()
}

/// Flatten `value` into AWS query keys under `prefix`.
pub fn flatten_into(prefix: &str, value: &Value, params: &mut Params) {
    match value {
        Value::Null => {}
        Value::Bool(b) => params.insert(prefix, *b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => params.insert(prefix, i),
            None => params.insert(prefix, n.to_string()),
        },
        Value::String(s) => params.insert(prefix, s.clone()),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(&format!("{prefix}.member.{}", i + 1), item, params);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_into(&format!("{prefix}.{key}"), item, params);
            }
        }
    }
}

/// `describe_index_fields` becomes `DescribeIndexFields`.
pub fn camelize(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| CloudSearchError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Action payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexFieldType {
    Int,
    Double,
    Literal,
    Text,
    Date,
    Latlon,
    IntArray,
    DoubleArray,
    LiteralArray,
    TextArray,
    DateArray,
}

impl IndexFieldType {
    /// Key holding the type-specific options, e.g. `TextArrayOptions`.
    pub fn options_key(self) -> &'static str {
        match self {
            IndexFieldType::Int => "IntOptions",
            IndexFieldType::Double => "DoubleOptions",
            IndexFieldType::Literal => "LiteralOptions",
            IndexFieldType::Text => "TextOptions",
            IndexFieldType::Date => "DateOptions",
            IndexFieldType::Latlon => "LatLonOptions",
            IndexFieldType::IntArray => "IntArrayOptions",
            IndexFieldType::DoubleArray => "DoubleArrayOptions",
            IndexFieldType::LiteralArray => "LiteralArrayOptions",
            IndexFieldType::TextArray => "TextArrayOptions",
            IndexFieldType::DateArray => "DateArrayOptions",
        }
    }
}

/// An index field definition. `options` uses the service's option names,
/// e.g. `{"FacetEnabled": true, "ReturnEnabled": true}`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexField {
    pub name: String,
    pub field_type: IndexFieldType,
    pub options: Option<Value>,
}

impl IndexField {
    pub fn new(name: impl Into<String>, field_type: IndexFieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            options: None,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    fn to_value(&self) -> Result<Value> {
        let field_type = to_value(&self.field_type)?;
        let mut value = json!({
            "IndexFieldName": self.name,
            "IndexFieldType": field_type,
        });
        if let (Some(options), Value::Object(map)) = (&self.options, &mut value) {
            map.insert(self.field_type.options_key().to_string(), options.clone());
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Expression {
    pub expression_name: String,
    pub expression_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FuzzyMatching {
    None,
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentSuggesterOptions {
    pub source_field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_matching: Option<FuzzyMatching>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_expression: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Suggester {
    pub suggester_name: String,
    pub document_suggester_options: DocumentSuggesterOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisScheme {
    pub analysis_scheme_name: String,
    pub analysis_scheme_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_options: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalingParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_instance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_replication_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_partition_count: Option<u32>,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

fn on_domain(action: ConfigAction, domain: &str, positional: Option<Value>, options: &ConfigOptions) -> Result<Operation> {
    Ok(build(action, Some(domain), positional, options))
}

pub fn build_suggesters(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::BuildSuggesters, domain, None, options)
}

pub fn create_domain(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::CreateDomain, domain, None, options)
}

pub fn define_analysis_scheme(domain: &str, scheme: &AnalysisScheme, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DefineAnalysisScheme, domain, Some(to_value(scheme)?), options)
}

pub fn define_expression(domain: &str, expression: &Expression, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DefineExpression, domain, Some(to_value(expression)?), options)
}

pub fn define_index_field(domain: &str, field: &IndexField, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DefineIndexField, domain, Some(field.to_value()?), options)
}

pub fn define_suggester(domain: &str, suggester: &Suggester, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DefineSuggester, domain, Some(to_value(suggester)?), options)
}

pub fn delete_analysis_scheme(domain: &str, name: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DeleteAnalysisScheme, domain, Some(json!(name)), options)
}

pub fn delete_domain(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DeleteDomain, domain, None, options)
}

pub fn delete_expression(domain: &str, name: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DeleteExpression, domain, Some(json!(name)), options)
}

pub fn delete_index_field(domain: &str, name: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DeleteIndexField, domain, Some(json!(name)), options)
}

pub fn delete_suggester(domain: &str, name: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DeleteSuggester, domain, Some(json!(name)), options)
}

pub fn describe_analysis_schemes(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DescribeAnalysisSchemes, domain, None, options)
}

pub fn describe_availability_options(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DescribeAvailabilityOptions, domain, None, options)
}

/// Account-level; `options.names` selects domains.
pub fn describe_domains(options: &ConfigOptions) -> Result<Operation> {
    Ok(build(A::DescribeDomains, None, None, options))
}

pub fn describe_expressions(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DescribeExpressions, domain, None, options)
}

pub fn describe_index_fields(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DescribeIndexFields, domain, None, options)
}

pub fn describe_scaling_parameters(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DescribeScalingParameters, domain, None, options)
}

pub fn describe_service_access_policies(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DescribeServiceAccessPolicies, domain, None, options)
}

pub fn describe_suggesters(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::DescribeSuggesters, domain, None, options)
}

pub fn index_documents(domain: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::IndexDocuments, domain, None, options)
}

pub fn list_domain_names(options: &ConfigOptions) -> Result<Operation> {
    Ok(build(A::ListDomainNames, None, None, options))
}

pub fn update_availability_options(domain: &str, multi_az: bool, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::UpdateAvailabilityOptions, domain, Some(json!(multi_az)), options)
}

pub fn update_scaling_parameters(
    domain: &str,
    scaling: &ScalingParameters,
    options: &ConfigOptions,
) -> Result<Operation> {
    on_domain(A::UpdateScalingParameters, domain, Some(to_value(scaling)?), options)
}

/// `policies` is the access policy document as JSON text.
pub fn update_service_access_policies(domain: &str, policies: &str, options: &ConfigOptions) -> Result<Operation> {
    on_domain(A::UpdateServiceAccessPolicies, domain, Some(json!(policies)), options)
}
