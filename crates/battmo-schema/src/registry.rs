//! # Schema Registry
//!
//! Assembles a multi-file Draft 7 schema and compiles it into a validator.
//!
//! ## Lifecycle
//!
//! ```text
//! SchemaSetBuilder::new(dir, base_uri)
//!     .register("activematerial")?     // <dir>/activematerial.schema.json
//!     ...                              //   -> <base_uri>activematerial
//!     .build("battery")?               // top-level schema, $ref check, compile
//! => SchemaSet (immutable)
//! ```
//!
//! ## Reference Resolution
//!
//! Each fragment is resolvable under `<base_uri><name>`. A `$ref` is
//! resolved against the `$id` of the document containing it, or against
//! its registration URI when it has none. Before compiling, every
//! external `$ref` in the top-level schema and in all fragments must name
//! a registered document; same-document pointers (`#/definitions/...`)
//! and the published JSON Schema meta-schemas are exempt. During
//! validation, `$ref` retrieval is served from memory only.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use battmo_core::SchemaConfig;
use jsonschema::{Draft, Retrieve, Uri, Validator};
use serde_json::Value;
use url::Url;

use crate::validate::{SchemaError, ValidationViolations, Violation};

/// Suffix of schema files in the schema directory.
pub const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// Hosts whose meta-schemas are bundled with the validator.
const META_SCHEMA_HOSTS: [&str; 1] = ["json-schema.org"];

/// Serves `$ref` retrieval from the registered fragments.
///
/// Unknown URIs are an error; nothing is fetched from the network or disk.
struct LocalSchemaRetriever {
    schemas_by_uri: BTreeMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        self.schemas_by_uri
            .get(uri_str)
            .cloned()
            .ok_or_else(|| format!("schema '{uri_str}' is not registered").into())
    }
}

#[derive(Debug, Clone)]
struct Fragment {
    name: String,
    uri: String,
    schema: Value,
}

/// Collects schema fragments; the only way to obtain a [`SchemaSet`].
#[derive(Debug, Clone)]
pub struct SchemaSetBuilder {
    schema_dir: PathBuf,
    base_uri: String,
    fragments: Vec<Fragment>,
}

impl SchemaSetBuilder {
    /// Start an empty registry reading from `schema_dir` and registering
    /// under `base_uri` (which should end with `/`).
    pub fn new(schema_dir: impl Into<PathBuf>, base_uri: impl Into<String>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            base_uri: base_uri.into(),
            fragments: Vec::new(),
        }
    }

    /// Builder for the configured layout; `root` anchors a relative schema dir.
    pub fn from_config(root: &Path, config: &SchemaConfig) -> Self {
        Self::new(root.join(&config.schema_dir), config.base_uri.clone())
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Read `<schema_dir>/<name>.schema.json` and register it.
    pub fn register(&mut self, name: &str) -> Result<&mut Self, SchemaError> {
        let schema = read_schema(&self.schema_dir, name)?;
        self.register_value(name, schema)
    }

    /// Register every name, in order.
    pub fn register_all<I, S>(&mut self, names: I) -> Result<&mut Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.register(name.as_ref())?;
        }
        Ok(self)
    }

    /// Register an already-parsed fragment.
    pub fn register_value(&mut self, name: &str, schema: Value) -> Result<&mut Self, SchemaError> {
        if self.fragments.iter().any(|f| f.name == name) {
            return Err(SchemaError::DuplicateFragment {
                name: name.to_string(),
            });
        }
        let uri = format!("{}{name}", self.base_uri);
        tracing::debug!(name, uri = %uri, "registered schema fragment");
        self.fragments.push(Fragment {
            name: name.to_string(),
            uri,
            schema,
        });
        Ok(self)
    }

    /// Load the top-level schema `<schema_dir>/<top_level>.schema.json`,
    /// check all cross-references and compile the validator.
    ///
    /// # Errors
    ///
    /// - `SchemaNotFound` / `SchemaParse` for the top-level file.
    /// - `UnresolvedReference` if any `$ref` names an unregistered document.
    /// - `ValidatorBuild` if the schema does not compile.
    pub fn build(self, top_level: &str) -> Result<SchemaSet, SchemaError> {
        let root = read_schema(&self.schema_dir, top_level)?;
        self.build_with_root(top_level, root)
    }

    /// [`build`](Self::build) with an already-parsed top-level schema.
    pub fn build_with_root(self, top_level: &str, root: Value) -> Result<SchemaSet, SchemaError> {
        let base = Url::parse(&self.base_uri).map_err(|e| SchemaError::InvalidBaseUri {
            uri: self.base_uri.clone(),
            reason: e.to_string(),
        })?;
        let root_uri = format!("{}{top_level}", self.base_uri);

        let registered: BTreeSet<String> = self
            .fragments
            .iter()
            .filter_map(|f| Url::parse(&f.uri).ok())
            .map(String::from)
            .collect();

        check_references(&root, top_level, &root_uri, &base, &registered)?;
        for fragment in &self.fragments {
            check_references(&fragment.schema, &fragment.name, &fragment.uri, &base, &registered)?;
        }

        // Relative references in the top-level schema resolve against the
        // registry's base, as they do inside the fragments.
        let mut compiled_root = root.clone();
        if let Value::Object(map) = &mut compiled_root {
            map.entry("$id")
                .or_insert_with(|| Value::String(root_uri.clone()));
        }

        let retriever = LocalSchemaRetriever {
            schemas_by_uri: self
                .fragments
                .iter()
                .map(|f| (f.uri.clone(), f.schema.clone()))
                .collect(),
        };

        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft7);
        opts.with_retriever(retriever);
        let validator = opts
            .build(&compiled_root)
            .map_err(|e| SchemaError::ValidatorBuild {
                schema_name: top_level.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            top_level,
            fragments = self.fragments.len(),
            "compiled schema set"
        );

        Ok(SchemaSet {
            base_uri: self.base_uri,
            fragments: self.fragments,
            top_level: top_level.to_string(),
            root,
            validator,
        })
    }
}

/// A fully registered, compiled schema set. Immutable.
pub struct SchemaSet {
    base_uri: String,
    fragments: Vec<Fragment>,
    top_level: String,
    root: Value,
    validator: Validator,
}

impl fmt::Debug for SchemaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSet")
            .field("base_uri", &self.base_uri)
            .field("fragments", &self.fragment_uris())
            .field("top_level", &self.top_level)
            .finish_non_exhaustive()
    }
}

impl SchemaSet {
    /// Register the configured fragments and build the configured
    /// top-level schema. `root` anchors a relative schema directory.
    pub fn from_config(root: &Path, config: &SchemaConfig) -> Result<Self, SchemaError> {
        let mut builder = SchemaSetBuilder::from_config(root, config);
        builder.register_all(&config.fragments)?;
        builder.build(&config.top_level)
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Name of the schema instances are checked against.
    pub fn top_level_name(&self) -> &str {
        &self.top_level
    }

    /// The top-level schema as loaded.
    pub fn root_schema(&self) -> &Value {
        &self.root
    }

    /// Registration URIs, in registration order.
    pub fn fragment_uris(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.uri.as_str()).collect()
    }

    /// Look up a registered fragment by name.
    pub fn fragment(&self, name: &str) -> Option<&Value> {
        self.fragments
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.schema)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Whether `instance` conforms to the top-level schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate `instance`, collecting every violation.
    ///
    /// # Errors
    ///
    /// `SchemaError::ValidationFailed` with the structured violations.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaError> {
        let errors: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed {
                schema_name: self.top_level.clone(),
                violations: ValidationViolations::new(errors),
            })
        }
    }

    /// Load a JSON document and validate it.
    pub fn validate_file(&self, path: &Path) -> Result<(), SchemaError> {
        let instance = crate::validate::load_instance(path)?;
        self.validate(&instance).map_err(|e| match e {
            SchemaError::ValidationFailed { violations, .. } => SchemaError::ValidationFailed {
                schema_name: format!("{} ({})", self.top_level, path.display()),
                violations,
            },
            other => other,
        })
    }
}

fn read_schema(schema_dir: &Path, name: &str) -> Result<Value, SchemaError> {
    let path = schema_dir.join(format!("{name}{SCHEMA_FILE_SUFFIX}"));
    let content = std::fs::read_to_string(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SchemaError::SchemaNotFound {
                name: name.to_string(),
                path: path.clone(),
            }
        } else {
            SchemaError::SchemaRead {
                name: name.to_string(),
                path: path.clone(),
                source,
            }
        }
    })?;
    serde_json::from_str(&content).map_err(|e| SchemaError::SchemaParse {
        name: name.to_string(),
        path,
        reason: e.to_string(),
    })
}

/// Verify that every external `$ref` in `schema` names a registered document.
fn check_references(
    schema: &Value,
    name: &str,
    uri: &str,
    base: &Url,
    registered: &BTreeSet<String>,
) -> Result<(), SchemaError> {
    let doc_base = schema
        .get("$id")
        .and_then(Value::as_str)
        .and_then(|id| base.join(id).ok())
        .or_else(|| Url::parse(uri).ok())
        .unwrap_or_else(|| base.clone());

    let mut refs = Vec::new();
    collect_refs(schema, &mut refs);

    for reference in refs {
        if reference.starts_with('#') {
            continue;
        }
        let unresolved = || SchemaError::UnresolvedReference {
            reference: reference.to_string(),
            referrer: name.to_string(),
        };
        let mut target = doc_base.join(reference).map_err(|_| unresolved())?;
        target.set_fragment(None);

        let is_meta = target
            .host_str()
            .is_some_and(|h| META_SCHEMA_HOSTS.contains(&h));
        let is_self = target == doc_base || target.as_str() == uri;
        if !(is_meta || is_self || registered.contains(target.as_str())) {
            return Err(unresolved());
        }
    }
    Ok(())
}

/// Collect `$ref` strings. Keywords holding instance data are skipped.
///
/// `value` is in schema position: its keys are keywords. The children of
/// `properties`, `patternProperties`, `definitions` and `dependencies` are
/// maps from user-chosen names to schemas, so their keys are never
/// treated as keywords.
fn collect_refs<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match key.as_str() {
                    "$ref" => {
                        if let Some(r) = child.as_str() {
                            out.push(r);
                        }
                    }
                    "enum" | "const" | "default" | "examples" => {}
                    "properties" | "patternProperties" | "definitions" | "$defs"
                    | "dependencies" => {
                        if let Value::Object(named) = child {
                            named.values().for_each(|schema| collect_refs(schema, out));
                        }
                    }
                    _ => collect_refs(child, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "file://batmo/schemas/";

    fn write_schema(dir: &Path, name: &str, schema: &Value) {
        std::fs::write(
            dir.join(format!("{name}{SCHEMA_FILE_SUFFIX}")),
            serde_json::to_string_pretty(schema).unwrap(),
        )
        .unwrap();
    }

    fn electrode_and_battery(dir: &Path) {
        write_schema(
            dir,
            "electrode",
            &json!({
                "type": "object",
                "properties": { "thickness": { "type": "number", "exclusiveMinimum": 0 } },
                "required": ["thickness"]
            }),
        );
        write_schema(
            dir,
            "battery",
            &json!({
                "type": "object",
                "properties": {
                    "NegativeElectrode": { "$ref": "file://batmo/schemas/electrode" },
                    "PositiveElectrode": { "$ref": "electrode" }
                },
                "required": ["NegativeElectrode", "PositiveElectrode"]
            }),
        );
    }

    fn built(dir: &Path) -> SchemaSet {
        let mut builder = SchemaSetBuilder::new(dir, BASE);
        builder.register_all(["electrode", "battery"]).unwrap();
        builder.build("battery").unwrap()
    }

    #[test]
    fn registers_under_synthetic_uris() {
        let dir = tempfile::tempdir().unwrap();
        electrode_and_battery(dir.path());
        let set = built(dir.path());
        assert_eq!(
            set.fragment_uris(),
            vec!["file://batmo/schemas/electrode", "file://batmo/schemas/battery"]
        );
        assert_eq!(set.top_level_name(), "battery");
        assert!(set.fragment("electrode").is_some());
        assert!(set.fragment("separator").is_none());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn follows_refs_when_validating() {
        let dir = tempfile::tempdir().unwrap();
        electrode_and_battery(dir.path());
        let set = built(dir.path());

        let good = json!({
            "NegativeElectrode": { "thickness": 6.4e-5 },
            "PositiveElectrode": { "thickness": 5.7e-5 }
        });
        assert!(set.is_valid(&good));
        set.validate(&good).unwrap();

        // Violation inside a referenced fragment.
        let bad = json!({
            "NegativeElectrode": { "thickness": -1 },
            "PositiveElectrode": {}
        });
        assert!(!set.is_valid(&bad));
        let err = set.validate(&bad).unwrap_err();
        let SchemaError::ValidationFailed { violations, .. } = err else {
            panic!("expected ValidationFailed");
        };
        let paths: Vec<&str> = violations
            .violations()
            .iter()
            .map(|v| v.instance_path.as_str())
            .collect();
        assert!(paths.contains(&"/NegativeElectrode/thickness"), "{paths:?}");
        assert!(paths.contains(&"/PositiveElectrode"), "{paths:?}");
    }

    #[test]
    fn missing_required_top_level_field_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        electrode_and_battery(dir.path());
        let set = built(dir.path());
        let doc = json!({ "NegativeElectrode": { "thickness": 1.0 } });
        assert!(!set.is_valid(&doc));
        let err = set.validate(&doc).unwrap_err();
        assert!(err.to_string().contains("PositiveElectrode"), "{err}");
    }

    #[test]
    fn unregistered_reference_is_a_resolution_fault() {
        let dir = tempfile::tempdir().unwrap();
        electrode_and_battery(dir.path());
        let mut builder = SchemaSetBuilder::new(dir.path(), BASE);
        builder.register("battery").unwrap();
        let err = builder.build("battery").unwrap_err();
        match err {
            SchemaError::UnresolvedReference { reference, referrer } => {
                assert_eq!(reference, "file://batmo/schemas/electrode");
                assert_eq!(referrer, "battery");
            }
            other => panic!("expected UnresolvedReference, got {other}"),
        }
    }

    #[test]
    fn unresolved_reference_inside_fragment_names_the_fragment() {
        let dir = tempfile::tempdir().unwrap();
        electrode_and_battery(dir.path());
        let mut builder = SchemaSetBuilder::new(dir.path(), BASE);
        builder
            .register_all(["electrode", "battery"])
            .unwrap()
            .register_value("separator", json!({ "$ref": "file://batmo/schemas/porosity" }))
            .unwrap();
        let err = builder.build("battery").unwrap_err();
        assert!(
            matches!(err, SchemaError::UnresolvedReference { ref referrer, .. } if referrer == "separator"),
            "got {err}"
        );
    }

    #[test]
    fn internal_refs_need_no_registration() {
        let dir = tempfile::tempdir().unwrap();
        let root = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": { "positive": { "type": "number", "exclusiveMinimum": 0 } },
            "properties": { "T": { "$ref": "#/definitions/positive" } }
        });
        let set = SchemaSetBuilder::new(dir.path(), BASE)
            .build_with_root("thermalmodel", root)
            .unwrap();
        assert!(set.is_valid(&json!({ "T": 298.15 })));
        assert!(!set.is_valid(&json!({ "T": -4 })));
    }

    #[test]
    fn meta_schema_and_self_refs_pass_the_check() {
        let base = Url::parse(BASE).unwrap();
        let schema = json!({
            "properties": {
                "meta": { "$ref": "http://json-schema.org/draft-07/schema#" },
                "again": { "$ref": "file://batmo/schemas/battery#/definitions/x" },
                "sibling": { "$ref": "electrode#/properties/thickness" }
            }
        });
        let registered = BTreeSet::from(["file://batmo/schemas/electrode".to_string()]);
        check_references(&schema, "battery", "file://batmo/schemas/battery", &base, &registered)
            .unwrap();
    }

    #[test]
    fn enum_values_are_not_scanned_for_refs() {
        let doc = json!({
            "enum": [{ "$ref": "not-a-ref" }],
            "items": [{ "$ref": "a" }, { "allOf": [{ "$ref": "b" }] }]
        });
        let mut refs = Vec::new();
        collect_refs(&doc, &mut refs);
        refs.sort_unstable();
        assert_eq!(refs, vec!["a", "b"]);
    }

    #[test]
    fn properties_named_like_keywords_are_scanned_for_refs() {
        let doc = json!({
            "properties": {
                "default": { "$ref": "d" },
                "$ref": { "$ref": "r" },
                "enum": { "items": { "$ref": "e" } }
            },
            "definitions": { "const": { "$ref": "c" } },
            "patternProperties": { "^examples$": { "$ref": "x" } }
        });
        let mut refs = Vec::new();
        collect_refs(&doc, &mut refs);
        refs.sort_unstable();
        assert_eq!(refs, vec!["c", "d", "e", "r", "x"]);
    }

    #[test]
    fn unregistered_reference_under_default_property_is_a_resolution_fault() {
        let dir = tempfile::tempdir().unwrap();
        let root = json!({
            "type": "object",
            "properties": { "default": { "$ref": "file://batmo/schemas/porosity" } }
        });
        let err = SchemaSetBuilder::new(dir.path(), BASE)
            .build_with_root("separator", root)
            .unwrap_err();
        match err {
            SchemaError::UnresolvedReference { reference, referrer } => {
                assert_eq!(reference, "file://batmo/schemas/porosity");
                assert_eq!(referrer, "separator");
            }
            other => panic!("expected UnresolvedReference, got {other}"),
        }
    }

    #[test]
    fn missing_schema_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = SchemaSetBuilder::new(dir.path(), BASE);
        let err = builder.register("activematerial").unwrap_err();
        match err {
            SchemaError::SchemaNotFound { name, path } => {
                assert_eq!(name, "activematerial");
                assert!(path.ends_with("activematerial.schema.json"));
            }
            other => panic!("expected SchemaNotFound, got {other}"),
        }
    }

    #[test]
    fn malformed_schema_is_parse_fault() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("electrolyte.schema.json"), "{ \"type\": ").unwrap();
        let mut builder = SchemaSetBuilder::new(dir.path(), BASE);
        let err = builder.register("electrolyte").unwrap_err();
        assert!(matches!(err, SchemaError::SchemaParse { .. }), "got {err}");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut builder = SchemaSetBuilder::new("unused", BASE);
        builder.register_value("battery", json!({})).unwrap();
        let err = builder.register_value("battery", json!({})).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateFragment { .. }));
    }

    #[test]
    fn invalid_base_uri_is_rejected_at_build() {
        let err = SchemaSetBuilder::new("unused", "batmo/schemas/")
            .build_with_root("battery", json!({}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidBaseUri { .. }));
    }

    #[test]
    fn schema_set_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaSet>();
    }
}
