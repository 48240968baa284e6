use super::merge::{self, Layer, MergeSources, MergedMap, MERGE_KEY};
use super::scalar;
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of a CircleCI configuration document.
///
/// See <https://circleci.com/docs/configuration-reference/> for the upstream
/// schema. Only the parts needed to document a pipeline are modelled; every
/// other key is ignored while decoding.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Schema version, used upstream to warn about deprecations.
    #[serde(deserialize_with = "scalar::string")]
    pub version: String,
    /// Pipeline parameters declared for use in the configuration.
    #[serde(deserialize_with = "scalar::keyed")]
    pub parameters: IndexMap<String, Parameter>,
    /// Jobs keyed by their name.
    #[serde(deserialize_with = "scalar::keyed")]
    pub jobs: IndexMap<String, Job>,
    /// Orchestration of the jobs above.
    pub workflows: Workflows,
}

/// A parameter declared at pipeline level or on a job.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(from = "ParameterLayer")]
pub struct Parameter {
    /// Filled from the enclosing map key.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form type tag such as `string`, `boolean` or `enum`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Absent when the parameter has no default, which upstream reads as "required".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_yaml::Value>,
}

impl Parameter {
    /// Whether callers must supply a value. This is a naming convention only.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A job declared in the `jobs` map.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(from = "JobLayer")]
pub struct Job {
    pub name: String,
    pub environment: IndexMap<String, String>,
    /// Number of parallel instances; 0 when unset.
    pub parallelism: i64,
    pub parameters: IndexMap<String, Parameter>,
}

/// The `workflows` block: a version plus workflows inlined by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workflows {
    pub version: String,
    #[serde(flatten)]
    pub workflows: IndexMap<String, Workflow>,
}

/// A named, ordered list of job invocations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(from = "WorkflowLayer")]
pub struct Workflow {
    pub name: String,
    pub jobs: Vec<WorkflowJob>,
}

/// A job invocation inside a workflow. Decoding lives in `workflow_job`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowJob {
    pub name: String,
    /// Jobs that must succeed before this one starts, in declaration order.
    pub requires: Vec<String>,
}

// Raw mappings as written, before merge keys are applied. A raw `name` key
// is not read; names come from map keys during normalization.

#[derive(Default, Deserialize)]
#[serde(default)]
struct ParameterLayer {
    #[serde(deserialize_with = "scalar::optional_string")]
    description: Option<String>,
    #[serde(rename = "type", deserialize_with = "scalar::optional_string")]
    kind: Option<String>,
    default: Option<serde_yaml::Value>,
    #[serde(rename = "<<")]
    sources: Option<MergeSources<ParameterLayer>>,
}

impl Layer for ParameterLayer {
    fn take_sources(&mut self) -> Vec<Self> {
        self.sources.take().map(|MergeSources(found)| found).unwrap_or_default()
    }

    fn inherit(self, base: Self) -> Self {
        ParameterLayer {
            description: self.description.or(base.description),
            kind: self.kind.or(base.kind),
            default: self.default.or(base.default),
            sources: None,
        }
    }
}

impl From<ParameterLayer> for Parameter {
    fn from(layer: ParameterLayer) -> Self {
        let layer = layer.flatten();
        Parameter {
            name: String::new(),
            description: layer.description,
            kind: layer.kind.unwrap_or_default(),
            default: layer.default,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct JobLayer {
    environment: Option<MergedMap<Option<String>>>,
    parallelism: Option<i64>,
    parameters: Option<MergedMap<Option<Parameter>>>,
    #[serde(rename = "<<")]
    sources: Option<MergeSources<JobLayer>>,
}

impl Layer for JobLayer {
    fn take_sources(&mut self) -> Vec<Self> {
        self.sources.take().map(|MergeSources(found)| found).unwrap_or_default()
    }

    fn inherit(self, base: Self) -> Self {
        JobLayer {
            environment: self.environment.or(base.environment),
            parallelism: self.parallelism.or(base.parallelism),
            parameters: self.parameters.or(base.parameters),
            sources: None,
        }
    }
}

impl From<JobLayer> for Job {
    fn from(layer: JobLayer) -> Self {
        let layer = layer.flatten();
        Job {
            name: String::new(),
            environment: merge::filled(layer.environment),
            parallelism: layer.parallelism.unwrap_or_default(),
            parameters: merge::filled(layer.parameters),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct WorkflowLayer {
    jobs: Option<Vec<WorkflowJob>>,
    #[serde(rename = "<<")]
    sources: Option<MergeSources<WorkflowLayer>>,
}

impl Layer for WorkflowLayer {
    fn take_sources(&mut self) -> Vec<Self> {
        self.sources.take().map(|MergeSources(found)| found).unwrap_or_default()
    }

    fn inherit(self, base: Self) -> Self {
        WorkflowLayer {
            jobs: self.jobs.or(base.jobs),
            sources: None,
        }
    }
}

impl From<WorkflowLayer> for Workflow {
    fn from(layer: WorkflowLayer) -> Self {
        Workflow {
            name: String::new(),
            jobs: layer.flatten().jobs.unwrap_or_default(),
        }
    }
}

impl<'de> Deserialize<'de> for Workflows {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(WorkflowsVisitor)
    }
}

struct WorkflowsVisitor;

impl<'de> Visitor<'de> for WorkflowsVisitor {
    type Value = Workflows;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a mapping of workflow names with an optional version")
    }

    fn visit_none<E: de::Error>(self) -> Result<Workflows, E> {
        Ok(Workflows::default())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Workflows, E> {
        Ok(Workflows::default())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Workflows, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Workflows, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut version: Option<String> = None;
        let mut workflows = IndexMap::new();
        let mut sources = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "version" if version.is_some() => return Err(merge::duplicate_key(&key)),
                "version" => {
                    version = Some(map.next_value::<Option<String>>()?.unwrap_or_default());
                }
                MERGE_KEY => {
                    let MergeSources(found) = map.next_value::<MergeSources<Workflows>>()?;
                    sources.extend(found);
                }
                _ if workflows.contains_key(&key) => return Err(merge::duplicate_key(&key)),
                _ => {
                    let workflow = map.next_value::<Option<Workflow>>()?.unwrap_or_default();
                    workflows.insert(key, workflow);
                }
            }
        }
        for base in sources {
            if version.is_none() && !base.version.is_empty() {
                version = Some(base.version);
            }
            for (key, workflow) in base.workflows {
                workflows.entry(key).or_insert(workflow);
            }
        }
        Ok(Workflows {
            version: version.unwrap_or_default(),
            workflows,
        })
    }
}

/// Map entries that take their name from the key they are stored under.
trait Keyed {
    fn named(self, name: String) -> Self;
}

impl Keyed for Parameter {
    fn named(self, name: String) -> Self {
        Parameter { name, ..self }
    }
}

impl Keyed for Job {
    fn named(self, name: String) -> Self {
        Job {
            name,
            parameters: name_entries(self.parameters),
            ..self
        }
    }
}

impl Keyed for Workflow {
    fn named(self, name: String) -> Self {
        Workflow { name, ..self }
    }
}

fn name_entries<T: Keyed>(entries: IndexMap<String, T>) -> IndexMap<String, T> {
    entries
        .into_iter()
        .map(|(key, value)| {
            let value = value.named(key.clone());
            (key, value)
        })
        .collect()
}

impl Config {
    /// Rebuild every keyed collection so each entry carries its key as `name`.
    ///
    /// Covers top-level parameters, jobs, the parameters of every job and the
    /// workflows. Names already present on entries are replaced.
    pub fn normalized(self) -> Self {
        Config {
            version: self.version,
            parameters: name_entries(self.parameters),
            jobs: name_entries(self.jobs),
            workflows: Workflows {
                version: self.workflows.version,
                workflows: name_entries(self.workflows.workflows),
            },
        }
    }

    /// Short description used in log events.
    pub fn summary(&self) -> String {
        format!(
            "version {}: {} parameters, {} jobs, {} workflows",
            self.version,
            self.parameters.len(),
            self.jobs.len(),
            self.workflows.workflows.len()
        )
    }
}
