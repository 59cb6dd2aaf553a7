//! Selection tree handed over by the execution engine.
//!
//! Only what cost estimation needs: fields, arguments, fragments. The engine
//! may build it directly or send it as JSON.

use serde::{Deserialize, Serialize};
use shared_types::OperationKind;
use std::collections::{BTreeMap, HashMap};

/// One operation plus the fragments it may spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    pub operation: OperationDefinition,
    #[serde(default)]
    pub fragments: HashMap<String, FragmentDefinition>,
}

impl QueryDocument {
    pub fn new(operation: OperationDefinition) -> Self {
        Self {
            operation,
            fragments: HashMap::new(),
        }
    }

    /// Shorthand for an anonymous query.
    pub fn query(selection_set: Vec<Selection>) -> Self {
        Self::new(OperationDefinition {
            operation_type: OperationType::Query,
            name: None,
            selection_set,
        })
    }

    pub fn with_fragment(mut self, fragment: FragmentDefinition) -> Self {
        self.fragments.insert(fragment.name.clone(), fragment);
        self
    }

    pub fn parse_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    /// Read/write classification used for admission.
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationType::Mutation => OperationKind::Write,
            OperationType::Query | OperationType::Subscription => OperationKind::Read,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDefinition {
    #[serde(default)]
    pub operation_type: OperationType,
    #[serde(default)]
    pub name: Option<String>,
    pub selection_set: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentDefinition {
    pub name: String,
    pub type_condition: String,
    pub selection_set: Vec<Selection>,
}

impl FragmentDefinition {
    pub fn new(
        name: impl Into<String>,
        type_condition: impl Into<String>,
        selection_set: Vec<Selection>,
    ) -> Self {
        Self {
            name: name.into(),
            type_condition: type_condition.into(),
            selection_set,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Field(Field),
    FragmentSpread {
        name: String,
    },
    InlineFragment {
        #[serde(default)]
        type_condition: Option<String>,
        selection_set: Vec<Selection>,
    },
}

impl Selection {
    pub fn field(name: impl Into<String>) -> Self {
        Selection::Field(Field::new(name))
    }

    pub fn spread(name: impl Into<String>) -> Self {
        Selection::FragmentSpread { name: name.into() }
    }

    pub fn inline(type_condition: Option<&str>, selection_set: Vec<Selection>) -> Self {
        Selection::InlineFragment {
            type_condition: type_condition.map(str::to_string),
            selection_set,
        }
    }
}

impl From<Field> for Selection {
    fn from(field: Field) -> Self {
        Selection::Field(field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub arguments: BTreeMap<String, ArgValue>,
    #[serde(default)]
    pub selection_set: Vec<Selection>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: BTreeMap::new(),
            selection_set: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn select(mut self, selection_set: Vec<Selection>) -> Self {
        self.selection_set = selection_set;
        self
    }

    /// Name the result appears under.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Introspection fields (`__typename`, `__schema`, ...).
    pub fn is_meta(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// An argument value, literal or variable reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    List(Vec<ArgValue>),
    Object(BTreeMap<String, ArgValue>),
    Variable(String),
}
