use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::event::EventType;

/// Ids of the questions the core reads directly
pub mod question_ids {
    pub const EVENT_TYPE: &str = "eventType";
    pub const WHO_WAS_DRIVING: &str = "whoWasDriving";
    pub const WERE_INJURIES: &str = "wereInjuries";
}

/// How a question's answer is rendered and typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    Select,
    Radio,
    Input,
    #[serde(alias = "phone-input")]
    InputPhone,
    YesOrNo,
    YesOrNoOrUnknown,
    Numeric,
    Checkbox,
    Infobox,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Select => "select",
            ElementType::Radio => "radio",
            ElementType::Input => "input",
            ElementType::InputPhone => "input-phone",
            ElementType::YesOrNo => "yes-or-no",
            ElementType::YesOrNoOrUnknown => "yes-or-no-or-unknown",
            ElementType::Numeric => "numeric",
            ElementType::Checkbox => "checkbox",
            ElementType::Infobox => "infobox",
        }
    }
}

/// One admissible option of an enumerated question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lov {
    pub value: String,
    pub label: String,
    pub description: Option<String>,
}

impl Lov {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Declarative input format hint for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub pattern: String,
    pub message: String,
}

impl Validation {
    pub fn phone() -> Self {
        Self {
            pattern: r"^\d{3}-\d{3}-\d{4}$".to_string(),
            message: "Phone format should be xxx-xxx-xxxx".to_string(),
        }
    }
}

/// When a question becomes relevant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyCondition {
    None,
    EventTypeIn(BTreeSet<EventType>),
    EventTypeAndDriving(EventType, String),
    EventTypeAndInjuries(EventType, bool),
}

impl DependencyCondition {
    pub fn event_type_in(event_types: impl IntoIterator<Item = EventType>) -> Self {
        DependencyCondition::EventTypeIn(event_types.into_iter().collect())
    }

    /// Id of the answered question this condition reads, if any
    pub fn referenced_question(&self) -> Option<&'static str> {
        match self {
            DependencyCondition::EventTypeAndDriving(..) => Some(question_ids::WHO_WAS_DRIVING),
            DependencyCondition::EventTypeAndInjuries(..) => Some(question_ids::WERE_INJURIES),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub label: String,
    pub description: Option<String>,
    pub optional: bool,
    #[serde(rename = "validate", skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    pub lovs: Option<Vec<Lov>>,
    #[serde(skip)]
    pub condition: DependencyCondition,
}

impl Question {
    pub fn new(id: impl Into<String>, element_type: ElementType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type,
            label: label.into(),
            description: None,
            optional: false,
            validation: None,
            lovs: None,
            condition: DependencyCondition::None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn lovs(mut self, lovs: Vec<Lov>) -> Self {
        self.lovs = Some(lovs);
        self
    }

    pub fn when(mut self, condition: DependencyCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Values the answer may take, as offered to the inference service
    pub fn possible_values(&self) -> Vec<String> {
        match &self.lovs {
            Some(lovs) => lovs.iter().map(|lov| lov.value.clone()).collect(),
            None => match self.element_type {
                ElementType::YesOrNo => vec!["true".into(), "false".into()],
                ElementType::YesOrNoOrUnknown => {
                    vec!["true".into(), "false".into(), "unknown".into()]
                }
                _ => Vec::new(),
            },
        }
    }
}
